//! Revocation store over the key-value cache

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::domain::cache::Cache;
use crate::domain::revocation::{RevocationEntry, RevocationStore};

const KEY_PREFIX: &str = "blacklist:jti:";
const REVOKED_MARKER: &str = "revoked";

/// Revoked token identifiers stored as `blacklist:jti:<jti>`
///
/// Each entry expires when the token itself would have, so the store only
/// ever holds revocations that still matter. Store errors are logged and
/// swallowed.
#[derive(Debug, Clone)]
pub struct CacheRevocationStore {
    cache: Arc<dyn Cache>,
}

impl CacheRevocationStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    fn store_key(jti: &str) -> String {
        format!("{}{}", KEY_PREFIX, jti)
    }
}

#[async_trait]
impl RevocationStore for CacheRevocationStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) {
        if jti.trim().is_empty() {
            warn!("Attempted to revoke a token without a JTI");
            return;
        }

        let entry = RevocationEntry::new(jti, expires_at);
        let Some(ttl) = entry.ttl_at(Utc::now()) else {
            debug!(jti = %jti, expires_at = %expires_at, "Token already expired, skipping revocation");
            return;
        };

        match self
            .cache
            .set_raw(&Self::store_key(jti), REVOKED_MARKER, ttl)
            .await
        {
            Ok(()) => debug!(jti = %jti, ttl_ms = ttl.as_millis() as u64, "Token revoked"),
            Err(e) => error!(jti = %jti, error = %e, "Failed to revoke token"),
        }
    }

    async fn is_revoked(&self, jti: &str) -> bool {
        if jti.trim().is_empty() {
            return false;
        }

        match self.cache.exists(&Self::store_key(jti)).await {
            Ok(revoked) => revoked,
            Err(e) => {
                error!(jti = %jti, error = %e, "Revocation check failed, treating token as not revoked");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use std::time::Duration;

    fn store(cache: &Arc<MockCache>) -> CacheRevocationStore {
        CacheRevocationStore::new(cache.clone())
    }

    #[tokio::test]
    async fn test_revoked_token_is_reported() {
        let cache = Arc::new(MockCache::new());
        let revocations = store(&cache);

        revocations
            .revoke("jti-1", Utc::now() + chrono::Duration::hours(1))
            .await;

        assert!(revocations.is_revoked("jti-1").await);
        assert!(!revocations.is_revoked("jti-2").await);
        assert_eq!(
            cache.get_raw("blacklist:jti:jti-1").await.unwrap().as_deref(),
            Some("revoked")
        );
    }

    #[tokio::test]
    async fn test_revocation_lapses_with_token_expiry() {
        let cache = Arc::new(MockCache::new());
        let revocations = store(&cache);

        revocations
            .revoke("jti-1", Utc::now() + chrono::Duration::hours(1))
            .await;

        cache.advance(Duration::from_secs(59 * 60));
        assert!(revocations.is_revoked("jti-1").await);

        cache.advance(Duration::from_secs(60));
        assert!(!revocations.is_revoked("jti-1").await);
    }

    #[tokio::test]
    async fn test_ttl_never_exceeds_token_lifetime() {
        let cache = Arc::new(MockCache::new());
        let revocations = store(&cache);

        revocations
            .revoke("jti-1", Utc::now() + chrono::Duration::milliseconds(1500))
            .await;

        let ttl = cache.ttl("blacklist:jti:jti-1").await.unwrap().unwrap();
        assert!(ttl <= Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_expired_token_is_not_written() {
        let cache = Arc::new(MockCache::new());
        let revocations = store(&cache);

        revocations
            .revoke("jti-1", Utc::now() - chrono::Duration::seconds(5))
            .await;

        assert_eq!(cache.calls(), 0);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_empty_jti_is_ignored() {
        let cache = Arc::new(MockCache::new());
        let revocations = store(&cache);

        revocations
            .revoke("  ", Utc::now() + chrono::Duration::hours(1))
            .await;

        assert!(!revocations.is_revoked("").await);
        assert_eq!(cache.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_open() {
        let cache = Arc::new(MockCache::new());
        let revocations = store(&cache);
        revocations
            .revoke("jti-1", Utc::now() + chrono::Duration::hours(1))
            .await;

        cache.set_unavailable(true);

        assert!(!revocations.is_revoked("jti-1").await);
    }

    #[tokio::test]
    async fn test_revoke_swallows_store_errors() {
        let cache = Arc::new(MockCache::unavailable());
        let revocations = store(&cache);

        revocations
            .revoke("jti-1", Utc::now() + chrono::Duration::hours(1))
            .await;

        cache.set_unavailable(false);
        assert!(!revocations.is_revoked("jti-1").await);
    }
}
