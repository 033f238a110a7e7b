//! Key-value store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Key-value store with per-entry expiry
///
/// Values are JSON strings so the trait stays dyn-compatible; use
/// [`CacheExt`] for typed access. Every method is a remote round trip for
/// networked backends and reports transport failures as
/// [`DomainError::StoreUnavailable`].
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw value
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value, replacing any existing value and expiry
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Atomically renames `from` to `to`, overwriting `to`.
    ///
    /// Returns `false` without touching `to` when `from` does not exist.
    async fn rename(&self, from: &str, to: &str) -> Result<bool, DomainError>;

    /// Checks if a key exists
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Gets the remaining TTL for a key
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Round trip used by readiness probes
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Extension trait providing typed get/set operations
pub trait CacheExt: Cache {
    /// Gets a typed value from the cache
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::serialization(format!(
                            "Failed to deserialize value at '{}': {}",
                            key, e
                        ))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value in the cache with a TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::serialization(format!("Failed to serialize value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct MockEntry {
        value: String,
        /// Deadline on the mock clock
        expires_at: Duration,
    }

    /// Mock key-value store for testing
    ///
    /// Expiry runs on a simulated clock moved forward with [`MockCache::advance`],
    /// and [`MockCache::set_unavailable`] makes every call fail like an
    /// unreachable store.
    #[derive(Debug, Default)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, MockEntry>>,
        clock: Mutex<Duration>,
        unavailable: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry<V: Serialize>(self, key: &str, value: &V, ttl: Duration) -> Self {
            let json = serde_json::to_string(value).unwrap();
            let now = *self.clock.lock().unwrap();
            self.entries.lock().unwrap().insert(
                key.to_string(),
                MockEntry {
                    value: json,
                    expires_at: now + ttl,
                },
            );
            self
        }

        pub fn unavailable() -> Self {
            let cache = Self::new();
            cache.set_unavailable(true);
            cache
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Moves the simulated clock forward, dropping entries that expired
        pub fn advance(&self, by: Duration) {
            let mut clock = self.clock.lock().unwrap();
            *clock += by;
            let now = *clock;
            self.entries
                .lock()
                .unwrap()
                .retain(|_, entry| entry.expires_at > now);
        }

        /// Number of calls that reached the store
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Direct inspection bypassing the call counter and failure injection
        pub fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        fn enter(&self) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(DomainError::store_unavailable("Mock store is unreachable"));
            }
            Ok(())
        }

        fn now(&self) -> Duration {
            *self.clock.lock().unwrap()
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.enter()?;
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).map(|entry| entry.value.clone()))
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.enter()?;
            let expires_at = self.now() + ttl;
            self.entries.lock().unwrap().insert(
                key.to_string(),
                MockEntry {
                    value: value.to_string(),
                    expires_at,
                },
            );
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.enter()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn rename(&self, from: &str, to: &str) -> Result<bool, DomainError> {
            self.enter()?;
            let mut entries = self.entries.lock().unwrap();

            match entries.remove(from) {
                Some(entry) => {
                    entries.insert(to.to_string(), entry);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn exists(&self, key: &str) -> Result<bool, DomainError> {
            self.enter()?;
            Ok(self.entries.lock().unwrap().contains_key(key))
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
            self.enter()?;
            let now = self.now();
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).map(|entry| entry.expires_at - now))
        }

        async fn ping(&self) -> Result<(), DomainError> {
            self.enter()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockCache::new();
            cache
                .set("key1", &"value1", Duration::from_secs(60))
                .await
                .unwrap();

            let result: Option<String> = cache.get("key1").await.unwrap();
            assert_eq!(result, Some("value1".to_string()));
        }

        #[tokio::test]
        async fn test_mock_cache_expiry_on_advance() {
            let cache = MockCache::new();
            cache
                .set("key1", &"value1", Duration::from_secs(60))
                .await
                .unwrap();

            cache.advance(Duration::from_secs(59));
            assert!(cache.exists("key1").await.unwrap());

            cache.advance(Duration::from_secs(1));
            assert!(!cache.exists("key1").await.unwrap());
        }

        #[tokio::test]
        async fn test_mock_cache_rename() {
            let cache = MockCache::new().with_entry("a", &1, Duration::from_secs(60));

            assert!(cache.rename("a", "b").await.unwrap());
            assert!(!cache.contains("a"));
            assert!(cache.contains("b"));

            assert!(!cache.rename("missing", "c").await.unwrap());
            assert!(!cache.contains("c"));
        }

        #[tokio::test]
        async fn test_mock_cache_unavailable() {
            let cache = MockCache::unavailable();

            let result: Result<Option<String>, _> = cache.get("key").await;
            assert!(matches!(
                result,
                Err(DomainError::StoreUnavailable { .. })
            ));
        }
    }
}
