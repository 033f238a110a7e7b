//! Token revocation domain

mod entry;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use entry::RevocationEntry;

/// Tracks revoked token identifiers until the tokens expire naturally
///
/// Both operations are infallible by contract: the store fails open. When the
/// backing store is degraded a revocation is dropped and every token reads as
/// not revoked.
#[async_trait]
pub trait RevocationStore: Send + Sync + Debug {
    /// Revoke a token until `expires_at`. Already expired tokens are skipped.
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>);

    /// Whether a token identifier has been revoked
    async fn is_revoked(&self, jti: &str) -> bool;
}
