//! Revocation entry

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A revoked token, alive in the store until the token would have expired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

impl RevocationEntry {
    pub fn new(jti: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            jti: jti.into(),
            expires_at,
        }
    }

    /// Store TTL for an entry written at `now`.
    ///
    /// Never exceeds `expires_at - now`; `None` when the token has already
    /// expired and there is nothing left to revoke.
    pub fn ttl_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.expires_at.signed_duration_since(now);

        if remaining <= chrono::Duration::zero() {
            return None;
        }

        remaining.to_std().ok().filter(|ttl| !ttl.is_zero())
    }
}
