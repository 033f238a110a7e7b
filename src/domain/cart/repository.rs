//! Cart store trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::Cart;
use crate::domain::DomainError;

/// Storage for serialized cart documents keyed by resolved cart key
///
/// Concurrent writers to the same key are not coordinated: the last `put`
/// wins and documents carry no version.
#[async_trait]
pub trait CartRepository: Send + Sync + Debug {
    /// Get a cart. An empty key is `None` without a store round trip.
    async fn get(&self, key: &str) -> Result<Option<Cart>, DomainError>;

    /// Write a cart, resetting its expiry to the full window
    async fn put(&self, key: &str, cart: &Cart) -> Result<(), DomainError>;

    /// Delete a cart, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Atomically move a cart to a new key; `false` if `from` does not exist
    async fn rename(&self, from: &str, to: &str) -> Result<bool, DomainError>;
}
