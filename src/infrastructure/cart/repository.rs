//! Cart store over the key-value cache

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::cache::{Cache, CacheExt};
use crate::domain::cart::{Cart, CartRepository};
use crate::domain::DomainError;

const KEY_PREFIX: &str = "cart:";

/// Default sliding expiry of a cart
pub const DEFAULT_CART_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Cart documents stored as JSON under `cart:<key>`
///
/// Every write resets the expiry to the full window. There is no local copy;
/// each call is a store round trip.
#[derive(Debug, Clone)]
pub struct CacheCartRepository {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CacheCartRepository {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            ttl: DEFAULT_CART_TTL,
        }
    }

    /// Sets the expiry window
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn store_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

#[async_trait]
impl CartRepository for CacheCartRepository {
    async fn get(&self, key: &str) -> Result<Option<Cart>, DomainError> {
        if key.is_empty() {
            return Ok(None);
        }

        self.cache.get(&Self::store_key(key)).await
    }

    async fn put(&self, key: &str, cart: &Cart) -> Result<(), DomainError> {
        self.cache.set(&Self::store_key(key), cart, self.ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        self.cache.delete(&Self::store_key(key)).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<bool, DomainError> {
        self.cache
            .rename(&Self::store_key(from), &Self::store_key(to))
            .await
    }
}
