//! Token revocation backed by the key-value store

mod store;

pub use store::CacheRevocationStore;
