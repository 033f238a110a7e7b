//! Cache domain - key-value store abstraction shared by carts and revocation

mod repository;

pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
