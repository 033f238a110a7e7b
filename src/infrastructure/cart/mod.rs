//! Cart infrastructure - store-backed repository and service

mod repository;
mod service;

pub use repository::{CacheCartRepository, DEFAULT_CART_TTL};
pub use service::{AddItemOutcome, CartService, MergeOutcome, RejectionReason, UpdateItemOutcome};
