//! Domain layer - entities, invariants and the traits infrastructure implements

pub mod cache;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod revocation;
pub mod user;

pub use error::DomainError;
