//! Infrastructure layer - store backends and service implementations

pub mod auth;
pub mod cache;
pub mod cart;
pub mod catalog;
pub mod logging;
pub mod revocation;
pub mod user;
