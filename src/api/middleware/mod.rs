//! API middleware components

pub mod user_auth;

pub use user_auth::{extract_jwt_token, OptionalUser, RequireAdmin, RequireUser};
