//! User infrastructure module
//!
//! Password hashing with Argon2, the in-memory repository and the user
//! service used by login.

mod password;
mod repository;
mod service;

pub use password::{is_password_hash, Argon2Hasher, PasswordHasher};
pub use repository::InMemoryUserRepository;
pub use service::{CreateUserRequest, UserService};
