//! API layer - HTTP endpoints and extractors

pub mod auth;
pub mod cart;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use middleware::{OptionalUser, RequireUser};
pub use router::create_router;
pub use state::AppState;
