use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth;
use super::cart;
use super::health;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Cart endpoints (anonymous or authenticated)
        .nest("/api/cart", cart::create_cart_router())
        // Authentication endpoints (no auth required for login)
        .nest("/api/auth", auth::create_auth_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
