//! Application state for shared services

use std::sync::Arc;
use std::time::Duration;

use crate::domain::cache::Cache;
use crate::domain::revocation::RevocationStore;
use crate::infrastructure::auth::{JwtGenerator, TokenValidator};
use crate::infrastructure::cart::CartService;
use crate::infrastructure::user::{Argon2Hasher, InMemoryUserRepository, UserService};

pub type StorefrontUserService = UserService<InMemoryUserRepository, Argon2Hasher>;

/// Settings for the cookie holding the anonymous cart identifier
#[derive(Debug, Clone)]
pub struct CartCookieSettings {
    pub name: String,
    pub max_age: Duration,
    pub secure: bool,
}

impl Default for CartCookieSettings {
    fn default() -> Self {
        Self {
            name: "AnonymousCartId".to_string(),
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            secure: false,
        }
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub cart_service: Arc<CartService>,
    pub revocations: Arc<dyn RevocationStore>,
    pub token_validator: TokenValidator,
    pub jwt_service: Arc<dyn JwtGenerator>,
    pub user_service: Arc<StorefrontUserService>,
    /// Backing store, pinged by the readiness probe
    pub store: Arc<dyn Cache>,
    pub cart_cookie: CartCookieSettings,
}

impl AppState {
    pub fn new(
        cart_service: Arc<CartService>,
        revocations: Arc<dyn RevocationStore>,
        jwt_service: Arc<dyn JwtGenerator>,
        user_service: Arc<StorefrontUserService>,
        store: Arc<dyn Cache>,
    ) -> Self {
        let token_validator = TokenValidator::new(jwt_service.clone(), revocations.clone());

        Self {
            cart_service,
            revocations,
            token_validator,
            jwt_service,
            user_service,
            store,
            cart_cookie: CartCookieSettings::default(),
        }
    }

    pub fn with_cart_cookie(mut self, cart_cookie: CartCookieSettings) -> Self {
        self.cart_cookie = cart_cookie;
        self
    }
}
