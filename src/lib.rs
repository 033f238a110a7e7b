//! Storefront session state
//!
//! Volatile per-session state for a storefront backed by a key-value store:
//! - Shopping carts for anonymous and signed-in shoppers, merged at login
//! - Access token revocation that expires with the token

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{CacheSettings, SeedUser};
use api::state::{AppState, CartCookieSettings};
use domain::cache::Cache;
use domain::catalog::ProductCatalog;
use infrastructure::{
    auth::{JwtConfig, JwtService},
    cache::{CacheConfig, CacheFactory, CacheType},
    cart::{CacheCartRepository, CartService},
    catalog::InMemoryProductCatalog,
    revocation::CacheRevocationStore,
    user::{Argon2Hasher, CreateUserRequest, InMemoryUserRepository, UserService},
};

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Build application state from configuration
///
/// Fails when the store cannot be reached at startup, the catalog seed file
/// is unreadable, or a seed user is invalid.
pub async fn build_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = create_store(&config.cache).await?;

    let carts = CacheCartRepository::new(store.clone()).with_ttl(config.cart.ttl());
    let catalog = create_catalog(config).await?;
    let cart_service = CartService::new(Arc::new(carts), catalog);

    let revocations = CacheRevocationStore::new(store.clone());

    if config.jwt.secret == DEFAULT_JWT_SECRET {
        warn!("Using the default JWT secret. Set APP__JWT__SECRET in production.");
    }
    let jwt_service = JwtService::new(
        JwtConfig::new(config.jwt.secret.clone(), config.jwt.expiration_minutes)
            .with_issuer(config.jwt.issuer.clone())
            .with_audience(config.jwt.audience.clone()),
    );

    let user_service = UserService::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(Argon2Hasher::new()),
    );
    seed_users(&user_service, &config.users).await?;

    let cart_cookie = CartCookieSettings {
        name: config.cart.cookie_name.clone(),
        max_age: config.cart.ttl(),
        secure: config.cart.secure_cookie,
    };

    Ok(AppState::new(
        Arc::new(cart_service),
        Arc::new(revocations),
        Arc::new(jwt_service),
        Arc::new(user_service),
        store,
    )
    .with_cart_cookie(cart_cookie))
}

async fn create_store(settings: &CacheSettings) -> anyhow::Result<Arc<dyn Cache>> {
    let cache_type = CacheType::from_str(&settings.cache_type)?;

    let mut cache_config = match cache_type {
        CacheType::InMemory => CacheConfig::in_memory(),
        CacheType::Redis => {
            let url = settings
                .redis_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("cache.redis_url is required for the redis store"))?;
            CacheConfig::redis(url)
        }
    }
    .with_operation_timeout(settings.operation_timeout())
    .with_connection_timeout(settings.connection_timeout());

    if let Some(prefix) = &settings.key_prefix {
        cache_config = cache_config.with_key_prefix(prefix.clone());
    }

    Ok(CacheFactory::new().create(&cache_config).await?)
}

async fn create_catalog(config: &AppConfig) -> anyhow::Result<Arc<dyn ProductCatalog>> {
    let catalog = match &config.catalog.seed_file {
        Some(path) => {
            let catalog = InMemoryProductCatalog::from_file(path).await?;
            let products = catalog.len().await;
            info!(path = %path, products, "Loaded product catalog");
            catalog
        }
        None => {
            warn!("No catalog seed file configured; every product lookup will miss");
            InMemoryProductCatalog::new()
        }
    };

    Ok(Arc::new(catalog))
}

async fn seed_users(
    service: &UserService<InMemoryUserRepository, Argon2Hasher>,
    users: &[SeedUser],
) -> anyhow::Result<()> {
    for seed in users {
        let user = service
            .seed(CreateUserRequest {
                id: seed.id.clone(),
                email: seed.email.clone(),
                name: seed.name.clone(),
                password: seed.password.clone(),
                role: seed.role,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Invalid seed user '{}': {}", seed.email, e))?;

        info!(user_id = %user.id(), "Seeded user");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserRole;

    #[tokio::test]
    async fn test_default_config_builds_state() {
        let state = build_app_state(&AppConfig::default()).await.unwrap();

        assert_eq!(state.cart_cookie.name, "AnonymousCartId");
        assert!(state.store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_seed_users_can_log_in() {
        let mut config = AppConfig::default();
        config.cart.cookie_name = "cart".to_string();
        config.users.push(SeedUser {
            id: Some("user-1".to_string()),
            email: "jane@example.com".to_string(),
            name: "Jane".to_string(),
            password: "secure_password123".to_string(),
            role: UserRole::Customer,
        });

        let state = build_app_state(&config).await.unwrap();

        assert_eq!(state.cart_cookie.name, "cart");
        assert!(state
            .user_service
            .authenticate("jane@example.com", "secure_password123")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_invalid_store_settings_fail() {
        let mut config = AppConfig::default();
        config.cache.cache_type = "memcached".to_string();
        assert!(build_app_state(&config).await.is_err());

        let mut config = AppConfig::default();
        config.cache.cache_type = "redis".to_string();
        assert!(build_app_state(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_catalog_file_fails() {
        let mut config = AppConfig::default();
        config.catalog.seed_file = Some("does/not/exist.json".to_string());

        assert!(build_app_state(&config).await.is_err());
    }
}
