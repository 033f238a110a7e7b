//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheSettings, CartSettings, CatalogSettings, JwtSettings, LogFormat,
    LoggingConfig, SeedUser, ServerConfig,
};
