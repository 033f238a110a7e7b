use std::time::Duration;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub cart: CartSettings,
    pub jwt: JwtSettings,
    pub catalog: CatalogSettings,
    /// Users created at startup
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Key-value store backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `redis` or `in_memory`
    #[serde(rename = "type")]
    pub cache_type: String,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    pub operation_timeout_ms: u64,
    pub connection_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CartSettings {
    pub ttl_days: u64,
    /// Cookie carrying the anonymous cart identifier
    pub cookie_name: String,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_minutes: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON array of products loaded at startup
    pub seed_file: Option<String>,
}

/// User created at startup. `password` may be plaintext or an Argon2 hash.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: crate::domain::user::UserRole,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            cache_type: "in_memory".to_string(),
            redis_url: None,
            key_prefix: None,
            operation_timeout_ms: 2_000,
            connection_timeout_ms: 5_000,
        }
    }
}

impl CacheSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

impl Default for CartSettings {
    fn default() -> Self {
        Self {
            ttl_days: 7,
            cookie_name: "AnonymousCartId".to_string(),
            secure_cookie: false,
        }
    }
}

impl CartSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days * 24 * 60 * 60)
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            issuer: "storefront".to_string(),
            audience: "storefront-clients".to_string(),
            expiration_minutes: 60,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
