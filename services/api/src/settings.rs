//! Service configuration
//!
//! Built-in defaults overlaid by `CLINIC__*` environment variables, e.g.
//! `CLINIC__SERVER__PORT=8080` or `CLINIC__SESSION__JWT_SECRET=...`.
//! Database and Redis settings come from `common` (`DATABASE_URL`, `REDIS_URL`).

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How bearer tokens from the auth service are verified.
///
/// `jwt_public_key` (PEM, or a path to a PEM file) selects RS256;
/// otherwise `jwt_secret` selects HS256.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    pub jwt_public_key: Option<String>,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// TTL of cached clinic listings
    pub clinic_list_ttl_seconds: u64,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from defaults and `CLINIC__*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            Environment::with_prefix("CLINIC")
                .prefix_separator("__")
                .separator("__"),
        )
    }

    fn load_from(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001_i64)?
            .set_default("cache.clinic_list_ttl_seconds", 300_i64)?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}
