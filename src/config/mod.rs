use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Errors raised while loading configuration. Any of these is fatal at
/// startup; the process must not serve traffic without a signing secret
/// or database credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection string, either taken from DATABASE_URL or composed
    /// from the discrete DB_* variables.
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// JWT_SECRET is required and must be non-empty. Database settings come
    /// from DATABASE_URL when present, otherwise from DB_HOST / DB_PORT /
    /// DB_USER / DB_PASSWORD / DB_NAME, in which case DB_PASSWORD is
    /// required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_env_or("PORT", 8080)?;

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() {
            return Err(ConfigError::MissingVar("JWT_SECRET"));
        }

        let url = match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => {
                let host = env_or("DB_HOST", "localhost");
                let db_port = env_or("DB_PORT", "5432");
                let user = env_or("DB_USER", "postgres");
                let password =
                    env::var("DB_PASSWORD").map_err(|_| ConfigError::MissingVar("DB_PASSWORD"))?;
                if password.is_empty() {
                    return Err(ConfigError::MissingVar("DB_PASSWORD"));
                }
                let name = env_or("DB_NAME", "fasisi_db");
                format!("postgres://{}:{}@{}:{}/{}", user, password, host, db_port, name)
            }
        };

        Ok(Self {
            server: ServerConfig { port },
            database: DatabaseConfig {
                url,
                max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            security: SecurityConfig {
                jwt_secret,
                access_token_ttl_secs: parse_env_or("ACCESS_TOKEN_TTL_SECS", 900)?,
                refresh_token_ttl_secs: parse_env_or("REFRESH_TOKEN_TTL_SECS", 7 * 24 * 3600)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var: key, value }),
        _ => Ok(default),
    }
}

// Global singleton config - initialized once at startup
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Install the loaded configuration; a second call keeps the first value.
pub fn init(config: AppConfig) -> &'static AppConfig {
    CONFIG.get_or_init(|| config)
}

/// Convenience accessor. Panics if `init` has not run; main installs the
/// config before anything else touches it.
pub fn config() -> &'static AppConfig {
    CONFIG.get().expect("configuration not initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable tests share process state, so both cases run in
    // one test body to avoid ordering flakes under the parallel runner.
    #[test]
    fn from_env_requires_secret_then_composes_dsn() {
        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("DATABASE_URL");
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("JWT_SECRET")));

        std::env::set_var("JWT_SECRET", "test-secret");
        std::env::set_var("DB_PASSWORD", "pw");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(
            config.database.url,
            "postgres://postgres:pw@localhost:5432/fasisi_db"
        );
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.access_token_ttl_secs, 900);
        assert_eq!(config.security.refresh_token_ttl_secs, 7 * 24 * 3600);
    }
}
