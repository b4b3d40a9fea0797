//! API configuration module.
//!
//! Built once at startup from defaults overridden by `VITRINE_*` environment
//! variables, then handed to the components that need it.
//!
//! ## Environment Variables
//! - `VITRINE_BIND_ADDR` - Listen address (default: 0.0.0.0)
//! - `VITRINE_HTTP_PORT` - HTTP port (default: 8484)
//! - `VITRINE_DATABASE_PATH` - SQLite file (default: ./data/vitrine.db)
//! - `VITRINE_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `VITRINE_BUSY_TIMEOUT_MS` - How long a writer waits for the lock (default: 5000)
//! - `VITRINE_FULFILLMENT_TIMEOUT_MS` - Deadline for one sale (default: 5000)

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use vitrine_db::DbConfig;

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address
    pub bind_addr: String,

    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// SQLite busy timeout in milliseconds
    pub busy_timeout_ms: u64,

    /// Per-sale deadline in milliseconds, payment capture included
    pub fulfillment_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: "0.0.0.0".to_string(),
            http_port: 8484,
            database_path: PathBuf::from("./data/vitrine.db"),
            max_connections: 5,
            busy_timeout_ms: 5000,
            fulfillment_timeout_ms: 5000,
        }
    }
}

impl ApiConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(Environment::with_prefix("VITRINE").try_parsing(true))
    }

    /// Load configuration from defaults plus one override source.
    pub fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = ApiConfig::default();

        let config: ApiConfig = Config::builder()
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("http_port", i64::from(defaults.http_port))?
            .set_default("database_path", defaults.database_path.to_string_lossy().into_owned())?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("busy_timeout_ms", defaults.busy_timeout_ms as i64)?
            .set_default("fulfillment_timeout_ms", defaults.fulfillment_timeout_ms as i64)?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.fulfillment_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("fulfillment_timeout_ms".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        Ok(())
    }

    /// `bind_addr:http_port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }

    pub fn fulfillment_timeout(&self) -> Duration {
        Duration::from_millis(self.fulfillment_timeout_ms)
    }

    /// Pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Configuration error: {0}")]
    Source(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("VITRINE")
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_source(env(&[])).unwrap();
        assert_eq!(config.http_port, 8484);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.database_path, PathBuf::from("./data/vitrine.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.fulfillment_timeout(), Duration::from_secs(5));
        assert_eq!(config.listen_address(), "0.0.0.0:8484");
    }

    #[test]
    fn test_environment_overrides() {
        let config = ApiConfig::from_source(env(&[
            ("VITRINE_HTTP_PORT", "9000"),
            ("VITRINE_DATABASE_PATH", "/tmp/loja.db"),
            ("VITRINE_FULFILLMENT_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.database_path, PathBuf::from("/tmp/loja.db"));
        assert_eq!(config.fulfillment_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(ApiConfig::from_source(env(&[("VITRINE_HTTP_PORT", "not-a-port")])).is_err());
        assert!(matches!(
            ApiConfig::from_source(env(&[("VITRINE_MAX_CONNECTIONS", "0")])),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
