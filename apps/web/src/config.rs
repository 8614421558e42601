//! # Service Configuration
//!
//! Settings are layered, later sources winning:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Settings::default()          built-in values                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  config/sonho.toml            optional; SONHO_CONFIG points elsewhere    │
//! │         │                     (and then the file must exist)            │
//! │         ▼                                                               │
//! │  SONHO_* environment          SONHO_SERVER__PORT=8080                   │
//! │         │                     SONHO_POS__MANAGER_OVERRIDE_CODE=9876     │
//! │         ▼                                                               │
//! │  Settings::validate()                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numbers coming from the environment are strings, hence
//! `deserialize_number_from_string` on every numeric field.

use std::env;
use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;

use sonho_core::{DEFAULT_DISCOUNT_BPS, DEFAULT_OVERRIDE_CODE, DEFAULT_PAGE_SIZE, NOTIFICATION_TTL_SECS};
use sonho_db::DbConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "SONHO_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/sonho.toml";
const ENV_PREFIX: &str = "SONHO";

/// Development-only signing secret. `main` warns when it is still in use.
pub const DEV_JWT_SECRET: &str = "sonho-dev-secret-change-in-production";

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub pos: PosSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    pub path: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: "sonho.db".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseSettings {
    pub fn db_config(&self) -> DbConfig {
        if self.path == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.path).max_connections(self.max_connections)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    /// Token and session lifetime.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub session_lifetime_secs: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_lifetime_secs: 8 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSettings {
    /// Shared code that unlocks the manager discount.
    pub manager_override_code: String,
    /// Discount in basis points (1000 = 10%).
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub discount_bps: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub notification_ttl_secs: i64,
    /// Dashboard product list page size.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_size: usize,
}

impl Default for PosSettings {
    fn default() -> Self {
        PosSettings {
            manager_override_code: DEFAULT_OVERRIDE_CODE.to_string(),
            discount_bps: DEFAULT_DISCOUNT_BPS,
            notification_ttl_secs: NOTIFICATION_TTL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Settings {
    /// Loads the layered configuration.
    pub fn load() -> Result<Self, ConfigError> {
        let (path, required) = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let builder = Self::defaults()?
            .add_source(File::from(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::from_builder(builder)
    }

    /// A builder seeded with `Settings::default()`.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder().add_source(Config::try_from(&Settings::default())?))
    }

    /// Builds, deserializes and validates.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }

        if self.auth.session_lifetime_secs < 60 {
            return Err(ConfigError::InvalidValue {
                field: "auth.session_lifetime_secs".to_string(),
                reason: "must be at least 60".to_string(),
            });
        }

        if self.pos.manager_override_code.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "pos.manager_override_code".to_string(),
            ));
        }

        if self.pos.discount_bps > 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "pos.discount_bps".to_string(),
                reason: "must be at most 10000".to_string(),
            });
        }

        if self.pos.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pos.page_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.pos.notification_ttl_secs < 1 {
            return Err(ConfigError::InvalidValue {
                field: "pos.notification_ttl_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let builder = Settings::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml));
        Settings::from_builder(builder)
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = from_toml("").unwrap();

        assert_eq!(settings.server.address(), "127.0.0.1:3000");
        assert_eq!(settings.database.path, "sonho.db");
        assert_eq!(settings.auth.session_lifetime_secs, 28_800);
        assert_eq!(settings.pos.manager_override_code, "1234");
        assert_eq!(settings.pos.discount_bps, 1000);
        assert_eq!(settings.pos.notification_ttl_secs, 3);
        assert_eq!(settings.pos.page_size, 5);
    }

    #[test]
    fn test_file_overrides_and_numeric_strings() {
        let settings = from_toml(
            r#"
            [server]
            port = "8080"

            [pos]
            manager_override_code = "9876"
            discount_bps = 500
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.pos.manager_override_code, "9876");
        assert_eq!(settings.pos.discount_bps, 500);
        assert_eq!(settings.pos.page_size, 5);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let err = from_toml("[pos]\ndiscount_bps = 10001").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "pos.discount_bps"));

        let err = from_toml("[pos]\npage_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "pos.page_size"));

        let err = from_toml("[auth]\njwt_secret = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));

        let err = from_toml("[pos]\nmanager_override_code = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_in_memory_database_path() {
        let settings = from_toml("[database]\npath = \":memory:\"").unwrap();
        let db_config = settings.database.db_config();
        assert_eq!(db_config.max_connections, 1);
    }
}
