//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Backend HTTP API configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Document store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Signed-in session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend HTTP API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL the `/api/complaint/...` paths are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Collection holding complaint documents.
    #[serde(default = "default_complaints_collection")]
    pub complaints_collection: String,
    /// Collection holding per-user role documents.
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
}

/// Signed-in session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Delay before a non-admin is signed out of the admin sign-in flow.
    #[serde(default = "default_admin_signout_delay_ms")]
    pub admin_signout_delay_ms: u64,
    /// Identifier recorded as the author of admin actions.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Display name recorded as the author of admin comments.
    #[serde(default = "default_user_name")]
    pub user_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_complaints_collection() -> String {
    "complaints".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

const fn default_admin_signout_delay_ms() -> u64 {
    1000
}

fn default_user_id() -> String {
    "admin".to_string()
}

fn default_user_name() -> String {
    "Admin".to_string()
}

fn default_log_filter() -> String {
    "campus=info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            token: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            complaints_collection: default_complaints_collection(),
            users_collection: default_users_collection(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            admin_signout_delay_ms: default_admin_signout_delay_ms(),
            user_id: default_user_id(),
            user_name: default_user_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl ApiConfig {
    /// Total request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl SessionConfig {
    /// Delay before a non-admin is signed out.
    #[must_use]
    pub const fn admin_signout_delay(&self) -> Duration {
        Duration::from_millis(self.admin_signout_delay_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (via dotenvy, if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `CAMPUS_ENV`)
    /// 4. Environment variables with `CAMPUS__` prefix
    pub fn load() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("CAMPUS_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the deserializer cannot.
    pub fn validate(&self) -> AppResult<()> {
        let url = url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::Config(format!("api.base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "api.base_url: unsupported scheme {}",
                url.scheme()
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::Config(
                "api.timeout_secs must be positive".to_string(),
            ));
        }
        if self.store.complaints_collection.trim().is_empty()
            || self.store.users_collection.trim().is_empty()
        {
            return Err(AppError::Config(
                "store collection names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
