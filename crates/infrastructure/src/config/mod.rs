//! Application configuration
//!
//! Split into focused sub-modules by concern:
//! - `messenger`: Telegram Bot API
//! - `integrations`: OpenWeatherMap
//! - `notifications`: notification loop and snapshot storage
//! - `logging`: log filter and output format
//!
//! Sources are layered: built-in defaults, then an optional `config.toml`,
//! then environment variables such as `WEATHERBOT_TELEGRAM__BOT_TOKEN`.

mod integrations;
mod logging;
mod messenger;
mod notifications;

use serde::{Deserialize, Serialize};

pub use integrations::WeatherAppConfig;
pub use logging::TelemetryAppConfig;
pub use messenger::TelegramAppConfig;
pub use notifications::{NotificationsConfig, StorageConfig};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "WEATHERBOT";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot settings
    #[serde(default)]
    pub telegram: TelegramAppConfig,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherAppConfig,

    /// Periodic notification settings
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Snapshot storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryAppConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional file
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (e.g., WEATHERBOT_NOTIFICATIONS__INTERVAL_SECS)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Check that the credentials needed at startup are present
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.telegram.bot_token_str().is_none_or(str::is_empty) {
            return Err(config::ConfigError::NotFound(
                "telegram.bot_token".to_string(),
            ));
        }
        if self.weather.api_key_str().is_none_or(str::is_empty) {
            return Err(config::ConfigError::NotFound("weather.api_key".to_string()));
        }
        if self.notifications.interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "notifications.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
