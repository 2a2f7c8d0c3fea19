//! Messenger configuration: Telegram Bot API.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Telegram integration configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramAppConfig {
    /// Bot token from @BotFather (sensitive - uses SecretString)
    #[serde(default, skip_serializing)]
    pub bot_token: Option<SecretString>,

    /// Bot API base URL (default: https://api.telegram.org)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Long-polling timeout for getUpdates in seconds (default: 30)
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Timeout for ordinary Bot API calls in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Pause after a failed poll before trying again, in seconds (default: 5)
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
}

impl std::fmt::Debug for TelegramAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramAppConfig")
            .field(
                "bot_token",
                &if self.bot_token.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("error_backoff_secs", &self.error_backoff_secs)
            .finish()
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

const fn default_poll_timeout() -> u64 {
    30
}

const fn default_request_timeout() -> u64 {
    10
}

const fn default_error_backoff() -> u64 {
    5
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_api_base_url(),
            poll_timeout_secs: default_poll_timeout(),
            request_timeout_secs: default_request_timeout(),
            error_backoff_secs: default_error_backoff(),
        }
    }
}

impl TelegramAppConfig {
    /// Get the bot token as a string reference (for API calls)
    #[must_use]
    pub fn bot_token_str(&self) -> Option<&str> {
        self.bot_token.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Build the client configuration
    #[must_use]
    pub fn to_client_config(&self) -> integration_telegram::TelegramConfig {
        integration_telegram::TelegramConfig {
            bot_token: self.bot_token_str().unwrap_or_default().to_string(),
            api_base_url: self.api_base_url.clone(),
            poll_timeout_secs: self.poll_timeout_secs,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}
