//! Telegram client for the Bot API
//!
//! Thin JSON-over-HTTPS client. Every method posts to
//! `{api_base_url}/bot{token}/{method}` and unwraps the `ok`/`result`
//! envelope.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::{
    AnswerCallbackRequest, ApiResponse, EditMessageReplyMarkupRequest, EditMessageTextRequest,
    GetUpdatesRequest, InlineKeyboardMarkup, Message, ReplyMarkup, SendMessageRequest, Update,
    User,
};

/// Telegram API errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Transport or decoding failure, with the request URL stripped
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("API error: {code} - {message}")]
    Api { code: i32, message: String },

    #[error("Rate limited, retry after {retry_after:?}s")]
    RateLimited { retry_after: Option<u64> },

    #[error("Unauthorized: bot token rejected")]
    Unauthorized,

    #[error("Missing configuration: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}

/// Telegram client configuration
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Bot API base URL (default: <https://api.telegram.org>)
    pub api_base_url: String,
    /// Long-polling timeout for getUpdates in seconds (default: 30)
    pub poll_timeout_secs: u64,
    /// Timeout for ordinary requests in seconds (default: 10)
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        if config.bot_token.is_empty() {
            return Err(TelegramError::Configuration(
                "bot_token is required".to_string(),
            ));
        }

        // Long polls must not be cut short by the client timeout
        let timeout = Duration::from_secs(config.request_timeout_secs + config.poll_timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, config })
    }

    /// Long-polling timeout in seconds
    #[must_use]
    pub const fn poll_timeout_secs(&self) -> u64 {
        self.config.poll_timeout_secs
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TelegramError::Unauthorized);
        }

        let envelope: ApiResponse<T> = response.json().await?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TelegramError::RateLimited {
                retry_after: envelope.parameters.and_then(|p| p.retry_after),
            });
        }

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(TelegramError::Api {
                code: error_code.unwrap_or_else(|| i32::from(status.as_u16())),
                message: description.unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }

    /// Send a text message, optionally with an inline or reply keyboard
    #[instrument(skip(self, text, markup))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<&ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        debug!(text_len = text.len(), "Sending Telegram message");
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup: markup,
        };
        self.call("sendMessage", &request).await
    }

    /// Replace the text of a sent message and its inline keyboard
    #[instrument(skip(self, text, keyboard))]
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text,
            reply_markup: keyboard,
        };
        self.call("editMessageText", &request).await
    }

    /// Remove the inline keyboard from a sent message
    #[instrument(skip(self))]
    pub async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<Message, TelegramError> {
        let request = EditMessageReplyMarkupRequest {
            chat_id,
            message_id,
        };
        self.call("editMessageReplyMarkup", &request).await
    }

    /// Fetch updates with id >= `offset`, waiting up to the poll timeout
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.config.poll_timeout_secs,
            allowed_updates: ["message", "callback_query"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        debug!(count = updates.len(), "Fetched Telegram updates");
        Ok(updates)
    }

    /// Acknowledge a callback query, optionally showing a toast
    #[instrument(skip(self, text))]
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<bool, TelegramError> {
        let request = AnswerCallbackRequest {
            callback_query_id,
            text,
        };
        self.call("answerCallbackQuery", &request).await
    }

    /// Identity of the bot; doubles as a token check
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:abc".to_string(),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_token() {
        let result = TelegramClient::new(TelegramConfig::default());
        assert!(matches!(result, Err(TelegramError::Configuration(_))));
    }

    #[test]
    fn method_url_includes_token() {
        let client = TelegramClient::new(TelegramConfig {
            api_base_url: "http://localhost:8080/".to_string(),
            ..config()
        })
        .unwrap();
        assert_eq!(
            client.method_url("getMe"),
            "http://localhost:8080/bot123:abc/getMe"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let client = TelegramClient::new(config()).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("123:abc"));
    }

    #[test]
    fn defaults() {
        let config = TelegramConfig::default();
        assert_eq!(config.api_base_url, "https://api.telegram.org");
        assert_eq!(config.poll_timeout_secs, 30);
    }
}
