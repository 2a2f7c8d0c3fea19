//! Messenger port - Interface for the chat platform
//!
//! Abstracts sending and editing replies, answering button presses and
//! receiving updates so the application layer stays platform agnostic.

#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;
use domain::value_objects::{ChatId, GeoLocation};
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// A button attached below a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    /// Text shown on the button
    pub label: String,
    /// Opaque data sent back when the button is pressed
    pub callback_data: String,
}

impl InlineButton {
    #[must_use]
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// A persistent menu button shown in place of the phone keyboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButton {
    /// Text shown on the button and sent when it is pressed
    pub label: String,
    /// Send the user's location instead of the label
    pub request_location: bool,
}

impl MenuButton {
    #[must_use]
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_location: false,
        }
    }

    #[must_use]
    pub fn location(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_location: true,
        }
    }
}

/// An update received from the chat platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncomingUpdate {
    /// Plain text or a command
    Text { chat_id: ChatId, text: String },
    /// A shared geolocation
    Location {
        chat_id: ChatId,
        location: GeoLocation,
    },
    /// An inline button press
    Callback {
        chat_id: ChatId,
        /// Message carrying the pressed button, when still known
        message_id: Option<i64>,
        callback_id: String,
        data: String,
    },
}

impl IncomingUpdate {
    /// Chat the update belongs to
    #[must_use]
    pub const fn chat_id(&self) -> ChatId {
        match self {
            Self::Text { chat_id, .. }
            | Self::Location { chat_id, .. }
            | Self::Callback { chat_id, .. } => *chat_id,
        }
    }
}

/// Updates fetched in one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBatch {
    /// Updates the application understands, in arrival order
    pub updates: Vec<IncomingUpdate>,
    /// Offset to pass to the next poll, if anything was consumed
    pub next_offset: Option<i64>,
}

/// Port for chat platform operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessengerPort: Send + Sync {
    /// Send a plain text message
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ApplicationError>;

    /// Send a message with inline buttons
    async fn send_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Vec<InlineButton>,
    ) -> Result<(), ApplicationError>;

    /// Send a message and replace the user's keyboard with a menu
    async fn send_with_menu(
        &self,
        chat_id: ChatId,
        text: &str,
        menu: Vec<MenuButton>,
    ) -> Result<(), ApplicationError>;

    /// Replace the text and inline buttons of a sent message
    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
        buttons: Vec<InlineButton>,
    ) -> Result<(), ApplicationError>;

    /// Remove the inline buttons from a sent message
    async fn clear_buttons(&self, chat_id: ChatId, message_id: i64)
    -> Result<(), ApplicationError>;

    /// Acknowledge a button press with a short toast
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: &str,
    ) -> Result<(), ApplicationError>;

    /// Fetch pending updates starting at `offset`
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<UpdateBatch, ApplicationError>;
}
