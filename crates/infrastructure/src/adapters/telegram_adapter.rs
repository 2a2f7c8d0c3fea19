//! Telegram messenger adapter
//!
//! Implements [`MessengerPort`] on top of the Bot API client and turns raw
//! updates into [`IncomingUpdate`]s. Updates the bot cannot act on (stickers,
//! edited messages, callback presses without data) are consumed but dropped.

use application::error::ApplicationError;
use application::ports::{IncomingUpdate, InlineButton, MenuButton, MessengerPort, UpdateBatch};
use async_trait::async_trait;
use domain::value_objects::{ChatId, GeoLocation};
use integration_telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup, ReplyMarkup,
    TelegramClient, TelegramConfig, TelegramError, Update,
};
use tracing::{debug, instrument, warn};

/// Buttons laid out side by side before wrapping to a new row
const BUTTONS_PER_ROW: usize = 2;

/// Adapter for the Telegram Bot API
#[derive(Debug)]
pub struct TelegramMessengerAdapter {
    client: TelegramClient,
}

impl TelegramMessengerAdapter {
    /// Create a new adapter
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bot token is missing or the
    /// HTTP client cannot be built.
    pub fn new(config: TelegramConfig) -> Result<Self, ApplicationError> {
        let client = TelegramClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self { client })
    }

    /// Verify the bot token by asking the API who we are
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is rejected.
    pub async fn verify(&self) -> Result<String, ApplicationError> {
        let me = self.client.get_me().await.map_err(Self::map_fetch_error)?;
        Ok(me.username.unwrap_or(me.first_name))
    }

    fn map_delivery_error(err: TelegramError) -> ApplicationError {
        match err {
            TelegramError::Unauthorized | TelegramError::Configuration(_) => {
                ApplicationError::Configuration(err.to_string())
            },
            e => ApplicationError::DeliveryFailed(e.to_string()),
        }
    }

    fn map_fetch_error(err: TelegramError) -> ApplicationError {
        match err {
            TelegramError::Unauthorized | TelegramError::Configuration(_) => {
                ApplicationError::Configuration(err.to_string())
            },
            e => ApplicationError::Internal(e.to_string()),
        }
    }

    fn keyboard(buttons: Vec<InlineButton>) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::in_rows(
            buttons
                .into_iter()
                .map(|b| InlineKeyboardButton {
                    text: b.label,
                    callback_data: b.callback_data,
                })
                .collect(),
            BUTTONS_PER_ROW,
        )
    }

    fn menu(buttons: Vec<MenuButton>) -> ReplyKeyboardMarkup {
        ReplyKeyboardMarkup::in_rows(
            buttons
                .into_iter()
                .map(|b| KeyboardButton {
                    text: b.label,
                    request_location: b.request_location,
                })
                .collect(),
            BUTTONS_PER_ROW,
        )
    }

    /// Convert a raw update, or `None` if the bot has no use for it
    fn convert(update: Update) -> Option<IncomingUpdate> {
        if let Some(query) = update.callback_query {
            let chat_id = ChatId::new(query.chat_id());
            let message_id = query.message.as_ref().map(|m| m.message_id);
            return query.data.map(|data| IncomingUpdate::Callback {
                chat_id,
                message_id,
                callback_id: query.id,
                data,
            });
        }

        let message = update.message?;
        let chat_id = ChatId::new(message.chat.id);

        if let Some(shared) = message.location {
            return match GeoLocation::new(shared.latitude, shared.longitude) {
                Ok(location) => Some(IncomingUpdate::Location { chat_id, location }),
                Err(e) => {
                    warn!(chat_id = %chat_id, error = %e, "Ignoring out-of-range location");
                    None
                },
            };
        }

        message
            .text
            .map(|text| IncomingUpdate::Text { chat_id, text })
    }

    fn into_batch(updates: Vec<Update>) -> UpdateBatch {
        let next_offset = updates.iter().map(|u| u.update_id).max().map(|id| id + 1);
        let updates = updates.into_iter().filter_map(Self::convert).collect();
        UpdateBatch {
            updates,
            next_offset,
        }
    }
}

#[async_trait]
impl MessengerPort for TelegramMessengerAdapter {
    #[instrument(skip(self, text), fields(chat_id = %chat_id))]
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ApplicationError> {
        self.client
            .send_message(chat_id.value(), text, None)
            .await
            .map_err(Self::map_delivery_error)?;
        Ok(())
    }

    #[instrument(skip(self, text, buttons), fields(chat_id = %chat_id))]
    async fn send_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Vec<InlineButton>,
    ) -> Result<(), ApplicationError> {
        let keyboard = ReplyMarkup::from(Self::keyboard(buttons));
        self.client
            .send_message(chat_id.value(), text, Some(&keyboard))
            .await
            .map_err(Self::map_delivery_error)?;
        Ok(())
    }

    #[instrument(skip(self, text, menu), fields(chat_id = %chat_id))]
    async fn send_with_menu(
        &self,
        chat_id: ChatId,
        text: &str,
        menu: Vec<MenuButton>,
    ) -> Result<(), ApplicationError> {
        let menu = ReplyMarkup::from(Self::menu(menu));
        self.client
            .send_message(chat_id.value(), text, Some(&menu))
            .await
            .map_err(Self::map_delivery_error)?;
        Ok(())
    }

    #[instrument(skip(self, text, buttons), fields(chat_id = %chat_id))]
    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
        buttons: Vec<InlineButton>,
    ) -> Result<(), ApplicationError> {
        let keyboard = (!buttons.is_empty()).then(|| Self::keyboard(buttons));
        self.client
            .edit_message_text(chat_id.value(), message_id, text, keyboard.as_ref())
            .await
            .map_err(Self::map_delivery_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(chat_id = %chat_id))]
    async fn clear_buttons(
        &self,
        chat_id: ChatId,
        message_id: i64,
    ) -> Result<(), ApplicationError> {
        self.client
            .edit_message_reply_markup(chat_id.value(), message_id)
            .await
            .map_err(Self::map_delivery_error)?;
        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: &str,
    ) -> Result<(), ApplicationError> {
        let toast = (!text.is_empty()).then_some(text);
        self.client
            .answer_callback_query(callback_id, toast)
            .await
            .map_err(Self::map_delivery_error)?;
        Ok(())
    }

    async fn fetch_updates(&self, offset: Option<i64>) -> Result<UpdateBatch, ApplicationError> {
        let updates = self
            .client
            .get_updates(offset)
            .await
            .map_err(Self::map_fetch_error)?;
        let batch = Self::into_batch(updates);
        debug!(
            accepted = batch.updates.len(),
            next_offset = ?batch.next_offset,
            "Converted Telegram updates"
        );
        Ok(batch)
    }
}
