//! Telegram Bot API integration
//!
//! Long-polling client for the Telegram Bot API (<https://core.telegram.org/bots/api>).
//! Covers sending and editing messages with inline or reply keyboards,
//! fetching updates and answering callback queries.

pub mod client;
mod models;

pub use client::{TelegramClient, TelegramConfig, TelegramError};
pub use models::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, Location,
    Message, ReplyKeyboardMarkup, ReplyMarkup, Update, User,
};
