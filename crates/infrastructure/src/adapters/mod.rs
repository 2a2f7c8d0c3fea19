//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod telegram_adapter;
mod weather_adapter;

pub use telegram_adapter::TelegramMessengerAdapter;
pub use weather_adapter::WeatherAdapter;
