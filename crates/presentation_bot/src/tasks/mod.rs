//! Background tasks for the bot presentation layer

mod telegram_polling;

pub use telegram_polling::spawn_telegram_polling_task;
