//! Weather bot presentation layer
//!
//! Background tasks that connect the chat platform to the application
//! services. The binary in `main.rs` wires everything together.

pub mod tasks;

pub use tasks::spawn_telegram_polling_task;
