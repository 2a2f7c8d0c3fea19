//! Application services - Use case implementations

pub mod change_detection;
pub mod chat_service;
pub mod notification_service;
pub mod user_registry;
pub mod weather_report;

pub use change_detection::{rain_expected, should_alert_temperature};
pub use chat_service::{ChatService, Command, Keyboard, Reply};
pub use notification_service::{NotificationService, TickReport, UserOutcome};
pub use user_registry::{UserRegistry, WatchedUser};
