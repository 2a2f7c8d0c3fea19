//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer.
//! Contains the OpenWeatherMap and Telegram adapters, the JSON snapshot
//! store, configuration loading, logging setup and the notification scheduler.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod scheduler;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    AppConfig, NotificationsConfig, StorageConfig, TelegramAppConfig, TelemetryAppConfig,
    WeatherAppConfig,
};
pub use persistence::JsonUserStore;
pub use scheduler::{NotificationScheduler, SchedulerError, SchedulerHandle, SchedulerStats};
pub use telemetry::{TelemetryError, init_tracing};
