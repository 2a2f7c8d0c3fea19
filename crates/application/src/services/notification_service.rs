//! Notification service for periodic weather alerts
//!
//! One tick walks every subscribed user with a saved location, applies the
//! temperature and rain policies and pushes the resulting notifications.
//! Failures are isolated per user and never abort the tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::value_objects::ChatId;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{MessengerPort, WeatherPort};
use crate::services::change_detection::{rain_expected, should_alert_temperature};
use crate::services::user_registry::{UserRegistry, WatchedUser};
use crate::services::weather_report::{RAIN_WARNING, temperature_update};

/// What happened for a single user during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserOutcome {
    /// Notifications delivered
    pub notifications_sent: usize,
    /// Notifications the messenger rejected
    pub delivery_failures: usize,
    /// Provider calls that failed and skipped a detection step
    pub provider_failures: usize,
}

/// Summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Users known to the registry
    pub users_total: usize,
    /// Subscribed users with a location
    pub users_checked: usize,
    /// Users without a subscription or location
    pub users_skipped: usize,
    /// Checked users with at least one failed provider call
    pub users_degraded: usize,
    /// Users whose processing failed outright
    pub users_failed: usize,
    /// Notifications delivered
    pub notifications_sent: usize,
    /// Notifications the messenger rejected
    pub delivery_failures: usize,
}

impl TickReport {
    fn record(&mut self, outcome: UserOutcome) {
        if outcome.provider_failures > 0 {
            self.users_degraded += 1;
        }
        self.notifications_sent += outcome.notifications_sent;
        self.delivery_failures += outcome.delivery_failures;
    }
}

/// Service running the change-detection policy for subscribed users
pub struct NotificationService {
    weather: Arc<dyn WeatherPort>,
    messenger: Arc<dyn MessengerPort>,
    registry: Arc<UserRegistry>,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("users", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl NotificationService {
    /// Create a new notification service
    #[must_use]
    pub fn new(
        weather: Arc<dyn WeatherPort>,
        messenger: Arc<dyn MessengerPort>,
        registry: Arc<UserRegistry>,
    ) -> Self {
        Self {
            weather,
            messenger,
            registry,
        }
    }

    /// Run one pass over all users
    ///
    /// `now` anchors the rain horizon.
    #[instrument(skip(self))]
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickReport {
        let users_total = self.registry.len();
        let watched = self.registry.watched_users();
        let mut report = TickReport {
            users_total,
            users_checked: watched.len(),
            users_skipped: users_total.saturating_sub(watched.len()),
            ..TickReport::default()
        };

        for user in watched {
            match self.process_user(user, now).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(chat_id = %user.chat_id, error = %e, "User skipped for this tick");
                    report.users_failed += 1;
                },
            }
        }

        info!(
            users_total = report.users_total,
            users_checked = report.users_checked,
            users_skipped = report.users_skipped,
            users_degraded = report.users_degraded,
            users_failed = report.users_failed,
            notifications_sent = report.notifications_sent,
            delivery_failures = report.delivery_failures,
            "Notification tick complete"
        );
        report
    }

    async fn process_user(
        &self,
        user: WatchedUser,
        now: DateTime<Utc>,
    ) -> Result<UserOutcome, ApplicationError> {
        let mut outcome = UserOutcome::default();

        match self.weather.current_conditions(&user.location).await {
            Ok(conditions) => {
                let previous = self
                    .registry
                    .with_record(user.chat_id, |record| {
                        record.record_temperature(conditions.temperature)
                    })
                    .ok_or_else(|| missing_record(user.chat_id))?;

                if should_alert_temperature(previous, conditions.temperature) {
                    let text = temperature_update(&conditions, previous);
                    self.deliver(user.chat_id, &text, &mut outcome).await;
                }
            },
            Err(e) => {
                warn!(chat_id = %user.chat_id, error = %e, "Current conditions unavailable, skipping temperature check");
                outcome.provider_failures += 1;
            },
        }

        let expected = match self.weather.forecast(&user.location).await {
            Ok(entries) => rain_expected(&entries, now),
            Err(e) => {
                warn!(chat_id = %user.chat_id, error = %e, "Forecast unavailable, assuming no rain");
                outcome.provider_failures += 1;
                false
            },
        };

        let alert = self
            .registry
            .with_record(user.chat_id, |record| record.record_rain_expectation(expected))
            .ok_or_else(|| missing_record(user.chat_id))?;

        if alert {
            self.deliver(user.chat_id, RAIN_WARNING, &mut outcome).await;
        }

        Ok(outcome)
    }

    async fn deliver(&self, chat_id: ChatId, text: &str, outcome: &mut UserOutcome) {
        match self.messenger.send_text(chat_id, text).await {
            Ok(()) => {
                debug!(%chat_id, "Notification sent");
                outcome.notifications_sent += 1;
            },
            Err(e) => {
                warn!(%chat_id, error = %e, "Failed to deliver notification");
                outcome.delivery_failures += 1;
            },
        }
    }
}

fn missing_record(chat_id: ChatId) -> ApplicationError {
    ApplicationError::Internal(format!("user record {chat_id} disappeared during tick"))
}
