//! Per-user record
//!
//! Holds a chat's saved location, notification opt-in and the state the
//! notification loop uses to suppress duplicate alerts.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChatId, GeoLocation};

/// Rain alert state for the current rain episode
///
/// `Quiet` until a rain alert is sent, then `Alerted` until a tick sees
/// no rain in the forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainAlertState {
    /// No alert sent for the current episode
    #[default]
    Quiet,
    /// An alert was already sent for the current episode
    Alerted,
}

impl RainAlertState {
    /// Apply one tick's rain expectation
    ///
    /// Returns the next state and whether an alert must be emitted.
    #[must_use]
    pub const fn transition(self, rain_expected: bool) -> (Self, bool) {
        match (self, rain_expected) {
            (Self::Quiet, true) => (Self::Alerted, true),
            (Self::Alerted, true) => (Self::Alerted, false),
            (_, false) => (Self::Quiet, false),
        }
    }
}

/// One user of the bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    chat_id: ChatId,
    location: Option<GeoLocation>,
    city: Option<String>,
    notify_enabled: bool,
    last_observed_temperature: Option<f64>,
    rain_alert: RainAlertState,
}

impl UserRecord {
    /// Create a record with default fields
    #[must_use]
    pub const fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            location: None,
            city: None,
            notify_enabled: false,
            last_observed_temperature: None,
            rain_alert: RainAlertState::Quiet,
        }
    }

    /// Restore the persisted part of a record
    ///
    /// Observed state starts fresh.
    #[must_use]
    pub fn restore(
        chat_id: ChatId,
        location: Option<GeoLocation>,
        city: Option<String>,
        notify_enabled: bool,
    ) -> Self {
        Self {
            location,
            city,
            notify_enabled,
            ..Self::new(chat_id)
        }
    }

    #[must_use]
    pub const fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    #[must_use]
    pub const fn location(&self) -> Option<GeoLocation> {
        self.location
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    #[must_use]
    pub const fn notify_enabled(&self) -> bool {
        self.notify_enabled
    }

    #[must_use]
    pub const fn last_observed_temperature(&self) -> Option<f64> {
        self.last_observed_temperature
    }

    #[must_use]
    pub const fn rain_alert(&self) -> RainAlertState {
        self.rain_alert
    }

    /// Whether a rain alert was already sent for the current episode
    #[must_use]
    pub const fn rain_alerted(&self) -> bool {
        matches!(self.rain_alert, RainAlertState::Alerted)
    }

    /// Location to watch if the user is subscribed, `None` otherwise
    #[must_use]
    pub const fn watched_location(&self) -> Option<GeoLocation> {
        if self.notify_enabled {
            self.location
        } else {
            None
        }
    }

    /// Save a shared geolocation, forgetting any previously resolved city
    pub fn set_location(&mut self, location: GeoLocation) {
        self.location = Some(location);
        self.city = None;
    }

    /// Save a location resolved from a city name
    pub fn set_city_location(&mut self, city: impl Into<String>, location: GeoLocation) {
        self.location = Some(location);
        self.city = Some(city.into());
    }

    pub fn set_notify_enabled(&mut self, enabled: bool) {
        self.notify_enabled = enabled;
    }

    /// Record a temperature reading, returning the previous one
    pub fn record_temperature(&mut self, temperature: f64) -> Option<f64> {
        self.last_observed_temperature.replace(temperature)
    }

    /// Apply a tick's rain expectation, returning whether to alert
    pub fn record_rain_expectation(&mut self, rain_expected: bool) -> bool {
        let (next, emit) = self.rain_alert.transition(rain_expected);
        self.rain_alert = next;
        emit
    }
}
