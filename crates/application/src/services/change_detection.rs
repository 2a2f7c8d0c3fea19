//! Change-detection policy for push notifications
//!
//! Pure functions deciding whether a temperature swing or upcoming rain is
//! worth telling the user about.

use chrono::{DateTime, TimeDelta, Utc};

use crate::ports::ForecastEntry;

/// Minimum absolute temperature change (°C) that triggers an update
pub const TEMPERATURE_ALERT_DELTA: f64 = 2.0;

/// How far ahead the forecast is scanned for rain, in hours
pub const RAIN_HORIZON_HOURS: i64 = 24;

/// Whether a temperature update is due
///
/// Always true for the first observation.
#[must_use]
pub fn should_alert_temperature(previous: Option<f64>, current: f64) -> bool {
    previous.is_none_or(|previous| (current - previous).abs() >= TEMPERATURE_ALERT_DELTA)
}

/// Whether rain is expected within [`RAIN_HORIZON_HOURS`] of `now`
///
/// Entries are scanned in the given order. The scan stops at the first entry
/// past the horizon, so out-of-order entries after it are ignored.
#[must_use]
pub fn rain_expected(entries: &[ForecastEntry], now: DateTime<Utc>) -> bool {
    let horizon = now + TimeDelta::hours(RAIN_HORIZON_HOURS);
    for entry in entries {
        if entry.timestamp > horizon {
            return false;
        }
        if entry.category.is_rain_family() {
            return true;
        }
    }
    false
}
