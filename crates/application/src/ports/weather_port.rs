//! Weather service port
//!
//! Defines the interface for geocoding, current conditions, the 3-hour
//! forecast and air pollution readings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::value_objects::{GeoLocation, Pollutant, WeatherCategory};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// A place name resolved to coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    /// Display name as returned by the geocoder
    pub name: String,
    /// ISO country code, if known
    pub country: Option<String>,
    /// Coordinates of the place
    pub location: GeoLocation,
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Name of the nearest station or city
    pub place_name: String,
    /// Coordinates the provider reported for
    pub location: GeoLocation,
    /// Coarse weather family
    pub category: WeatherCategory,
    /// Human-readable description, e.g. "light rain"
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Feels-like temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity in percent (0-100)
    pub humidity: u8,
    /// Sea-level pressure in hPa
    pub pressure: u32,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Cloud cover in percent
    pub cloudiness: Option<u8>,
    /// Sunrise time (UTC)
    pub sunrise: Option<DateTime<Utc>>,
    /// Sunset time (UTC)
    pub sunset: Option<DateTime<Utc>>,
    /// Offset of the local timezone from UTC in seconds
    pub timezone_offset: i32,
}

/// One 3-hour step of the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Start of the step
    pub timestamp: DateTime<Utc>,
    /// Coarse weather family
    pub category: WeatherCategory,
    /// Human-readable description
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent (0-100)
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
}

/// Pollutant concentrations in µg/m³
pub type PollutantConcentrations = Vec<(Pollutant, f64)>;

/// Port for weather service operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherPort: Send + Sync {
    /// Resolve a place name to coordinates
    async fn resolve_city(&self, name: &str) -> Result<ResolvedPlace, ApplicationError>;

    /// Get current conditions for a location
    async fn current_conditions(
        &self,
        location: &GeoLocation,
    ) -> Result<CurrentConditions, ApplicationError>;

    /// Get the 3-hour step forecast, ascending by timestamp
    async fn forecast(&self, location: &GeoLocation)
    -> Result<Vec<ForecastEntry>, ApplicationError>;

    /// Get current pollutant concentrations
    async fn air_pollution(
        &self,
        location: &GeoLocation,
    ) -> Result<PollutantConcentrations, ApplicationError>;
}
