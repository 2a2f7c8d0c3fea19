//! OpenWeatherMap data models
//!
//! Raw API payloads are kept crate-private; the public types are the
//! flattened values handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Place name
    pub name: String,
    /// ISO 3166 country code
    pub country: Option<String>,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

/// Current weather at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Name of the nearest city or station
    pub name: String,
    /// Latitude the data is for
    pub latitude: f64,
    /// Longitude the data is for
    pub longitude: f64,
    /// Weather group, e.g. "Rain" or "Clouds"
    pub family: String,
    /// Condition description, e.g. "light rain"
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Feels-like temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Pressure in hPa
    pub pressure: u32,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Cloud cover in percent
    pub cloudiness: Option<u8>,
    /// Sunrise time
    pub sunrise: Option<DateTime<Utc>>,
    /// Sunset time
    pub sunset: Option<DateTime<Utc>>,
    /// Observation time
    pub observed_at: DateTime<Utc>,
    /// Shift in seconds from UTC
    pub timezone_offset: i32,
}

/// One 3-hour forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    /// Forecasted time
    pub time: DateTime<Utc>,
    /// Weather group
    pub family: String,
    /// Condition description
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
}

/// Air pollution components in µg/m³
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPollution {
    /// Provider's own 1-5 air quality index
    pub aqi: u8,
    pub so2: Option<f64>,
    pub no2: Option<f64>,
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
    pub o3: Option<f64>,
    pub co: Option<f64>,
    /// Measurement time
    pub measured_at: DateTime<Utc>,
}

// ----------------------------------------------------------------------------
// API payloads
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GeoResponseItem {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WeatherDescriptor {
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MainBlock {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: u32,
    pub humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Wind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Clouds {
    pub all: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Sys {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentResponse {
    pub coord: Coord,
    #[serde(default)]
    pub weather: Vec<WeatherDescriptor>,
    pub main: MainBlock,
    #[serde(default)]
    pub wind: Wind,
    pub clouds: Option<Clouds>,
    pub dt: i64,
    #[serde(default)]
    pub sys: Sys,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastItem {
    pub dt: i64,
    pub main: MainBlock,
    #[serde(default)]
    pub weather: Vec<WeatherDescriptor>,
    #[serde(default)]
    pub wind: Wind,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    pub list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AirIndex {
    pub aqi: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Components {
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AirItem {
    pub dt: i64,
    pub main: AirIndex,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AirResponse {
    pub list: Vec<AirItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_response_tolerates_missing_optional_blocks() {
        let json = r#"{
            "coord": {"lon": 37.62, "lat": 55.75},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": 4.2, "feels_like": 1.0, "pressure": 1001, "humidity": 93},
            "dt": 1700000000
        }"#;
        let parsed: CurrentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.weather[0].main, "Rain");
        assert!(parsed.clouds.is_none());
        assert!(parsed.sys.sunrise.is_none());
        assert!((parsed.wind.speed - 0.0).abs() < f64::EPSILON);
        assert_eq!(parsed.name, "");
    }

    #[test]
    fn air_components_ignore_unknown_fields() {
        let json = r#"{"list": [{"dt": 1700000000, "main": {"aqi": 2},
            "components": {"co": 201.94, "no": 0.01, "no2": 0.77, "o3": 68.66,
                           "so2": 0.64, "pm2_5": 0.5, "pm10": 0.54, "nh3": 0.12}}]}"#;
        let parsed: AirResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.list[0].main.aqi, 2);
        assert_eq!(parsed.list[0].components.pm2_5, Some(0.5));
    }
}
