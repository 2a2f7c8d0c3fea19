//! OpenWeatherMap client
//!
//! HTTP client for the geocoding, weather, forecast and air pollution APIs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::{
    AirPollution, AirResponse, CurrentResponse, CurrentWeather, ForecastResponse, ForecastStep,
    GeoResponseItem, Place, WeatherDescriptor,
};

/// Weather client errors
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP client could not be built
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the weather service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse response from weather service
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid coordinates provided
    #[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,

    /// Service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// API key missing or rejected
    #[error("Unauthorized: check the API key")]
    Unauthorized,

    /// Geocoding returned no match
    #[error("Place not found: {0}")]
    NotFound(String),
}

/// Weather service configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    #[serde(default)]
    pub api_key: String,

    /// Data API base URL (default: <https://api.openweathermap.org/data/2.5>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Geocoding API base URL (default: <https://api.openweathermap.org/geo/1.0>)
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

const fn default_timeout() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            geo_base_url: default_geo_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("geo_base_url", &self.geo_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Weather client trait for fetching weather data
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Resolve a place name to coordinates
    async fn geocode(&self, query: &str) -> Result<Place, WeatherError>;

    /// Get current weather for a location
    async fn get_current(&self, latitude: f64, longitude: f64)
    -> Result<CurrentWeather, WeatherError>;

    /// Get the 5 day / 3 hour forecast for a location
    async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<ForecastStep>, WeatherError>;

    /// Get current air pollution for a location
    async fn get_air_pollution(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AirPollution, WeatherError>;
}

/// OpenWeatherMap HTTP client implementation
#[derive(Debug)]
pub struct OpenWeatherMapClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenWeatherMapClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Validate coordinates
    fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), WeatherError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidCoordinates);
        }
        Ok(())
    }

    fn coordinate_query(&self, latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("appid", self.config.api_key.clone()),
            ("units", "metric".to_string()),
        ]
    }

    /// GET `url` and decode the JSON body, mapping HTTP failures
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        debug!(url = %url, "Requesting OpenWeatherMap");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| WeatherError::RequestFailed(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(WeatherError::RateLimitExceeded);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(WeatherError::Unauthorized);
        }
        if status.is_server_error() {
            return Err(WeatherError::ServiceUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(WeatherError::RequestFailed(format!("HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::ParseError(e.without_url().to_string()))
    }

    fn parse_timestamp(seconds: i64) -> Result<DateTime<Utc>, WeatherError> {
        DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| WeatherError::ParseError(format!("Invalid timestamp: {seconds}")))
    }

    fn first_descriptor(
        weather: Vec<WeatherDescriptor>,
    ) -> Result<WeatherDescriptor, WeatherError> {
        weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::ParseError("No weather condition in response".to_string()))
    }

    fn parse_current(response: CurrentResponse) -> Result<CurrentWeather, WeatherError> {
        let descriptor = Self::first_descriptor(response.weather)?;
        let sunrise = response.sys.sunrise.map(Self::parse_timestamp).transpose()?;
        let sunset = response.sys.sunset.map(Self::parse_timestamp).transpose()?;

        Ok(CurrentWeather {
            name: response.name,
            latitude: response.coord.lat,
            longitude: response.coord.lon,
            family: descriptor.main,
            description: descriptor.description,
            temperature: response.main.temp,
            feels_like: response.main.feels_like,
            humidity: response.main.humidity,
            pressure: response.main.pressure,
            wind_speed: response.wind.speed,
            cloudiness: response.clouds.map(|c| c.all),
            sunrise,
            sunset,
            observed_at: Self::parse_timestamp(response.dt)?,
            timezone_offset: response.timezone,
        })
    }

    fn parse_forecast(response: ForecastResponse) -> Result<Vec<ForecastStep>, WeatherError> {
        response
            .list
            .into_iter()
            .map(|item| {
                let descriptor = Self::first_descriptor(item.weather)?;
                Ok(ForecastStep {
                    time: Self::parse_timestamp(item.dt)?,
                    family: descriptor.main,
                    description: descriptor.description,
                    temperature: item.main.temp,
                    humidity: item.main.humidity,
                    wind_speed: item.wind.speed,
                })
            })
            .collect()
    }

    fn parse_air(response: AirResponse) -> Result<AirPollution, WeatherError> {
        let item = response.list.into_iter().next().ok_or_else(|| {
            WeatherError::ParseError("No air pollution data in response".to_string())
        })?;

        Ok(AirPollution {
            aqi: item.main.aqi,
            so2: item.components.so2,
            no2: item.components.no2,
            pm10: item.components.pm10,
            pm2_5: item.components.pm2_5,
            o3: item.components.o3,
            co: item.components.co,
            measured_at: Self::parse_timestamp(item.dt)?,
        })
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherMapClient {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Place, WeatherError> {
        let url = format!("{}/direct", self.config.geo_base_url);
        let params = [
            ("q", query.to_string()),
            ("limit", "1".to_string()),
            ("appid", self.config.api_key.clone()),
        ];

        let places: Vec<GeoResponseItem> = self.get_json(&url, &params).await?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(query.to_string()))?;

        Ok(Place {
            name: place.name,
            country: place.country,
            latitude: place.lat,
            longitude: place.lon,
        })
    }

    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn get_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentWeather, WeatherError> {
        Self::validate_coordinates(latitude, longitude)?;

        let url = format!("{}/weather", self.config.base_url);
        let response: CurrentResponse = self
            .get_json(&url, &self.coordinate_query(latitude, longitude))
            .await?;

        Self::parse_current(response)
    }

    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<ForecastStep>, WeatherError> {
        Self::validate_coordinates(latitude, longitude)?;

        let url = format!("{}/forecast", self.config.base_url);
        let response: ForecastResponse = self
            .get_json(&url, &self.coordinate_query(latitude, longitude))
            .await?;

        Self::parse_forecast(response)
    }

    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn get_air_pollution(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AirPollution, WeatherError> {
        Self::validate_coordinates(latitude, longitude)?;

        let url = format!("{}/air_pollution", self.config.base_url);
        let response: AirResponse = self
            .get_json(&url, &self.coordinate_query(latitude, longitude))
            .await?;

        Self::parse_air(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = WeatherConfig::default();
        assert_eq!(config.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(config.geo_base_url, "https://api.openweathermap.org/geo/1.0");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = WeatherConfig {
            api_key: "super-secret".to_string(),
            ..WeatherConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(OpenWeatherMapClient::validate_coordinates(0.0, 0.0).is_ok());
        assert!(OpenWeatherMapClient::validate_coordinates(90.0, 180.0).is_ok());
        assert!(OpenWeatherMapClient::validate_coordinates(-90.0, -180.0).is_ok());
        assert!(OpenWeatherMapClient::validate_coordinates(91.0, 0.0).is_err());
        assert!(OpenWeatherMapClient::validate_coordinates(0.0, -181.0).is_err());
    }

    #[test]
    fn test_parse_forecast_rejects_missing_condition() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"list": [{"dt": 1700000000, "main": {"temp": 1.0, "feels_like": 0.0, "pressure": 1000, "humidity": 50}, "weather": []}]}"#,
        )
        .unwrap();
        assert!(matches!(
            OpenWeatherMapClient::parse_forecast(response),
            Err(WeatherError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_air_requires_entry() {
        let response: AirResponse = serde_json::from_str(r#"{"list": []}"#).unwrap();
        assert!(OpenWeatherMapClient::parse_air(response).is_err());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(WeatherError::RateLimitExceeded.to_string(), "Rate limit exceeded");
        assert_eq!(
            WeatherError::NotFound("Atlantis".into()).to_string(),
            "Place not found: Atlantis"
        );
    }
}
