//! Weather adapter - Implements WeatherPort using integration_weather

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{
    CurrentConditions, ForecastEntry, PollutantConcentrations, ResolvedPlace, WeatherPort,
};
use async_trait::async_trait;
use domain::value_objects::{GeoLocation, Pollutant, WeatherCategory};
use integration_weather::{
    AirPollution, CurrentWeather, ForecastStep, OpenWeatherMapClient, WeatherClient,
    WeatherConfig, WeatherError,
};
use tracing::{debug, instrument};

/// Adapter for weather services using the OpenWeatherMap API
pub struct WeatherAdapter {
    client: Arc<dyn WeatherClient>,
}

impl std::fmt::Debug for WeatherAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherAdapter")
            .field("client", &"OpenWeatherMapClient")
            .finish()
    }
}

impl WeatherAdapter {
    /// Create with custom configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn with_config(config: WeatherConfig) -> Result<Self, ApplicationError> {
        let client = OpenWeatherMapClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(client: Arc<dyn WeatherClient>) -> Self {
        Self { client }
    }

    /// Convert integration errors to application errors
    fn map_error(err: WeatherError) -> ApplicationError {
        match err {
            WeatherError::NotFound(query) => ApplicationError::LocationNotFound(query),
            WeatherError::ParseError(e) => ApplicationError::MalformedPayload(e),
            WeatherError::InvalidCoordinates => {
                ApplicationError::InvalidInput("Invalid coordinates".into())
            },
            WeatherError::ConnectionFailed(e) => ApplicationError::Configuration(e),
            e @ (WeatherError::RequestFailed(_)
            | WeatherError::ServiceUnavailable(_)
            | WeatherError::RateLimitExceeded
            | WeatherError::Unauthorized) => ApplicationError::ProviderUnavailable(e.to_string()),
        }
    }

    fn location(latitude: f64, longitude: f64) -> Result<GeoLocation, ApplicationError> {
        GeoLocation::new(latitude, longitude)
            .map_err(|e| ApplicationError::MalformedPayload(e.to_string()))
    }

    fn map_current(current: CurrentWeather) -> Result<CurrentConditions, ApplicationError> {
        let location = Self::location(current.latitude, current.longitude)?;
        let place_name = if current.name.is_empty() {
            location.to_string()
        } else {
            current.name
        };

        Ok(CurrentConditions {
            place_name,
            location,
            category: WeatherCategory::from_family(&current.family),
            description: current.description,
            temperature: current.temperature,
            feels_like: current.feels_like,
            humidity: current.humidity,
            pressure: current.pressure,
            wind_speed: current.wind_speed,
            cloudiness: current.cloudiness,
            sunrise: current.sunrise,
            sunset: current.sunset,
            timezone_offset: current.timezone_offset,
        })
    }

    fn map_step(step: ForecastStep) -> ForecastEntry {
        ForecastEntry {
            timestamp: step.time,
            category: WeatherCategory::from_family(&step.family),
            description: step.description,
            temperature: step.temperature,
            humidity: step.humidity,
            wind_speed: step.wind_speed,
        }
    }

    /// Concentrations the provider reported, in reporting order
    ///
    /// CO is already in µg/m³ and is graded without conversion.
    fn map_air(air: &AirPollution) -> PollutantConcentrations {
        [
            (Pollutant::So2, air.so2),
            (Pollutant::No2, air.no2),
            (Pollutant::Pm10, air.pm10),
            (Pollutant::Pm2_5, air.pm2_5),
            (Pollutant::O3, air.o3),
            (Pollutant::Co, air.co),
        ]
        .into_iter()
        .filter_map(|(pollutant, value)| value.map(|v| (pollutant, v)))
        .collect()
    }
}

#[async_trait]
impl WeatherPort for WeatherAdapter {
    #[instrument(skip(self))]
    async fn resolve_city(&self, name: &str) -> Result<ResolvedPlace, ApplicationError> {
        let place = self.client.geocode(name).await.map_err(Self::map_error)?;
        debug!(place = %place.name, "Resolved city");

        Ok(ResolvedPlace {
            location: Self::location(place.latitude, place.longitude)?,
            name: place.name,
            country: place.country,
        })
    }

    #[instrument(skip(self), fields(location = %location))]
    async fn current_conditions(
        &self,
        location: &GeoLocation,
    ) -> Result<CurrentConditions, ApplicationError> {
        let current = self
            .client
            .get_current(location.latitude(), location.longitude())
            .await
            .map_err(Self::map_error)?;
        Self::map_current(current)
    }

    #[instrument(skip(self), fields(location = %location))]
    async fn forecast(
        &self,
        location: &GeoLocation,
    ) -> Result<Vec<ForecastEntry>, ApplicationError> {
        let steps = self
            .client
            .get_forecast(location.latitude(), location.longitude())
            .await
            .map_err(Self::map_error)?;
        debug!(steps = steps.len(), "Fetched forecast");
        Ok(steps.into_iter().map(Self::map_step).collect())
    }

    #[instrument(skip(self), fields(location = %location))]
    async fn air_pollution(
        &self,
        location: &GeoLocation,
    ) -> Result<PollutantConcentrations, ApplicationError> {
        let air = self
            .client
            .get_air_pollution(location.latitude(), location.longitude())
            .await
            .map_err(Self::map_error)?;
        Ok(Self::map_air(&air))
    }
}
