//! OpenWeatherMap integration
//!
//! Client for the OpenWeatherMap APIs (<https://openweathermap.org/api>):
//! direct geocoding, current weather, the 5 day / 3 hour forecast and air
//! pollution. Every request needs an API key.

pub mod client;
mod models;

pub use client::{OpenWeatherMapClient, WeatherClient, WeatherConfig, WeatherError};
pub use models::{AirPollution, CurrentWeather, ForecastStep, Place};
