//! Value Objects - Immutable, identity-less domain primitives

mod air_quality;
mod chat_id;
mod geo_location;
mod weather_category;

pub use air_quality::{AirQualityLevel, AirQualityReport, Pollutant, PollutantReading};
pub use chat_id::ChatId;
pub use geo_location::GeoLocation;
pub use weather_category::WeatherCategory;
