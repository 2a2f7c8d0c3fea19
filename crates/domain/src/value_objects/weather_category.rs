//! Coarse weather family reported by the provider

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse weather classification of an observation or forecast step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCategory {
    /// Clear sky
    Clear,
    /// Any cloud cover
    Clouds,
    /// Drizzle
    Drizzle,
    /// Rain, including showers and freezing rain
    Rain,
    /// Thunderstorm
    Thunderstorm,
    /// Snow and sleet
    Snow,
    /// Mist, fog, haze, dust and other atmospheric conditions
    Atmosphere,
    /// Anything the provider reports that we do not recognise
    Unknown,
}

impl WeatherCategory {
    /// Parse a provider family name such as `"Rain"` or `"clouds"`
    #[must_use]
    pub fn from_family(family: &str) -> Self {
        let family = family.trim().to_lowercase();
        match family.as_str() {
            "clear" => Self::Clear,
            "clouds" | "cloudy" => Self::Clouds,
            "drizzle" => Self::Drizzle,
            "thunderstorm" => Self::Thunderstorm,
            "snow" | "sleet" => Self::Snow,
            "mist" | "smoke" | "haze" | "dust" | "fog" | "sand" | "ash" | "squall"
            | "tornado" => Self::Atmosphere,
            other if other.contains("rain") => Self::Rain,
            _ => Self::Unknown,
        }
    }

    /// Whether this category means precipitation worth an umbrella
    #[must_use]
    pub const fn is_rain_family(self) -> bool {
        matches!(self, Self::Rain | Self::Drizzle | Self::Thunderstorm)
    }

    /// Get an emoji representation
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::Clouds => "☁️",
            Self::Drizzle | Self::Rain => "🌧️",
            Self::Thunderstorm => "⛈️",
            Self::Snow => "❄️",
            Self::Atmosphere => "🌫️",
            Self::Unknown => "❓",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clear => "clear",
            Self::Clouds => "clouds",
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::Thunderstorm => "thunderstorm",
            Self::Snow => "snow",
            Self::Atmosphere => "atmosphere",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
