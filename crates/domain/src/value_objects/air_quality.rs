//! Air quality grading
//!
//! Grades pollutant concentrations (µg/m³) on a five step scale and derives
//! an overall level from the worst pollutant.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::{AirQualityLevel, AirQualityReport, Pollutant};
//!
//! let report = AirQualityReport::analyze(&[(Pollutant::Pm2_5, 30.0), (Pollutant::No2, 12.0)])
//!     .expect("readings present");
//! assert_eq!(report.overall(), AirQualityLevel::Moderate);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pollutants graded by the air quality table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    /// Sulphur dioxide
    So2,
    /// Nitrogen dioxide
    No2,
    /// Coarse particulate matter
    Pm10,
    /// Fine particulate matter
    Pm2_5,
    /// Ozone
    O3,
    /// Carbon monoxide
    Co,
}

impl Pollutant {
    /// All graded pollutants in reporting order
    pub const ALL: [Self; 6] = [
        Self::So2,
        Self::No2,
        Self::Pm10,
        Self::Pm2_5,
        Self::O3,
        Self::Co,
    ];

    /// Display label with subscripts
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::So2 => "SO₂",
            Self::No2 => "NO₂",
            Self::Pm10 => "PM₁₀",
            Self::Pm2_5 => "PM₂.₅",
            Self::O3 => "O₃",
            Self::Co => "CO",
        }
    }

    /// Exclusive upper bounds for Good, Fair, Moderate and Poor
    ///
    /// Anything at or above the last bound is Very Poor.
    #[must_use]
    pub const fn upper_bounds(self) -> [f64; 4] {
        match self {
            Self::So2 => [20.0, 80.0, 250.0, 350.0],
            Self::No2 => [40.0, 70.0, 150.0, 200.0],
            Self::Pm10 => [20.0, 50.0, 100.0, 200.0],
            Self::Pm2_5 => [10.0, 25.0, 50.0, 75.0],
            Self::O3 => [60.0, 100.0, 140.0, 180.0],
            Self::Co => [4400.0, 9400.0, 12400.0, 15400.0],
        }
    }

    /// Grade a concentration of this pollutant
    #[must_use]
    pub fn grade(self, concentration: f64) -> AirQualityLevel {
        let bounds = self.upper_bounds();
        let levels = [
            AirQualityLevel::Good,
            AirQualityLevel::Fair,
            AirQualityLevel::Moderate,
            AirQualityLevel::Poor,
        ];
        bounds
            .iter()
            .zip(levels)
            .find(|(bound, _)| concentration < **bound)
            .map_or(AirQualityLevel::VeryPoor, |(_, level)| level)
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Five step air quality scale, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityLevel {
    /// Index 1
    Good,
    /// Index 2
    Fair,
    /// Index 3
    Moderate,
    /// Index 4
    Poor,
    /// Index 5
    VeryPoor,
}

impl AirQualityLevel {
    /// Numeric index (1 = Good, 5 = Very Poor)
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Good => 1,
            Self::Fair => 2,
            Self::Moderate => 3,
            Self::Poor => 4,
            Self::VeryPoor => 5,
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

impl fmt::Display for AirQualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A graded concentration of a single pollutant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    /// Which pollutant
    pub pollutant: Pollutant,
    /// Concentration in µg/m³
    pub concentration: f64,
    /// Grade of this concentration
    pub level: AirQualityLevel,
}

/// Graded air quality snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReport {
    readings: Vec<PollutantReading>,
    overall: AirQualityLevel,
}

impl AirQualityReport {
    /// Grade each concentration and take the worst as overall level
    ///
    /// Returns `None` when there are no readings to grade.
    #[must_use]
    pub fn analyze(concentrations: &[(Pollutant, f64)]) -> Option<Self> {
        let readings: Vec<PollutantReading> = concentrations
            .iter()
            .map(|&(pollutant, concentration)| PollutantReading {
                pollutant,
                concentration,
                level: pollutant.grade(concentration),
            })
            .collect();

        let overall = readings.iter().map(|r| r.level).max()?;
        Some(Self { readings, overall })
    }

    /// Worst pollutant grade
    #[must_use]
    pub const fn overall(&self) -> AirQualityLevel {
        self.overall
    }

    /// Readings in input order
    #[must_use]
    pub fn readings(&self) -> &[PollutantReading] {
        &self.readings
    }

    /// Readings sorted from worst to best grade
    #[must_use]
    pub fn worst_first(&self) -> Vec<PollutantReading> {
        let mut sorted = self.readings.clone();
        sorted.sort_by(|a, b| b.level.cmp(&a.level));
        sorted
    }

    /// Readings at or above the given level
    pub fn at_least(&self, level: AirQualityLevel) -> impl Iterator<Item = &PollutantReading> {
        self.readings.iter().filter(move |r| r.level >= level)
    }
}
