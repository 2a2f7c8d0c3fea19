//! Weather report formatting
//!
//! Renders provider payloads into the chat messages users see.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use domain::value_objects::{AirQualityLevel, AirQualityReport};

use crate::ports::{CurrentConditions, ForecastEntry};

/// Maximum number of days shown in the forecast overview
pub const FORECAST_DAYS: usize = 5;

/// Sent once per rain episode
pub const RAIN_WARNING: &str =
    "☔ Rain is expected within the next 24 hours. Don't forget an umbrella!";

/// Current conditions report
pub fn current_report(conditions: &CurrentConditions) -> String {
    let offset = local_offset(conditions.timezone_offset);
    let mut out = String::new();
    let _ = writeln!(out, "🏙 {}", conditions.place_name);
    let _ = writeln!(
        out,
        "{} {}",
        conditions.category.emoji(),
        conditions.description
    );
    let _ = writeln!(
        out,
        "🌡 Temperature: {:.1}°C (feels like {:.1}°C)",
        conditions.temperature, conditions.feels_like
    );
    let _ = writeln!(out, "💧 Humidity: {}%", conditions.humidity);
    let _ = writeln!(out, "🌬 Wind: {:.1} m/s", conditions.wind_speed);
    if let Some(clouds) = conditions.cloudiness {
        let _ = writeln!(out, "☁️ Cloudiness: {clouds}%");
    }
    let _ = writeln!(out, "🔽 Pressure: {} hPa", conditions.pressure);
    let _ = write!(
        out,
        "🌅 Sunrise: {}  🌇 Sunset: {}",
        clock(conditions.sunrise, offset),
        clock(conditions.sunset, offset)
    );
    out
}

/// Current report followed by the air quality analysis
pub fn extended_report(conditions: &CurrentConditions, air: Option<&AirQualityReport>) -> String {
    let mut out = current_report(conditions);
    out.push_str("\n\n");
    out.push_str(&air_quality_summary(air));
    out
}

/// Air quality block, worst pollutants first
pub fn air_quality_summary(air: Option<&AirQualityReport>) -> String {
    let Some(report) = air else {
        return "🧪 Air quality: no data".to_string();
    };
    let mut out = format!(
        "🧪 Air quality: {} (index {})",
        report.overall(),
        report.overall().index()
    );
    for reading in report.worst_first() {
        let _ = write!(
            out,
            "\n  {} {:.1} µg/m³ - {}",
            reading.pollutant, reading.concentration, reading.level
        );
    }
    if report.at_least(AirQualityLevel::Poor).next().is_some() {
        out.push_str("\n⚠️ Consider limiting time outdoors.");
    }
    out
}

/// Group forecast entries by UTC calendar day, keeping entry order
pub fn group_by_day(entries: &[ForecastEntry]) -> BTreeMap<NaiveDate, Vec<&ForecastEntry>> {
    let mut days: BTreeMap<NaiveDate, Vec<&ForecastEntry>> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.timestamp.date_naive())
            .or_default()
            .push(entry);
    }
    days
}

/// One-line summary of a day: temperature range and first description
pub fn day_summary(entries: &[&ForecastEntry]) -> String {
    let description = entries
        .first()
        .map_or("", |entry| entry.description.as_str());
    let min = entries.iter().map(|e| e.temperature).reduce(f64::min);
    let max = entries.iter().map(|e| e.temperature).reduce(f64::max);
    match (min, max) {
        (Some(min), Some(max)) => format!("{min:.0}…{max:.0}°C, {description}"),
        _ => description.to_string(),
    }
}

/// Overview of the next few days
pub fn forecast_overview(entries: &[ForecastEntry]) -> String {
    let days = group_by_day(entries);
    if days.is_empty() {
        return "No forecast data available.".to_string();
    }
    let mut out = String::from("🗓 Forecast:");
    for (day, day_entries) in days.iter().take(FORECAST_DAYS) {
        let _ = write!(
            out,
            "\n• {}: {}",
            day.format("%a %d.%m"),
            day_summary(day_entries)
        );
    }
    out.push_str("\n\nPick a day below for 3-hour details.");
    out
}

/// 3-hour detail lines for one day
pub fn day_details(day: NaiveDate, entries: &[ForecastEntry]) -> String {
    let days = group_by_day(entries);
    let Some(day_entries) = days.get(&day) else {
        return format!("No forecast data for {}.", day.format("%Y-%m-%d"));
    };
    let mut out = format!("📅 {}", day.format("%A %d.%m"));
    for entry in day_entries {
        let _ = write!(
            out,
            "\n{}  {} {}  {:.1}°C  💧{}%  🌬{:.1} m/s",
            entry.timestamp.format("%H:%M"),
            entry.category.emoji(),
            entry.description,
            entry.temperature,
            entry.humidity,
            entry.wind_speed
        );
    }
    out
}

/// Fixed-width comparison table; missing data renders as dashes
pub fn comparison_table(rows: &[(String, Option<CurrentConditions>)]) -> String {
    let mut out = format!("{:<16} {:>7} {:>6} {:>9}", "City", "Temp", "Hum", "Wind");
    for (name, conditions) in rows {
        let line = match conditions {
            Some(c) => format!(
                "{:<16} {:>5.1}°C {:>5}% {:>5.1} m/s",
                truncate(name, 16),
                c.temperature,
                c.humidity,
                c.wind_speed
            ),
            None => format!("{:<16} {:>7} {:>6} {:>9}", truncate(name, 16), "—", "—", "—"),
        };
        out.push('\n');
        out.push_str(&line);
    }
    out
}

/// Push notification for a temperature change
pub fn temperature_update(conditions: &CurrentConditions, previous: Option<f64>) -> String {
    match previous {
        Some(previous) => format!(
            "ℹ️ Weather update: now {:.1}°C (was {:.1}°C), {}",
            conditions.temperature, previous, conditions.description
        ),
        None => format!(
            "ℹ️ Weather update: now {:.1}°C, {}",
            conditions.temperature, conditions.description
        ),
    }
}

fn local_offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

fn clock(time: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    time.map_or_else(
        || "—".to_string(),
        |t| t.with_timezone(&offset).format("%H:%M").to_string(),
    )
}

fn truncate(name: &str, width: usize) -> String {
    name.chars().take(width).collect()
}
