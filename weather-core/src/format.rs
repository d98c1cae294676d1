//! Human-readable rendering of alerts and forecast periods.

use crate::model::{ForecastPeriod, WeatherAlert};

pub const SEPARATOR: &str = "\n\n---\n\n";

/// Periods past this many are dropped to bound the response size.
pub const MAX_FORECAST_PERIODS: usize = 5;

pub const NO_ALERTS: &str = "No active weather alerts found for this area.";
pub const NO_FORECAST: &str = "No forecast data available for this location.";

pub fn alerts(alerts: &[WeatherAlert]) -> String {
    if alerts.is_empty() {
        return NO_ALERTS.to_string();
    }

    alerts.iter().map(alert).collect::<Vec<_>>().join(SEPARATOR)
}

pub fn alert(alert: &WeatherAlert) -> String {
    format!(
        "Event: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}",
        or_fallback(&alert.event, "Unknown"),
        or_fallback(&alert.area_description, "Unknown"),
        or_fallback(&alert.severity, "Unknown"),
        or_fallback(&alert.description, "No description available"),
        or_fallback(&alert.instruction, "No specific instructions provided"),
    )
    .trim()
    .to_string()
}

pub fn forecast(periods: &[ForecastPeriod]) -> String {
    if periods.is_empty() {
        return NO_FORECAST.to_string();
    }

    periods
        .iter()
        .take(MAX_FORECAST_PERIODS)
        .map(period)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

pub fn period(period: &ForecastPeriod) -> String {
    format!(
        "{}:\nTemperature: {}°{}\nWind: {} {}\nForecast: {}",
        period.name,
        period.temperature,
        period.temperature_unit,
        period.wind_speed,
        period.wind_direction,
        period.detailed_forecast,
    )
    .trim()
    .to_string()
}

// Empty strings count as missing so a blank upstream field never leaks through.
fn or_fallback<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}
