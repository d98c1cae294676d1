use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// An active alert as published by the upstream provider.
///
/// Every field is optional: the provider omits (or nulls) whatever it does not know.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    pub event: Option<String>,
    #[serde(rename = "areaDesc")]
    pub area_description: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
}

/// One entry of the upstream alert feed: the parsed alert plus the feature exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertFeature {
    pub alert: WeatherAlert,
    pub raw: serde_json::Value,
}

impl AlertFeature {
    /// Parse the alert out of a GeoJSON feature; absent or null `properties` read as an empty alert.
    pub fn from_raw(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let alert = match raw.get("properties") {
            None | Some(serde_json::Value::Null) => WeatherAlert::default(),
            Some(properties) => WeatherAlert::deserialize(properties)?,
        };
        Ok(Self { alert, raw })
    }
}

/// One named period ("Tonight", "Tuesday", ...) of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub name: String,
    pub temperature: f64,
    pub temperature_unit: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub detailed_forecast: String,
}

/// Two-character US state code, always uppercase.
///
/// Only constructed through [`crate::validate`], so a value of this type is
/// already fit to be placed in an upstream URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateCode(String);

impl StateCode {
    pub(crate) fn from_validated(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point on the globe with latitude in [-90, 90] and longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub(crate) fn from_validated(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Names of the invocable tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetAlerts,
    GetForecast,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetAlerts => "get_alerts",
            ToolName::GetForecast => "get_forecast",
        }
    }

    pub const fn all() -> &'static [ToolName] {
        &[ToolName::GetAlerts, ToolName::GetForecast]
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ToolName {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "get_alerts" => Ok(ToolName::GetAlerts),
            "get_forecast" => Ok(ToolName::GetForecast),
            _ => Err(WeatherError::UnknownOperation { name: value.to_string() }),
        }
    }
}

/// An inbound request as handed over by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ResourceRead { uri: String },
    ToolInvocation { name: String, arguments: serde_json::Map<String, serde_json::Value> },
}

impl Request {
    pub fn read(uri: impl Into<String>) -> Self {
        Request::ResourceRead { uri: uri.into() }
    }

    pub fn invoke(name: impl Into<String>, arguments: serde_json::Map<String, serde_json::Value>) -> Self {
        Request::ToolInvocation { name: name.into(), arguments }
    }
}

/// A validated operation, ready for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    GetAlerts(StateCode),
    GetForecast(Coordinate),
}
