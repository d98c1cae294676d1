use std::fmt;

use thiserror::Error;

use crate::model::ToolName;

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

/// Stable category tag for every failure the core can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownOperation,
    UnsupportedResource,
    ValidationFailure,
    LocationNotSupported,
    UpstreamError,
    TransportFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownOperation => "unknown-operation",
            ErrorKind::UnsupportedResource => "unsupported-resource",
            ErrorKind::ValidationFailure => "validation-failure",
            ErrorKind::LocationNotSupported => "location-not-supported",
            ErrorKind::UpstreamError => "upstream-error",
            ErrorKind::TransportFailure => "transport-failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self { field, reason: reason.into() }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Unknown tool: {name}")]
    UnknownOperation { name: String },

    #[error("Unsupported URI: {uri}")]
    UnsupportedResource { uri: String },

    #[error("Invalid parameters: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("Location not found or not supported")]
    LocationNotSupported,

    #[error("API error: {}", upstream_message(.status, .detail))]
    Upstream { status: Option<u16>, detail: String },

    #[error("Request failed: {cause}")]
    Transport { cause: String },
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            WeatherError::UnsupportedResource { .. } => ErrorKind::UnsupportedResource,
            WeatherError::Validation(_) => ErrorKind::ValidationFailure,
            WeatherError::LocationNotSupported => ErrorKind::LocationNotSupported,
            WeatherError::Upstream { .. } => ErrorKind::UpstreamError,
            WeatherError::Transport { .. } => ErrorKind::TransportFailure,
        }
    }

    pub fn upstream(status: Option<u16>, detail: impl Into<String>) -> Self {
        WeatherError::Upstream { status, detail: detail.into() }
    }

    /// A 2xx response whose body does not have the expected shape.
    pub fn malformed(detail: impl Into<String>) -> Self {
        WeatherError::Upstream {
            status: None,
            detail: format!("malformed response: {}", detail.into()),
        }
    }

    pub fn transport(cause: impl Into<String>) -> Self {
        WeatherError::Transport { cause: cause.into() }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            WeatherError::Validation(v) => v,
            _ => &[],
        }
    }

    /// Text shown to the calling agent when a tool invocation fails.
    ///
    /// Input problems are reported as-is; lookup failures are prefixed with
    /// the operation that was attempted so the agent knows what went wrong.
    pub fn user_message(&self, tool: Option<ToolName>) -> String {
        match (self, tool) {
            (WeatherError::Validation(_), _)
            | (WeatherError::UnknownOperation { .. }, _)
            | (WeatherError::UnsupportedResource { .. }, _)
            | (_, None) => self.to_string(),
            (_, Some(ToolName::GetAlerts)) => format!("Error fetching alerts: {self}"),
            (_, Some(ToolName::GetForecast)) => format!("Error fetching forecast: {self}"),
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn upstream_message(status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {detail}"),
        None => detail.to_string(),
    }
}
