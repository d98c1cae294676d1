//! Core library for the `weather-mcp` server.
//!
//! This crate defines:
//! - Input validation for the `get_alerts` / `get_forecast` operations
//! - The National Weather Service gateway (behind [`WeatherProvider`])
//! - Text formatting of alerts and forecast periods
//! - The failure taxonomy surfaced to callers
//! - The [`Dispatcher`] that ties them together per request
//!
//! It is used by `weather-server`, but can also be embedded behind any other transport.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod model;
pub mod protocol;
pub mod provider;
pub mod validate;

pub use config::{Config, GatewayConfig};
pub use dispatch::{Dispatcher, Reply};
pub use error::{ErrorKind, FieldViolation, Result, WeatherError};
pub use model::{AlertFeature, Coordinate, ForecastPeriod, Operation, Request, StateCode, ToolName, WeatherAlert};
pub use protocol::ResourceContents;
pub use provider::{WeatherProvider, nws::NwsProvider, provider_from_config};
