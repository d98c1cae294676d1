//! National Weather Service (api.weather.gov) gateway.
//!
//! Alerts are a single fetch. A forecast takes two sequential fetches: the
//! point lookup resolves a coordinate to a gridpoint forecast URL, which is
//! then fetched for its periods.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    Client, StatusCode, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::{ACCEPT_GEO_JSON, GatewayConfig},
    error::{Result, WeatherError},
    model::{AlertFeature, Coordinate, ForecastPeriod, StateCode},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct NwsProvider {
    base_url: Url,
    timeout: Duration,
    http: Client,
}

impl NwsProvider {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid upstream base URL: {}", config.base_url))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GEO_JSON));

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, timeout: config.timeout, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// One GET. Only network-level problems are errors here; the caller decides what a status means.
    async fn fetch(&self, url: &str) -> Result<(StatusCode, String)> {
        debug!(%url, "GET");

        let res = self.http.get(url).send().await.map_err(|e| self.transport_error(&e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| self.transport_error(&e))?;

        debug!(%url, %status, bytes = body.len(), "upstream responded");
        Ok((status, body))
    }

    fn transport_error(&self, err: &reqwest::Error) -> WeatherError {
        if err.is_timeout() {
            WeatherError::transport(format!("request timed out after {:?}", self.timeout))
        } else if err.is_connect() {
            WeatherError::transport(format!("could not connect to upstream: {err}"))
        } else {
            WeatherError::transport(err.to_string())
        }
    }

    async fn resolve_point(&self, at: Coordinate) -> Result<Url> {
        let url = self.endpoint(&format!("/points/{at}"));
        let (status, body) = self.fetch(&url).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::LocationNotSupported);
        }
        ensure_success(status, &body)?;

        let point: PointResponse = parse(&body, "point")?;
        let forecast = point
            .properties
            .and_then(|p| p.forecast)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| WeatherError::malformed("point response has no `properties.forecast`"))?;

        // Normally absolute. A relative link keeps the configured base, path prefix included.
        let link = if forecast.contains("://") {
            forecast
        } else {
            self.endpoint(&format!("/{}", forecast.trim_start_matches('/')))
        };

        Url::parse(&link).map_err(|e| WeatherError::malformed(format!("invalid forecast URL {link:?}: {e}")))
    }
}

#[async_trait]
impl WeatherProvider for NwsProvider {
    async fn active_alerts(&self, state: &StateCode) -> Result<Vec<AlertFeature>> {
        let url = self.endpoint(&format!("/alerts/active/area/{state}"));
        let (status, body) = self.fetch(&url).await?;

        if status == StatusCode::NOT_FOUND {
            debug!(%state, "no alerts resource for state");
            return Ok(Vec::new());
        }

        if !status.is_success() {
            return Err(WeatherError::transport(format!(
                "alerts request failed with status {}: {}",
                status,
                problem_detail(&body, status),
            )));
        }

        let parsed: AlertsResponse = parse(&body, "alerts")?;
        parsed
            .features
            .into_iter()
            .map(|raw| AlertFeature::from_raw(raw).map_err(|e| WeatherError::malformed(format!("alerts response: {e}"))))
            .collect()
    }

    async fn forecast(&self, at: Coordinate) -> Result<Vec<ForecastPeriod>> {
        let forecast_url = self.resolve_point(at).await?;

        let (status, body) = self.fetch(forecast_url.as_str()).await?;
        ensure_success(status, &body)?;

        let parsed: ForecastResponse = parse(&body, "forecast")?;
        parsed
            .properties
            .map(|p| p.periods)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.into_period(index))
            .collect()
    }
}

fn ensure_success(status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(WeatherError::upstream(Some(status.as_u16()), problem_detail(body, status)))
    }
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| WeatherError::malformed(format!("{what} response: {e}")))
}

/// NWS errors are `application/problem+json`; prefer its `detail`, then `title`.
fn problem_detail(body: &str, status: StatusCode) -> String {
    let problem = serde_json::from_str::<Problem>(body).ok();

    problem
        .and_then(|p| p.detail.or(p.message).or(p.title))
        .filter(|d| !d.trim().is_empty())
        .or_else(|| (!body.trim().is_empty()).then(|| truncate_body(body.trim())))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no detail").to_string())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct Problem {
    title: Option<String>,
    detail: Option<String>,
    message: Option<String>,
}

/// Features stay untyped so they can be handed on exactly as received.
#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    features: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: Option<PointProperties>,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: Option<ForecastProperties>,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<RawPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPeriod {
    name: Option<String>,
    temperature: Option<f64>,
    temperature_unit: Option<String>,
    wind_speed: Option<String>,
    wind_direction: Option<String>,
    detailed_forecast: Option<String>,
}

impl RawPeriod {
    fn into_period(self, index: usize) -> Result<ForecastPeriod> {
        let missing =
            |field: &str| WeatherError::malformed(format!("forecast period {index} is missing `{field}`"));

        Ok(ForecastPeriod {
            name: self.name.ok_or_else(|| missing("name"))?,
            temperature: self.temperature.ok_or_else(|| missing("temperature"))?,
            temperature_unit: self.temperature_unit.ok_or_else(|| missing("temperatureUnit"))?,
            wind_speed: self.wind_speed.ok_or_else(|| missing("windSpeed"))?,
            wind_direction: self.wind_direction.ok_or_else(|| missing("windDirection"))?,
            detailed_forecast: self.detailed_forecast.ok_or_else(|| missing("detailedForecast"))?,
        })
    }
}
