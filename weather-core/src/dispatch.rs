//! Entry point for inbound requests.
//!
//! Routing happens before validation, validation before any upstream call,
//! and every failure leaves here as a [`WeatherError`] with a stable kind.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{Result, WeatherError},
    format,
    model::{Operation, Request, ToolName, WeatherAlert},
    protocol::{JSON_MIME, ResourceContents},
    provider::WeatherProvider,
    validate,
};

/// Successful payload, shaped for the kind of request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Resource(ResourceContents),
}

impl Reply {
    /// The text body, whatever the request kind.
    pub fn into_text(self) -> String {
        match self {
            Reply::Text(text) => text,
            Reply::Resource(contents) => contents.text,
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    provider: Box<dyn WeatherProvider>,
}

impl Dispatcher {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Single entry for every inbound request. Failures are logged here once, with their kind.
    pub async fn dispatch(&self, request: &Request) -> Result<Reply> {
        let (target, outcome) = match request {
            Request::ResourceRead { uri } => (uri.as_str(), self.read_resource(uri).await.map(Reply::Resource)),
            Request::ToolInvocation { name, arguments } => {
                (name.as_str(), self.invoke(name, arguments).await.map(Reply::Text))
            }
        };

        outcome.inspect_err(|e| log_failure(target, e))
    }

    async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> Result<String> {
        let tool = ToolName::try_from(name)?;
        let operation = validate::operation(tool, arguments)?;
        self.run(operation).await
    }

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents> {
        let raw_state = alerts_uri_state(uri)
            .ok_or_else(|| WeatherError::UnsupportedResource { uri: uri.to_string() })?;
        let state = validate::state_code(raw_state)?;

        let features = self.provider.active_alerts(&state).await?;
        let raw: Vec<Value> = features.into_iter().map(|f| f.raw).collect();
        let text = serde_json::to_string_pretty(&raw)
            .map_err(|e| WeatherError::upstream(None, format!("failed to encode alerts: {e}")))?;

        Ok(ResourceContents { uri: uri.to_string(), mime_type: JSON_MIME.to_string(), text })
    }

    async fn run(&self, operation: Operation) -> Result<String> {
        debug!(?operation, "running");

        match operation {
            Operation::GetAlerts(state) => {
                let features = self.provider.active_alerts(&state).await?;
                let alerts: Vec<WeatherAlert> = features.into_iter().map(|f| f.alert).collect();
                Ok(format::alerts(&alerts))
            }
            Operation::GetForecast(at) => {
                let periods = self.provider.forecast(at).await?;
                Ok(format::forecast(&periods))
            }
        }
    }
}

/// Extracts the state from `weather://<ST>/alerts` (scheme and path case-insensitive, letters only).
fn alerts_uri_state(uri: &str) -> Option<&str> {
    const SCHEME: &str = "weather://";
    const PATH: &str = "/alerts";

    if uri.len() != SCHEME.len() + 2 + PATH.len() || !uri.is_ascii() {
        return None;
    }

    let (scheme, rest) = uri.split_at(SCHEME.len());
    let (state, path) = rest.split_at(2);

    let matches = scheme.eq_ignore_ascii_case(SCHEME)
        && path.eq_ignore_ascii_case(PATH)
        && state.bytes().all(|b| b.is_ascii_alphabetic());

    matches.then_some(state)
}

fn log_failure(target: &str, err: &WeatherError) {
    warn!(target_name = %target, kind = %err.kind(), error = %err, "request failed");
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        error::ErrorKind,
        format::{NO_ALERTS, SEPARATOR},
        model::{AlertFeature, Coordinate, ForecastPeriod, StateCode},
    };

    #[derive(Debug, Default, Clone)]
    struct FakeProvider {
        alerts: Vec<AlertFeature>,
        periods: Vec<ForecastPeriod>,
        failure: Option<fn() -> WeatherError>,
        calls: Arc<AtomicUsize>,
        last_state: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn active_alerts(&self, state: &StateCode) -> Result<Vec<AlertFeature>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_state.lock().unwrap() = Some(state.to_string());
            match self.failure {
                Some(fail) => Err(fail()),
                None => Ok(self.alerts.clone()),
            }
        }

        async fn forecast(&self, _at: Coordinate) -> Result<Vec<ForecastPeriod>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.failure {
                Some(fail) => Err(fail()),
                None => Ok(self.periods.clone()),
            }
        }
    }

    fn dispatcher(fake: &FakeProvider) -> Dispatcher {
        Dispatcher::new(Box::new(fake.clone()))
    }

    fn invoke(name: &str, arguments: Value) -> Request {
        Request::invoke(name, arguments.as_object().cloned().unwrap_or_default())
    }

    fn period(name: &str) -> ForecastPeriod {
        ForecastPeriod {
            name: name.into(),
            temperature: 60.0,
            temperature_unit: "F".into(),
            wind_speed: "10 mph".into(),
            wind_direction: "N".into(),
            detailed_forecast: "Cloudy.".into(),
        }
    }

    #[tokio::test]
    async fn unknown_tool_never_reaches_provider() {
        let fake = FakeProvider::default();

        let err = dispatcher(&fake)
            .dispatch(&invoke("get_weather_xyz", json!({ "state": "CA" })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownOperation);
        assert_eq!(err.user_message(None), "Unknown tool: get_weather_xyz");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_forecast_input_makes_no_upstream_call() {
        let fake = FakeProvider::default();

        let err = dispatcher(&fake)
            .dispatch(&invoke("get_forecast", json!({ "latitude": 91, "longitude": 0 })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(err.violations()[0].field, "latitude");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_state_makes_no_upstream_call() {
        let fake = FakeProvider::default();

        let err = dispatcher(&fake)
            .dispatch(&invoke("get_alerts", json!({ "state": "CAL" })))
            .await
            .unwrap_err();

        assert!(err.user_message(Some(ToolName::GetAlerts)).starts_with("Invalid parameters: state:"));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn state_is_normalized_before_lookup() {
        let fake = FakeProvider::default();

        let reply = dispatcher(&fake).dispatch(&invoke("get_alerts", json!({ "state": "ca" }))).await.unwrap();

        assert_eq!(reply, Reply::Text(NO_ALERTS.to_string()));
        assert_eq!(fake.last_state.lock().unwrap().as_deref(), Some("CA"));
    }

    #[tokio::test]
    async fn alerts_are_formatted_in_order() {
        let fake = FakeProvider {
            alerts: vec![
                AlertFeature::from_raw(json!({ "properties": { "event": "Flood Watch" } })).unwrap(),
                AlertFeature::from_raw(json!({ "properties": { "event": "Heat Advisory" } })).unwrap(),
            ],
            ..FakeProvider::default()
        };

        let text = dispatcher(&fake)
            .dispatch(&invoke("get_alerts", json!({ "state": "MO" })))
            .await
            .unwrap()
            .into_text();

        let blocks: Vec<_> = text.split(SEPARATOR).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Event: Flood Watch"));
        assert!(blocks[1].starts_with("Event: Heat Advisory"));
    }

    #[tokio::test]
    async fn forecast_is_formatted_and_truncated() {
        let fake = FakeProvider {
            periods: (1..=7).map(|i| period(&format!("Day {i}"))).collect(),
            ..FakeProvider::default()
        };

        let reply = dispatcher(&fake)
            .dispatch(&invoke("get_forecast", json!({ "latitude": 47.6, "longitude": -122.3 })))
            .await
            .unwrap();

        let Reply::Text(text) = reply else { panic!("expected text reply") };
        assert_eq!(text.split(SEPARATOR).count(), 5);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upstream_failure_keeps_kind_and_detail() {
        let fake = FakeProvider {
            failure: Some(|| WeatherError::LocationNotSupported),
            ..FakeProvider::default()
        };

        let err = dispatcher(&fake)
            .dispatch(&invoke("get_forecast", json!({ "latitude": 10, "longitude": 10 })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LocationNotSupported);
        assert_eq!(
            err.user_message(Some(ToolName::GetForecast)),
            "Error fetching forecast: Location not found or not supported"
        );
    }

    #[tokio::test]
    async fn transport_failure_keeps_cause() {
        let fake = FakeProvider {
            failure: Some(|| WeatherError::transport("request timed out after 10s")),
            ..FakeProvider::default()
        };

        let err = dispatcher(&fake).dispatch(&invoke("get_alerts", json!({ "state": "TX" }))).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(
            err.user_message(Some(ToolName::GetAlerts)),
            "Error fetching alerts: Request failed: request timed out after 10s"
        );
    }

    #[tokio::test]
    async fn alerts_resource_returns_upstream_features() {
        let feature = json!({
            "id": "https://api.weather.gov/alerts/urn:oid:2.49.0.1.840.0.abc",
            "type": "Feature",
            "properties": {
                "event": "Heat Advisory",
                "headline": "Heat Advisory issued July 1 at 10:00AM MST",
                "expires": "2025-07-02T20:00:00-07:00",
            },
        });
        let fake = FakeProvider {
            alerts: vec![AlertFeature::from_raw(feature.clone()).unwrap()],
            ..FakeProvider::default()
        };

        let reply = dispatcher(&fake).dispatch(&Request::read("weather://az/alerts")).await.unwrap();

        let Reply::Resource(contents) = reply else { panic!("expected resource reply") };
        assert_eq!(contents.uri, "weather://az/alerts");
        assert_eq!(contents.mime_type, "application/json");
        let parsed: Value = serde_json::from_str(&contents.text).unwrap();
        assert_eq!(parsed, json!([feature]));
        assert_eq!(fake.last_state.lock().unwrap().as_deref(), Some("AZ"));
    }

    #[tokio::test]
    async fn other_uris_are_unsupported() {
        let fake = FakeProvider::default();
        let d = dispatcher(&fake);

        for uri in [
            "weather://example/current",
            "weather://CAL/alerts",
            "weather://C1/alerts",
            "http://CA/alerts",
            "weather://CA/forecast",
        ] {
            let err = d.dispatch(&Request::read(uri)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedResource, "uri {uri}");
        }
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn alerts_uri_is_case_insensitive() {
        assert_eq!(alerts_uri_state("WEATHER://ny/ALERTS"), Some("ny"));
        assert_eq!(alerts_uri_state("weather://NY/alerts"), Some("NY"));
        assert_eq!(alerts_uri_state("weather://NY/alerts/"), None);
        assert_eq!(alerts_uri_state("weather://éé/alerts"), None);
    }
}
