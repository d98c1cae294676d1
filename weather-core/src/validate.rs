//! Input checks that run before any upstream call.
//!
//! Every function here is pure. Forecast arguments are checked field by field
//! and all violations are reported together.

use serde_json::{Map, Value};

use crate::{
    error::{FieldViolation, Result, WeatherError},
    model::{Coordinate, Operation, StateCode, ToolName},
};

const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Validate the arguments of a tool invocation and build the operation.
pub fn operation(tool: ToolName, arguments: &Map<String, Value>) -> Result<Operation> {
    match tool {
        ToolName::GetAlerts => alerts_arguments(arguments).map(Operation::GetAlerts),
        ToolName::GetForecast => forecast_arguments(arguments).map(Operation::GetForecast),
    }
}

pub fn alerts_arguments(arguments: &Map<String, Value>) -> Result<StateCode> {
    let violation = match arguments.get("state") {
        None | Some(Value::Null) => FieldViolation::new("state", "is required"),
        Some(Value::String(raw)) => return state_code(raw),
        Some(other) => FieldViolation::new("state", format!("expected a string, got {}", type_name(other))),
    };

    Err(WeatherError::Validation(vec![violation]))
}

pub fn forecast_arguments(arguments: &Map<String, Value>) -> Result<Coordinate> {
    let latitude = number_field(arguments, "latitude", LATITUDE_RANGE);
    let longitude = number_field(arguments, "longitude", LONGITUDE_RANGE);
    combine(latitude, longitude)
}

/// Accepts any two characters and uppercases them; the provider rejects unknown codes itself.
pub fn state_code(raw: &str) -> Result<StateCode> {
    let len = raw.chars().count();
    if len != 2 {
        return Err(WeatherError::Validation(vec![FieldViolation::new(
            "state",
            format!("must be a 2-letter US state code (got {len} characters)"),
        )]));
    }

    Ok(StateCode::from_validated(raw.to_uppercase()))
}

/// Range-check a coordinate supplied as plain numbers (e.g. from the command line).
pub fn coordinate(latitude: f64, longitude: f64) -> Result<Coordinate> {
    let latitude = in_range("latitude", latitude, LATITUDE_RANGE);
    let longitude = in_range("longitude", longitude, LONGITUDE_RANGE);
    combine(latitude, longitude)
}

fn combine(
    latitude: std::result::Result<f64, FieldViolation>,
    longitude: std::result::Result<f64, FieldViolation>,
) -> Result<Coordinate> {
    match (latitude, longitude) {
        (Ok(lat), Ok(lon)) => Ok(Coordinate::from_validated(lat, lon)),
        (lat, lon) => Err(WeatherError::Validation(
            [lat.err(), lon.err()].into_iter().flatten().collect(),
        )),
    }
}

fn number_field(
    arguments: &Map<String, Value>,
    field: &'static str,
    range: (f64, f64),
) -> std::result::Result<f64, FieldViolation> {
    match arguments.get(field) {
        None | Some(Value::Null) => Err(FieldViolation::new(field, "is required")),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) => in_range(field, v, range),
            None => Err(FieldViolation::new(field, "expected a finite number")),
        },
        Some(other) => Err(FieldViolation::new(
            field,
            format!("expected a number, got {}", type_name(other)),
        )),
    }
}

// NaN fails `contains`, so it is rejected along with out-of-range values.
fn in_range(field: &'static str, v: f64, (min, max): (f64, f64)) -> std::result::Result<f64, FieldViolation> {
    if (min..=max).contains(&v) {
        Ok(v)
    } else {
        Err(FieldViolation::new(field, format!("must be between {min} and {max} (got {v})")))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn state_is_uppercased() {
        let code = alerts_arguments(&args(json!({ "state": "ca" }))).unwrap();
        assert_eq!(code.as_str(), "CA");
    }

    #[test]
    fn state_has_no_charset_check() {
        let code = state_code("n1").unwrap();
        assert_eq!(code.as_str(), "N1");
    }

    #[test]
    fn state_of_wrong_length_is_rejected() {
        for raw in ["", "C", "CAL", "California"] {
            let err = state_code(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationFailure, "input {raw:?}");
            assert_eq!(err.violations()[0].field, "state");
        }
    }

    #[test]
    fn state_length_counts_characters_not_bytes() {
        assert!(state_code("éé").is_ok());
    }

    #[test]
    fn missing_or_non_string_state_is_rejected() {
        let err = alerts_arguments(&Map::new()).unwrap_err();
        assert_eq!(err.violations()[0].reason, "is required");

        let err = alerts_arguments(&args(json!({ "state": 12 }))).unwrap_err();
        assert_eq!(err.violations()[0].reason, "expected a string, got number");
    }

    #[test]
    fn coordinate_in_range_is_accepted() {
        let c = forecast_arguments(&args(json!({ "latitude": 37.7749, "longitude": -122.4194 }))).unwrap();
        assert_eq!(c.latitude(), 37.7749);
        assert_eq!(c.longitude(), -122.4194);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(coordinate(90.0, 180.0).is_ok());
        assert!(coordinate(-90.0, -180.0).is_ok());
    }

    #[test]
    fn latitude_out_of_range_is_cited() {
        let err = coordinate(91.0, 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "latitude");
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn every_violated_field_is_reported() {
        let err = coordinate(-120.0, 200.0).unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, ["latitude", "longitude"]);

        let err = forecast_arguments(&args(json!({ "latitude": "37.7" }))).unwrap_err();
        let reasons: Vec<_> = err.violations().iter().map(|v| v.reason.as_str()).collect();
        assert_eq!(reasons, ["expected a number, got string", "is required"]);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let err = coordinate(f64::NAN, 0.0).unwrap_err();
        assert_eq!(err.violations()[0].field, "latitude");
    }

    #[test]
    fn operation_dispatches_on_tool() {
        let op = operation(ToolName::GetAlerts, &args(json!({ "state": "ny" }))).unwrap();
        assert!(matches!(op, Operation::GetAlerts(ref s) if s.as_str() == "NY"));

        let op = operation(ToolName::GetForecast, &args(json!({ "latitude": 0, "longitude": 0 }))).unwrap();
        assert!(matches!(op, Operation::GetForecast(_)));
    }
}
