//! Normalization of raw WAQI feed data into [`AqiRecord`]s
//!
//! The provider's payload is loosely typed: the index can arrive as a number,
//! a numeric string or a `"-"` placeholder, and pollutant readings are only
//! present for what the station measures. Everything is mapped onto the
//! strongly typed record here, or rejected as a whole.

use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use super::{AqiRecord, AqiValue, Pollutant, RawProviderResponse};

/// City name used when the provider omits one
const DEFAULT_CITY: &str = "Unknown";

/// Source URL used when the provider omits one
const DEFAULT_URL: &str = "N/A";

/// Errors raised when a provider payload cannot be turned into a record
#[derive(Debug, Error, PartialEq)]
pub enum ParseFailure {
    /// The feed data was not a JSON object
    #[error("Provider data is not an object (found {0})")]
    NotAnObject(&'static str),

    /// A required block had the wrong shape
    #[error("Field '{field}' has unexpected type {found}")]
    InvalidField {
        field: &'static str,
        found: &'static str,
    },
}

/// Builds an [`AqiRecord`] from the provider's `data` object
///
/// # Returns
/// * `Ok(AqiRecord)` - The normalized record, stamped with the current time
/// * `Err(ParseFailure)` - If the payload lacks the expected structure; no
///   partial record is ever produced
pub fn normalize_record(raw: &RawProviderResponse) -> Result<AqiRecord, ParseFailure> {
    let data = raw
        .as_value()
        .as_object()
        .ok_or_else(|| ParseFailure::NotAnObject(type_name(raw.as_value())))?;

    let aqi = parse_aqi(data.get("aqi"));
    let city = optional_object(data, "city")?;
    let iaqi = optional_object(data, "iaqi")?;

    let name = city
        .and_then(|c| c.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CITY)
        .to_string();

    let source_url = city
        .and_then(|c| c.get("url"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_URL)
        .to_string();

    let pollutants = iaqi.map(parse_pollutants).unwrap_or_default();

    Ok(AqiRecord {
        city: name,
        aqi,
        category: aqi.category(),
        pollutants,
        source_url,
        fetched_at: Utc::now(),
    })
}

/// Parses the index reading; anything non-numeric is the unknown sentinel
///
/// Fractional readings round up, so a value just past a category breakpoint
/// lands in the higher category.
fn parse_aqi(value: Option<&Value>) -> AqiValue {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => AqiValue::Known(v),
            None => n.as_f64().map_or(AqiValue::Unknown, aqi_from_float),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(v) => AqiValue::Known(v),
                Err(_) => s.parse::<f64>().map_or(AqiValue::Unknown, aqi_from_float),
            }
        }
        _ => AqiValue::Unknown,
    }
}

fn aqi_from_float(f: f64) -> AqiValue {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        AqiValue::Known(f.ceil() as i64)
    } else {
        AqiValue::Unknown
    }
}

/// Collects readings for the recognized pollutants present in `iaqi`
fn parse_pollutants(iaqi: &Map<String, Value>) -> BTreeMap<Pollutant, f64> {
    Pollutant::ALL
        .iter()
        .filter_map(|pollutant| {
            let reading = iaqi.get(pollutant.provider_code())?.get("v")?;
            let value = match reading {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .filter(|v| v.is_finite())?;
            Some((*pollutant, value))
        })
        .collect()
}

/// Returns the named block if it is an object, `None` if absent or null
fn optional_object<'a>(
    data: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a Map<String, Value>>, ParseFailure> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ParseFailure::InvalidField {
            field,
            found: type_name(other),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
