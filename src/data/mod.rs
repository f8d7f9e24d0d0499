//! Core data models for the AQI proxy
//!
//! This module contains the normalized air quality record returned to callers
//! and stored in the lookup cache, along with the WAQI client and the
//! normalizer that turns raw provider responses into records.

pub mod normalize;
pub mod waqi;

pub use normalize::{normalize_record, ParseFailure};
pub use waqi::{AqiProvider, FetchError, RawProviderResponse, WaqiClient};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound of the Good category
const GOOD_MAX: i64 = 50;

/// Upper bound of the Moderate category
const MODERATE_MAX: i64 = 100;

/// Upper bound of the Unhealthy for Sensitive Groups category
const SENSITIVE_MAX: i64 = 150;

/// Upper bound of the Unhealthy category
const UNHEALTHY_MAX: i64 = 200;

/// Upper bound of the Very Unhealthy category
const VERY_UNHEALTHY_MAX: i64 = 300;

/// An air quality index reading
///
/// Serializes as a plain number, or `null` when the provider had no reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AqiValue {
    /// A numeric index reading
    Known(i64),
    /// The provider reported no usable reading
    Unknown,
}

impl AqiValue {
    /// Maps the reading onto the US EPA health categories
    pub fn category(self) -> HealthCategory {
        match self {
            AqiValue::Unknown => HealthCategory::Unknown,
            AqiValue::Known(v) if v <= GOOD_MAX => HealthCategory::Good,
            AqiValue::Known(v) if v <= MODERATE_MAX => HealthCategory::Moderate,
            AqiValue::Known(v) if v <= SENSITIVE_MAX => HealthCategory::UnhealthyForSensitiveGroups,
            AqiValue::Known(v) if v <= UNHEALTHY_MAX => HealthCategory::Unhealthy,
            AqiValue::Known(v) if v <= VERY_UNHEALTHY_MAX => HealthCategory::VeryUnhealthy,
            AqiValue::Known(_) => HealthCategory::Hazardous,
        }
    }
}

/// Health implication levels on the US EPA AQI scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthCategory {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl HealthCategory {
    /// Human-readable label, matching the serialized form
    pub fn label(self) -> &'static str {
        match self {
            HealthCategory::Good => "Good",
            HealthCategory::Moderate => "Moderate",
            HealthCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            HealthCategory::Unhealthy => "Unhealthy",
            HealthCategory::VeryUnhealthy => "Very Unhealthy",
            HealthCategory::Hazardous => "Hazardous",
            HealthCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pollutants reported individually by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    /// Fine particulate matter
    #[serde(rename = "PM2.5")]
    Pm25,
    /// Coarse particulate matter
    #[serde(rename = "PM10")]
    Pm10,
    /// Ozone
    #[serde(rename = "O3")]
    O3,
    /// Nitrogen dioxide
    #[serde(rename = "NO2")]
    No2,
    /// Sulfur dioxide
    #[serde(rename = "SO2")]
    So2,
    /// Carbon monoxide
    #[serde(rename = "CO")]
    Co,
}

impl Pollutant {
    /// All recognized pollutants, in reporting order
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::O3,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
    ];

    /// The code the provider uses for this pollutant in its `iaqi` block
    pub fn provider_code(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
        }
    }
}

/// A normalized air quality record for one city
///
/// Records are immutable once built; the cache only ever replaces them whole.
/// Field names on the wire follow the public REST format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiRecord {
    /// Display name of the monitoring station or city
    pub city: String,
    /// Current index reading
    pub aqi: AqiValue,
    /// Health category derived from `aqi`
    #[serde(rename = "health_implications")]
    pub category: HealthCategory,
    /// Individual pollutant readings; only pollutants the provider reported
    #[serde(rename = "details")]
    pub pollutants: BTreeMap<Pollutant, f64>,
    /// Upstream reference for the station
    #[serde(rename = "url")]
    pub source_url: String,
    /// When this record was built from a provider response
    #[serde(rename = "timestamp")]
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_scenarios() {
        assert_eq!(AqiValue::Known(35).category(), HealthCategory::Good);
        assert_eq!(AqiValue::Known(75).category(), HealthCategory::Moderate);
        assert_eq!(AqiValue::Known(180).category(), HealthCategory::Unhealthy);
        assert_eq!(AqiValue::Known(350).category(), HealthCategory::Hazardous);
        assert_eq!(AqiValue::Unknown.category(), HealthCategory::Unknown);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(AqiValue::Known(-5).category(), HealthCategory::Good);
        assert_eq!(AqiValue::Known(0).category(), HealthCategory::Good);
        assert_eq!(AqiValue::Known(50).category(), HealthCategory::Good);
        assert_eq!(AqiValue::Known(51).category(), HealthCategory::Moderate);
        assert_eq!(AqiValue::Known(100).category(), HealthCategory::Moderate);
        assert_eq!(
            AqiValue::Known(101).category(),
            HealthCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(
            AqiValue::Known(150).category(),
            HealthCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(AqiValue::Known(151).category(), HealthCategory::Unhealthy);
        assert_eq!(AqiValue::Known(200).category(), HealthCategory::Unhealthy);
        assert_eq!(AqiValue::Known(201).category(), HealthCategory::VeryUnhealthy);
        assert_eq!(AqiValue::Known(300).category(), HealthCategory::VeryUnhealthy);
        assert_eq!(AqiValue::Known(301).category(), HealthCategory::Hazardous);
    }

    #[test]
    fn test_category_display_matches_serialized_label() {
        for category in [
            HealthCategory::Good,
            HealthCategory::UnhealthyForSensitiveGroups,
            HealthCategory::VeryUnhealthy,
            HealthCategory::Unknown,
        ] {
            let json = serde_json::to_string(&category).expect("Failed to serialize category");
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_record_serializes_to_rest_shape() {
        let mut pollutants = BTreeMap::new();
        pollutants.insert(Pollutant::Pm25, 12.0);
        pollutants.insert(Pollutant::O3, 30.5);

        let record = AqiRecord {
            city: "Paris".to_string(),
            aqi: AqiValue::Known(42),
            category: HealthCategory::Good,
            pollutants,
            source_url: "https://aqicn.org/city/paris".to_string(),
            fetched_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).expect("Failed to serialize record");
        assert_eq!(value["city"], "Paris");
        assert_eq!(value["aqi"], 42);
        assert_eq!(value["health_implications"], "Good");
        assert_eq!(value["details"]["PM2.5"], 12.0);
        assert_eq!(value["details"]["O3"], 30.5);
        assert!(value["details"].get("CO").is_none());
        assert_eq!(value["url"], "https://aqicn.org/city/paris");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_unknown_aqi_serializes_as_null() {
        let json = serde_json::to_value(AqiValue::Unknown).expect("Failed to serialize");
        assert!(json.is_null());
    }

    #[test]
    fn test_pollutant_provider_codes_are_distinct() {
        for (i, a) in Pollutant::ALL.iter().enumerate() {
            for (j, b) in Pollutant::ALL.iter().enumerate() {
                if i != j {
                    assert_ne!(a.provider_code(), b.provider_code());
                }
            }
        }
    }
}
