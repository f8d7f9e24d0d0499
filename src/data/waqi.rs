//! WAQI (World Air Quality Index) API client
//!
//! Fetches city feeds from `api.waqi.info` and classifies every way a fetch
//! can fail. The lookup service talks to the provider through the
//! [`AqiProvider`] trait so tests can substitute a fake.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Base URL for the WAQI API
pub const WAQI_BASE_URL: &str = "https://api.waqi.info";

/// Default bound on a single provider request
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Message WAQI sends back for a city it has no station for
const UNKNOWN_STATION: &str = "Unknown station";

/// Errors that can occur when fetching from the provider
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the fetch timeout
    #[error("Request timeout: API took too long to respond")]
    Timeout,

    /// The provider could not be reached
    #[error("Connection error: Unable to reach WAQI API")]
    ConnectionFailure,

    /// Any other transport-level failure
    #[error("Request error: {0}")]
    Transport(String),

    /// The provider answered with an error status of its own
    #[error("API Error: {0}")]
    Upstream(String),

    /// The provider has no data for the requested city
    #[error("No results found for city: {0}")]
    NoData(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectionFailure
        } else {
            // Strip the URL so the token never leaks into messages or logs
            FetchError::Transport(err.without_url().to_string())
        }
    }
}

/// The provider's `data` payload for one city, not yet normalized
#[derive(Debug, Clone, PartialEq)]
pub struct RawProviderResponse(Value);

impl RawProviderResponse {
    /// Wraps a raw `data` value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrows the raw JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// A source of raw air quality data keyed by city
#[async_trait]
pub trait AqiProvider: Send + Sync {
    /// Fetches the current feed for `city`
    async fn fetch_aqi(&self, city: &str) -> Result<RawProviderResponse, FetchError>;
}

/// Envelope every WAQI response is wrapped in
#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    status: String,
    #[serde(default)]
    data: Value,
}

/// Client for fetching city feeds from the WAQI API
#[derive(Debug, Clone)]
pub struct WaqiClient {
    /// HTTP client, built with the fetch timeout
    http_client: Client,
    /// API token appended to every request
    token: String,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl WaqiClient {
    /// Creates a new WaqiClient against the public API
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(token, timeout, WAQI_BASE_URL)
    }

    /// Creates a new WaqiClient with a custom base URL
    pub fn with_base_url(
        token: impl Into<String>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Feed URL for a city, without the token
    fn feed_url(&self, city: &str) -> String {
        format!("{}/feed/{}/", self.base_url, urlencoded(city))
    }

    /// Classifies a decoded envelope
    fn classify(city: &str, envelope: FeedEnvelope) -> Result<RawProviderResponse, FetchError> {
        if envelope.status != "ok" {
            let message = match &envelope.data {
                Value::String(s) => s.clone(),
                Value::Null => "Unknown error".to_string(),
                other => other.to_string(),
            };
            if message == UNKNOWN_STATION {
                return Err(FetchError::NoData(city.to_string()));
            }
            return Err(FetchError::Upstream(message));
        }

        let is_empty = match &envelope.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(FetchError::NoData(city.to_string()));
        }

        Ok(RawProviderResponse::new(envelope.data))
    }
}

#[async_trait]
impl AqiProvider for WaqiClient {
    async fn fetch_aqi(&self, city: &str) -> Result<RawProviderResponse, FetchError> {
        let url = self.feed_url(city);
        tracing::info!(city, url = %url, "Fetching data from WAQI API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .map_err(|e| {
                let err = FetchError::from(e);
                tracing::error!(city, error = %err, "WAQI request failed");
                err
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!(city, %status, "WAQI returned non-success status");
            return Err(FetchError::Transport(format!("HTTP status {}", status)));
        }

        let envelope = response.json::<FeedEnvelope>().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!(city, error = %e, "WAQI response was not valid JSON");
            FetchError::Transport(format!("JSON parsing error: {}", e))
        })?;

        Self::classify(city, envelope)
    }
}

/// Percent-encodes a city name for use as a path segment
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'@' | b':' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
