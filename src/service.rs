//! City AQI lookup through the cache
//!
//! The service owns the read-then-populate cycle: consult the cache, and on a
//! miss fetch from the provider with no cache lock held, normalize, and store.
//! Concurrent misses for one key may both reach the provider; the last write
//! wins and the cache stays consistent.

use std::sync::Arc;
use thiserror::Error;

use crate::cache::LookupCache;
use crate::data::{normalize_record, AqiProvider, AqiRecord, FetchError, ParseFailure};

/// Errors surfaced by a city lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// The city key was empty or contained unusable characters
    #[error("Invalid city name provided")]
    InvalidKey,

    /// The provider has no data for the city
    #[error("No results found for city: {0}")]
    NotFound(String),

    /// The provider could not be queried
    #[error(transparent)]
    Fetch(FetchError),

    /// The provider answered with data that could not be normalized
    #[error("Failed to parse API response: {0}")]
    Parse(#[from] ParseFailure),
}

impl From<FetchError> for LookupError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NoData(city) => LookupError::NotFound(city),
            other => LookupError::Fetch(other),
        }
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// The normalized record
    pub record: AqiRecord,
    /// Whether the record was served from the cache
    pub cached: bool,
}

/// Canonical form of a city identifier used for caching and fetching
///
/// Surrounding whitespace is trimmed, inner runs of whitespace collapse to a
/// single space and the result is lowercased.
///
/// # Returns
/// * `Ok(String)` - The normalized key
/// * `Err(LookupError::InvalidKey)` - If nothing usable remains, or the key
///   contains control characters or path separators
pub fn normalize_key(raw: &str) -> Result<String, LookupError> {
    if raw.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
        return Err(LookupError::InvalidKey);
    }

    let key = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if key.is_empty() {
        return Err(LookupError::InvalidKey);
    }
    Ok(key)
}

/// Looks up AQI records, serving from the cache when fresh
#[derive(Clone)]
pub struct AqiService {
    cache: Arc<LookupCache>,
    provider: Arc<dyn AqiProvider>,
}

impl AqiService {
    /// Creates a service over a shared cache and provider
    pub fn new(cache: Arc<LookupCache>, provider: Arc<dyn AqiProvider>) -> Self {
        Self { cache, provider }
    }

    /// The cache backing this service
    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// Returns the AQI record for `city`
    ///
    /// # Behavior
    /// - Invalid keys fail before the cache or provider is touched
    /// - A fresh cache entry is returned with `cached = true`
    /// - Otherwise the provider is queried once (no retries), the response is
    ///   normalized and stored, and returned with `cached = false`
    /// - On any failure the cache is left as it was
    pub async fn lookup(&self, city: &str) -> Result<Lookup, LookupError> {
        let key = normalize_key(city)?;

        if let Some(record) = self.cache.get(&key).await {
            return Ok(Lookup {
                record,
                cached: true,
            });
        }

        let raw = self.provider.fetch_aqi(&key).await.map_err(|e| {
            tracing::warn!(key = %key, error = %e, "Provider fetch failed");
            LookupError::from(e)
        })?;

        let record = normalize_record(&raw).map_err(|e| {
            tracing::error!(key = %key, error = %e, "Error parsing AQI data");
            LookupError::from(e)
        })?;

        self.cache.put(key, record.clone()).await;

        Ok(Lookup {
            record,
            cached: false,
        })
    }
}

impl std::fmt::Debug for AqiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AqiService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
