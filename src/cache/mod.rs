//! Cache module for holding recent AQI lookups in memory
//!
//! This module provides a bounded lookup cache with a fixed TTL. Expiry is
//! lazy and eviction happens only on insert; there are no background tasks.
//! Nothing is persisted, so the cache starts empty on every process start.

mod clock;
mod lookup;

pub use clock::{Clock, SystemClock};

#[cfg(test)]
pub(crate) use clock::ManualClock;
pub use lookup::{LookupCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};
