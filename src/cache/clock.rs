//! Time sources for the lookup cache

use chrono::{DateTime, Duration, Utc};
#[cfg(test)]
use std::sync::atomic::{AtomicI64, Ordering};

/// Supplies the current time to the cache
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Used by unit tests to drive TTL and eviction-order behaviour
/// deterministically.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    origin: DateTime<Utc>,
    offset_ms: AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    /// Creates a clock frozen at `origin`
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            offset_ms: AtomicI64::new(0),
        }
    }

    /// Moves the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        self.offset_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    /// Sets the clock to `origin + offset`
    pub fn set_offset(&self, offset: Duration) {
        self.offset_ms.store(offset.num_milliseconds(), Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.origin + Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
    }
}
