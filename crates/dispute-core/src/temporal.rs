//! # Temporal Types
//!
//! UTC-only timestamps and an injectable [`Clock`]. Filing, assignment,
//! resolution, and every audit entry are stamped in UTC; local time is a
//! presentation concern.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A UTC timestamp.
///
/// Serializes to RFC 3339 (e.g., `2026-01-15T12:00:00Z`). Ordered, so audit
/// ordering and SLA windows can compare timestamps directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse an RFC 3339 string, normalizing to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// This timestamp shifted forward by `days` calendar days.
    pub fn plus_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Fractional days elapsed from `earlier` to `self`. Negative if
    /// `earlier` is in the future.
    pub fn days_since(&self, earlier: &Timestamp) -> f64 {
        (self.0 - earlier.0).num_seconds() as f64 / SECONDS_PER_DAY
    }

    /// Whole calendar days elapsed from `earlier` to `self`, truncated.
    pub fn whole_days_since(&self, earlier: &Timestamp) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    /// RFC 3339 with `Z` suffix, truncated to seconds.
    pub fn to_canonical_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

// ── Clocks ─────────────────────────────────────────────────────────────

/// Source of "now" for lifecycle operations and SLA evaluation.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current UTC time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloning shares the underlying instant, so a test can hold one handle and
/// advance the time seen by a manager holding another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Start the clock at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: Timestamp) {
        *self.current.lock() = to;
    }

    /// Move forward by whole days.
    pub fn advance_days(&self, days: i64) {
        let mut guard = self.current.lock();
        *guard = guard.plus_days(days);
    }

    /// Move forward by seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        let mut guard = self.current.lock();
        *guard = Timestamp(guard.0 + Duration::seconds(seconds));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn parse_normalizes_offsets_to_utc() {
        let t = ts("2026-03-02T14:00:00+02:00");
        assert_eq!(t.to_canonical_string(), "2026-03-02T12:00:00Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn days_since_is_fractional() {
        let a = ts("2026-03-01T00:00:00Z");
        let b = ts("2026-03-03T12:00:00Z");
        assert!((b.days_since(&a) - 2.5).abs() < f64::EPSILON);
        assert_eq!(b.whole_days_since(&a), 2);
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(ts("2026-03-01T00:00:00Z"));
        let handle = clock.clone();
        handle.advance_days(3);
        assert_eq!(clock.now(), ts("2026-03-04T00:00:00Z"));
        handle.advance_seconds(30);
        assert_eq!(clock.now(), ts("2026-03-04T00:00:30Z"));
    }

    #[test]
    fn display_is_second_precision() {
        let t = ts("2026-03-01T08:30:15.123456Z");
        assert_eq!(t.to_string(), "2026-03-01T08:30:15Z");
    }
}
