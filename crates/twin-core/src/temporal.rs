//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines [`Timestamp`], a UTC timestamp truncated to seconds precision.
//!
//! The registry keys ownership history on `(product_id, timestamp)`, so the
//! granularity matters: two transfers inside the same second share a key.
//! Seconds precision matches the coarse, one-value-per-operation clock the
//! host supplies.
//!
//! Strict parsing rejects non-`Z` offsets so that a timestamp has exactly
//! one textual form; `parse_lenient()` exists for query parameters.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// From a Unix epoch value in seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: secs.to_string(),
                reason: "out of range".to_string(),
            })
    }

    /// Parse an RFC 3339 string with a `Z` suffix.
    ///
    /// # Errors
    ///
    /// Rejects malformed input and any explicit offset, including `+00:00`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: "must use Z suffix (UTC only)".to_string(),
            });
        }
        Self::parse_lenient(s)
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Add a number of seconds, failing on overflow.
    ///
    /// Used to derive warranty expiry from the creation time.
    pub fn checked_add_secs(&self, secs: i64) -> Result<Self, ValidationError> {
        chrono::TimeDelta::try_seconds(secs)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: format!("{} + {secs}s", self.to_iso8601()),
                reason: "overflow".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc
            .with_ymd_and_hms(2026, 3, 1, 8, 15, 30)
            .unwrap()
            .with_nanosecond(987_000_000)
            .unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_iso8601(), "2026-03-01T08:15:30Z");
    }

    #[test]
    fn parse_strict_rejects_offsets() {
        assert!(Timestamp::parse("2026-03-01T08:15:30Z").is_ok());
        assert!(Timestamp::parse("2026-03-01T08:15:30+00:00").is_err());
        assert!(Timestamp::parse("2026-03-01T13:15:30+05:00").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn parse_lenient_normalizes_to_utc() {
        let ts = Timestamp::parse_lenient("2026-03-01T13:15:30+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-01T08:15:30Z");
    }

    #[test]
    fn epoch_roundtrip() {
        let ts = Timestamp::parse("2026-03-01T08:15:30Z").unwrap();
        assert_eq!(Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap(), ts);
    }

    #[test]
    fn checked_add_secs_advances() {
        let ts = Timestamp::from_epoch_secs(1_000).unwrap();
        let later = ts.checked_add_secs(2_629_746).unwrap();
        assert_eq!(later.epoch_secs(), 2_630_746);
    }

    #[test]
    fn checked_add_secs_overflow_is_error() {
        let ts = Timestamp::from_epoch_secs(0).unwrap();
        assert!(ts.checked_add_secs(i64::MAX).is_err());
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::from_epoch_secs(10).unwrap();
        let b = Timestamp::from_epoch_secs(11).unwrap();
        assert!(a < b);
    }
}
