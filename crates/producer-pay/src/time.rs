//! Time points, durations and block timestamps
//!
//! Wall-clock time is kept in microseconds since the Unix epoch. Block
//! timestamps count half-second slots since 2000-01-01T00:00:00Z.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

pub const USECONDS_PER_SECOND: i64 = 1_000_000;
pub const USECONDS_PER_HOUR: i64 = 3600 * USECONDS_PER_SECOND;
pub const USECONDS_PER_DAY: i64 = 24 * USECONDS_PER_HOUR;

/// Block slot length in milliseconds
pub const BLOCK_INTERVAL_MS: i64 = 500;

/// Block timestamp epoch (2000-01-01T00:00:00Z) in Unix milliseconds
pub const BLOCK_TIMESTAMP_EPOCH_MS: i64 = 946_684_800_000;

/// Half-second slots per day
pub const BLOCKS_PER_DAY: u32 = 2 * 24 * 3600;

/// Signed duration in microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Microseconds(i64);

impl Microseconds {
    pub const fn new(count: i64) -> Self {
        Self(count)
    }

    pub const fn hours(h: i64) -> Self {
        Self(h * USECONDS_PER_HOUR)
    }

    pub const fn days(d: i64) -> Self {
        Self(d * USECONDS_PER_DAY)
    }

    pub const fn count(&self) -> i64 {
        self.0
    }

    /// Whole and fractional seconds
    pub fn to_seconds_f64(&self) -> f64 {
        self.0 as f64 / USECONDS_PER_SECOND as f64
    }
}

/// Point in time, microseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(i64);

impl TimePoint {
    pub const fn from_micros(us: i64) -> Self {
        Self(us)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * USECONDS_PER_SECOND)
    }

    pub const fn micros(&self) -> i64 {
        self.0
    }

    /// Unset (zero) time point
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_micros())
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.0)
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::Config(format!("invalid timestamp {:?}: {}", s, e)))?;
        Ok(Self::from_datetime(dt.with_timezone(&Utc)))
    }

    pub fn to_rfc3339(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Micros, true),
            None => format!("{}us", self.0),
        }
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Sub for TimePoint {
    type Output = Microseconds;

    fn sub(self, rhs: TimePoint) -> Microseconds {
        Microseconds(self.0.saturating_sub(rhs.0))
    }
}

impl Add<Microseconds> for TimePoint {
    type Output = TimePoint;

    fn add(self, rhs: Microseconds) -> TimePoint {
        TimePoint(self.0.saturating_add(rhs.0))
    }
}

/// Half-second block slot counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTimestamp {
    pub slot: u32,
}

impl BlockTimestamp {
    pub const fn new(slot: u32) -> Self {
        Self { slot }
    }

    /// Slots elapsed since `earlier`, modulo 2^32. A stamp ahead of `self`
    /// wraps to a large count, so a gate stamped in the future still opens.
    pub fn slots_since(&self, earlier: BlockTimestamp) -> u32 {
        self.slot.wrapping_sub(earlier.slot)
    }

    pub fn to_time_point(&self) -> TimePoint {
        let ms = self.slot as i64 * BLOCK_INTERVAL_MS + BLOCK_TIMESTAMP_EPOCH_MS;
        TimePoint::from_micros(ms * 1000)
    }

    /// Slot containing `tp`, clamped to the representable range
    pub fn from_time_point(tp: TimePoint) -> Self {
        let ms = tp.micros() / 1000 - BLOCK_TIMESTAMP_EPOCH_MS;
        let slot = (ms / BLOCK_INTERVAL_MS).clamp(0, u32::MAX as i64);
        Self { slot: slot as u32 }
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.slot)
    }
}

/// Serde adapter writing a `TimePoint` as an RFC 3339 string
pub mod rfc3339 {
    use super::TimePoint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tp: &TimePoint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&tp.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimePoint, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimePoint::parse_rfc3339(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_timestamp_epoch() {
        let ts = BlockTimestamp::new(0);
        assert_eq!(ts.to_time_point().to_rfc3339(), "2000-01-01T00:00:00.000000Z");

        let ts = BlockTimestamp::new(BLOCKS_PER_DAY);
        assert_eq!(ts.to_time_point().to_rfc3339(), "2000-01-02T00:00:00.000000Z");
    }

    #[test]
    fn test_block_timestamp_round_trip() {
        let tp = TimePoint::parse_rfc3339("2024-03-01T12:00:00.500Z").unwrap();
        let ts = BlockTimestamp::from_time_point(tp);
        assert_eq!(ts.to_time_point(), tp);

        // Before the block epoch clamps to zero
        assert_eq!(BlockTimestamp::from_time_point(TimePoint::from_secs(0)).slot, 0);
    }

    #[test]
    fn test_slots_since_wraps() {
        let a = BlockTimestamp::new(100);
        let b = BlockTimestamp::new(250);
        assert_eq!(b.slots_since(a), 150);
        assert_eq!(a.slots_since(b), u32::MAX - 149);
    }

    #[test]
    fn test_time_arithmetic() {
        let t0 = TimePoint::from_secs(1_000);
        let t1 = t0 + Microseconds::hours(3);
        assert_eq!((t1 - t0).count(), 3 * USECONDS_PER_HOUR);
        assert_eq!((t0 - t1).count(), -3 * USECONDS_PER_HOUR);
        assert_eq!(Microseconds::days(1).to_seconds_f64(), 86_400.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TimePoint::parse_rfc3339("10.06.2025").is_err());
    }
}
