//! Query time bounds and their resolution to absolute nanosecond ranges

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A bound as the query layer expresses it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Time {
    /// An absolute instant
    Absolute(DateTime<Utc>),
    /// An offset from a "now" that has not been fixed yet
    Relative(Duration),
    /// No bound given
    #[default]
    Unspecified,
}

impl Time {
    pub fn from_unix_nanos(nanos: i64) -> Self {
        Time::Absolute(DateTime::from_timestamp_nanos(nanos))
    }

    fn resolve(&self, which: &str) -> Result<i64> {
        match self {
            Time::Absolute(instant) => instant.timestamp_nanos_opt().ok_or_else(|| {
                Error::Invalid(format!(
                    "{which} bound {instant} is outside the representable nanosecond range"
                ))
            }),
            Time::Relative(offset) => Err(Error::Invalid(format!(
                "{which} bound must be absolute, got relative offset {offset}"
            ))),
            Time::Unspecified => Err(Error::Invalid(format!("{which} bound is not specified"))),
        }
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(instant: DateTime<Utc>) -> Self {
        Time::Absolute(instant)
    }
}

/// Start and stop bounds of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub start: Time,
    pub stop: Time,
}

impl Bounds {
    pub fn new(start: impl Into<Time>, stop: impl Into<Time>) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
        }
    }

    /// Bounds from unix nanoseconds
    pub fn from_nanos(start: i64, stop: i64) -> Self {
        Self {
            start: Time::from_unix_nanos(start),
            stop: Time::from_unix_nanos(stop),
        }
    }

    /// Resolve to an absolute `[start, end)` range in nanoseconds
    pub fn resolve(&self) -> Result<TimeRange> {
        let start = self.start.resolve("start")?;
        let end = self.stop.resolve("stop")?;
        TimeRange::try_new(start, end)
    }
}

/// Half-open `[start, end)` range in unix nanoseconds.
///
/// `start <= end` always holds; [`TimeRange::try_new`] is the only way to
/// build one, including through serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: i64,
    end: i64,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: i64,
    end: i64,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = Error;

    fn try_from(raw: RawTimeRange) -> Result<Self> {
        Self::try_new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Validating constructor, rejects `start > end`
    pub fn try_new(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(Error::Invalid(format!(
                "start bound {start} must not be after stop bound {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
