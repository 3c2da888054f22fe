//! Relative time range tokens and window resolution

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

static RANGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^last_(\d+)([mhd])$").expect("range token regex"));

/// Unit of a relative range token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnit {
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days
    Days,
}

/// Relative time window specifier, e.g. `last_24h`.
///
/// Resolved to an absolute half-open `[start, end)` window at evaluation
/// time, never earlier, so repeated evaluations of a stored query track the
/// current clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Number of units to look back
    pub amount: u32,
    /// Unit of the lookback
    pub unit: RangeUnit,
}

impl TimeRange {
    /// Lookback duration of this range
    pub fn duration(&self) -> Duration {
        match self.unit {
            RangeUnit::Minutes => Duration::minutes(i64::from(self.amount)),
            RangeUnit::Hours => Duration::hours(i64::from(self.amount)),
            RangeUnit::Days => Duration::days(i64::from(self.amount)),
        }
    }

    /// Resolve to an absolute window ending at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedWindow {
        ResolvedWindow {
            start: now - self.duration(),
            end: now,
        }
    }
}

impl FromStr for TimeRange {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = RANGE_TOKEN
            .captures(s.trim())
            .ok_or_else(|| QueryError::InvalidTimeRange(s.to_string()))?;
        let amount: u32 = captures[1]
            .parse()
            .map_err(|_| QueryError::InvalidTimeRange(s.to_string()))?;
        if amount == 0 {
            // Zero lookback resolves to an empty window
            return Err(QueryError::InvalidTimeRange(s.to_string()));
        }
        let unit = match captures[2].to_ascii_lowercase().as_str() {
            "m" => RangeUnit::Minutes,
            "h" => RangeUnit::Hours,
            _ => RangeUnit::Days,
        };
        Ok(TimeRange { amount, unit })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            RangeUnit::Minutes => "m",
            RangeUnit::Hours => "h",
            RangeUnit::Days => "d",
        };
        write!(f, "last_{}{}", self.amount, unit)
    }
}

/// Absolute half-open evaluation window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl ResolvedWindow {
    /// Whether an instant falls inside the window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}
