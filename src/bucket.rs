//! Partitioning of filtered records into buckets
//!
//! Two partitioning modes, selected by the query shape: discrete grouping on
//! a record field, or equal-width time bucketing over the resolved window.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::query::time_range::ResolvedWindow;
use crate::record::TelemetryRecord;

/// Number of time buckets a series is divided into by default.
///
/// Fixed regardless of range span; one per hour for the default 24h window.
pub const DEFAULT_BUCKET_COUNT: usize = 24;

/// One time-aligned partition of the window
#[derive(Debug)]
pub struct TimeBucket<'a> {
    /// Inclusive bucket start
    pub start: DateTime<Utc>,
    /// Exclusive bucket end
    pub end: DateTime<Utc>,
    /// Records whose timestamp falls in `[start, end)`
    pub records: Vec<&'a TelemetryRecord>,
}

/// Divide the window into `count` equal-width buckets and assign records.
///
/// Every bucket is emitted even when empty, so series always have the
/// configured length. Intervals are half-open with the boundary belonging to
/// the bucket that starts at that instant. Records outside the window are
/// excluded, not clipped into the nearest bucket.
pub fn time_buckets<'a>(
    records: &[&'a TelemetryRecord],
    window: &ResolvedWindow,
    count: usize,
) -> Vec<TimeBucket<'a>> {
    if count == 0 {
        return Vec::new();
    }
    let span_ms = (window.end - window.start).num_milliseconds();
    let mut buckets: Vec<TimeBucket<'a>> = (0..count)
        .map(|i| TimeBucket {
            start: window.start + Duration::milliseconds(span_ms * i as i64 / count as i64),
            end: window.start + Duration::milliseconds(span_ms * (i as i64 + 1) / count as i64),
            records: Vec::new(),
        })
        .collect();
    if span_ms <= 0 {
        return buckets;
    }

    for record in records {
        let offset_ms = (record.timestamp() - window.start).num_milliseconds();
        if offset_ms < 0 || offset_ms >= span_ms {
            continue;
        }
        let index = ((offset_ms as i128 * count as i128) / span_ms as i128) as usize;
        buckets[index.min(count - 1)].records.push(record);
    }

    buckets
}

/// One discrete partition keyed by a field value
#[derive(Debug)]
pub struct Group<'a> {
    /// String form of the grouping field value
    pub key: String,
    /// Records sharing the key
    pub records: Vec<&'a TelemetryRecord>,
}

/// Fallback key for records that do not carry the grouping field
const UNKNOWN_KEY: &str = "unknown";

/// Partition records by the string form of the named field.
///
/// Groups are emitted in first-seen order; `orderBy` reshaping happens later
/// in the evaluator. Records missing the field collect under `"unknown"`.
pub fn group_by_field<'a>(records: &[&'a TelemetryRecord], field: &str) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = match record.field(field) {
            Some(value) => value.to_string(),
            None => UNKNOWN_KEY.to_string(),
        };
        match index.get(&key) {
            Some(&slot) => groups[slot].records.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    records: vec![record],
                });
            }
        }
    }

    groups
}
