//! Result types for query evaluation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use super::time_range::ResolvedWindow;

/// One point of a time-series result, in ascending time order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Bucket start instant
    pub time: DateTime<Utc>,
    /// Reduced value of the primary metric for the bucket
    pub value: f64,
    /// Companion mean latency for the bucket, when the source carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
}

/// One grouped row: the group key field plus one entry per requested metric.
///
/// Backed by an insertion-ordered JSON map so column order follows the
/// requested metric order.
pub type GroupedRow = Map<String, serde_json::Value>;

/// Scalar rollups computed for every evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Sum of the primary series' values, or the filtered record count for
    /// grouped queries
    pub total_count: f64,
    /// Mean of latency values present in the filtered set; 0 when none
    pub avg_latency: f64,
    /// The resolved evaluation window
    pub time_range: ResolvedWindow,
}

/// Output of one query evaluation.
///
/// Constructed fresh on every evaluation; holds no shared state. Exactly one
/// of the two series is populated depending on the query shape, and the
/// summary is always present, zeroed for empty inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Time-bucketed series; empty for grouped queries
    pub time_series_data: Vec<TimeSeriesPoint>,
    /// Grouped rows; empty for time-series queries
    pub grouped_data: Vec<GroupedRow>,
    /// Scalar rollups over the same filtered record set
    pub summary: Summary,
}

impl QueryResult {
    /// Well-formed result for an empty filtered set
    pub fn empty(window: ResolvedWindow) -> QueryResult {
        QueryResult {
            time_series_data: Vec::new(),
            grouped_data: Vec::new(),
            summary: Summary {
                total_count: 0.0,
                avg_latency: 0.0,
                time_range: window,
            },
        }
    }
}
