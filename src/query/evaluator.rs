//! Query evaluation orchestration
//!
//! Composes the filter set, bucketing, and reductions for one descriptor:
//! resolve the window, fetch once from the record store, drop non-matching
//! records, partition, reduce, then shape the result. Ordering and limiting
//! are applied last, after aggregation, so they only affect which rows are
//! returned, never what was aggregated.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use tracing::debug;

use super::result::{GroupedRow, QueryResult, Summary, TimeSeriesPoint};
use super::{Direction, OrderBy, QueryDescriptor, QueryPlan};
use crate::aggregate::{reduce_metric, Reduction};
use crate::bucket::{group_by_field, time_buckets, DEFAULT_BUCKET_COUNT};
use crate::error::Result;
use crate::record::TelemetryRecord;
use crate::store::RecordStore;

/// Field backing the per-bucket latency companion and `summary.avgLatency`
const LATENCY_FIELD: &str = "latency";

/// Evaluates query descriptors against a record store.
///
/// Each evaluation owns its working set exclusively: no shared buckets or
/// accumulators, so one evaluator can serve concurrent queries against the
/// same store without coordination.
#[derive(Debug, Clone)]
pub struct QueryEvaluator {
    bucket_count: usize,
}

impl Default for QueryEvaluator {
    fn default() -> Self {
        QueryEvaluator {
            bucket_count: DEFAULT_BUCKET_COUNT,
        }
    }
}

impl QueryEvaluator {
    /// Evaluator with the default bucket count
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the number of time buckets emitted per series
    pub fn with_bucket_count(mut self, count: usize) -> Self {
        self.bucket_count = count;
        self
    }

    /// Evaluate a descriptor with the window resolved at the current instant.
    pub async fn evaluate(
        &self,
        descriptor: &QueryDescriptor,
        store: &dyn RecordStore,
    ) -> Result<QueryResult> {
        self.evaluate_at(descriptor, store, Utc::now()).await
    }

    /// Evaluate a descriptor with the window resolved at `now`.
    ///
    /// Evaluating the same descriptor at the same instant against an
    /// unchanged store yields identical results.
    pub async fn evaluate_at(
        &self,
        descriptor: &QueryDescriptor,
        store: &dyn RecordStore,
        now: DateTime<Utc>,
    ) -> Result<QueryResult> {
        let plan = descriptor.compile()?;
        let window = plan.range.resolve(now);

        // The single suspension point: one awaited read, then pure
        // synchronous computation over the owned record set.
        let candidates = store.fetch_records(plan.source, &window).await?;
        let filtered: Vec<&TelemetryRecord> = candidates
            .iter()
            .filter(|r| window.contains(r.timestamp()) && plan.filters.matches(r))
            .collect();
        debug!(
            source = %plan.source,
            candidates = candidates.len(),
            filtered = filtered.len(),
            "evaluating query"
        );

        let mut result = match &plan.group_by {
            Some(group_field) => self.evaluate_grouped(&plan, group_field, &filtered, window),
            None => self.evaluate_time_series(&plan, &filtered, window),
        };

        if let Some(order_by) = &plan.order_by {
            sort_rows(&mut result.grouped_data, order_by);
        }
        if let Some(limit) = plan.limit {
            result.grouped_data.truncate(limit);
        }

        Ok(result)
    }

    fn evaluate_time_series(
        &self,
        plan: &QueryPlan,
        filtered: &[&TelemetryRecord],
        window: super::ResolvedWindow,
    ) -> QueryResult {
        let primary = &plan.metrics[0];
        let latency = Reduction::Mean(LATENCY_FIELD.to_string());

        let mut total = 0.0;
        let points: Vec<TimeSeriesPoint> = time_buckets(filtered, &window, self.bucket_count)
            .into_iter()
            .map(|bucket| {
                let value = reduce_metric(primary, plan.source, &bucket.records);
                total += value;
                let has_latency = bucket
                    .records
                    .iter()
                    .any(|r| r.field(LATENCY_FIELD).is_some());
                TimeSeriesPoint {
                    time: bucket.start,
                    value,
                    latency: has_latency.then(|| latency.reduce(&bucket.records)),
                }
            })
            .collect();

        QueryResult {
            time_series_data: points,
            grouped_data: Vec::new(),
            summary: Summary {
                total_count: total,
                avg_latency: mean_latency(filtered),
                time_range: window,
            },
        }
    }

    fn evaluate_grouped(
        &self,
        plan: &QueryPlan,
        group_field: &str,
        filtered: &[&TelemetryRecord],
        window: super::ResolvedWindow,
    ) -> QueryResult {
        let rows: Vec<GroupedRow> = group_by_field(filtered, group_field)
            .into_iter()
            .map(|group| {
                let mut row = GroupedRow::new();
                row.insert(group_field.to_string(), Value::String(group.key));
                for metric in &plan.metrics {
                    let value = reduce_metric(metric, plan.source, &group.records);
                    row.insert(metric.clone(), number(value));
                }
                row
            })
            .collect();

        QueryResult {
            time_series_data: Vec::new(),
            grouped_data: rows,
            summary: Summary {
                total_count: filtered.len() as f64,
                avg_latency: mean_latency(filtered),
                time_range: window,
            },
        }
    }
}

fn mean_latency(records: &[&TelemetryRecord]) -> f64 {
    Reduction::Mean(LATENCY_FIELD.to_string()).reduce(records)
}

fn number(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Sort grouped rows by a named column; stable, so first-seen order is kept
/// among ties. Rows missing the column sort after rows that have it,
/// regardless of direction.
fn sort_rows(rows: &mut [GroupedRow], order_by: &OrderBy) {
    rows.sort_by(|a, b| {
        match (a.get(&order_by.field), b.get(&order_by.field)) {
            (Some(x), Some(y)) => {
                let ordering = compare_values(x, y);
                match order_by.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
