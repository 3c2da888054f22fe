//! Metric reduction over record buckets
//!
//! Each requested metric name maps to one reduction with fixed semantics:
//! counts count records, bandwidth `total` sums inbound plus outbound,
//! health metrics average, error and traffic counters sum. Unknown metric
//! names reduce to `0` so a partially-invalid metric list degrades instead
//! of failing the query.

use tracing::warn;

use crate::record::{DataSource, ErrorType, TelemetryRecord};

/// Reduction applied to one bucket of records
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// Number of records in the bucket
    Count,
    /// Sum of a numeric field across the bucket
    Sum(String),
    /// Arithmetic mean of a numeric field; empty bucket yields 0
    Mean(String),
    /// Sum of inbound plus sum of outbound bandwidth
    BandwidthTotal,
    /// Sum of error counts for one error type
    ErrorCount(ErrorType),
}

impl Reduction {
    /// Map a requested metric name to its reduction.
    ///
    /// Accepts the dashboard vocabularies (`inbound`, `crc_errors`, `bytes`,
    /// `cpu`, ...) plus `AVG(field)` / `SUM(field)` function forms and the
    /// bare `COUNT`. Returns `None` for names with no defined reduction.
    pub fn for_metric(name: &str, source: DataSource) -> Option<Reduction> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        // Function forms: COUNT, AVG(latency), SUM(bytes)
        if let Some(inner) = function_arg(name, "AVG") {
            return Some(Reduction::Mean(inner));
        }
        if let Some(inner) = function_arg(name, "SUM") {
            return Some(Reduction::Sum(inner));
        }
        if name == "COUNT" || name.eq_ignore_ascii_case("count()") {
            return Some(Reduction::Count);
        }

        match name.to_ascii_lowercase().as_str() {
            // Record count; on the error source the UI's lowercase "count"
            // means the error counter field, which sums
            "count" if source == DataSource::Errors => Some(Reduction::Sum("count".to_string())),
            "count" => Some(Reduction::Count),
            // Bandwidth
            "total" => Some(Reduction::BandwidthTotal),
            "inbound" => Some(Reduction::Sum("inbound".to_string())),
            "outbound" => Some(Reduction::Sum("outbound".to_string())),
            // Device health: arithmetic means
            "cpu" | "memory" | "temperature" | "latency" => {
                Some(Reduction::Mean(name.to_ascii_lowercase()))
            }
            // Traffic counters
            "bytes" | "packets" | "flows" => Some(Reduction::Sum(name.to_ascii_lowercase())),
            // Error rollups by type
            "crc_errors" => Some(Reduction::ErrorCount(ErrorType::Crc)),
            "fragments" => Some(Reduction::ErrorCount(ErrorType::Fragment)),
            "collisions" => Some(Reduction::ErrorCount(ErrorType::Collision)),
            _ => None,
        }
    }

    /// Reduce one bucket to a scalar.
    pub fn reduce(&self, records: &[&TelemetryRecord]) -> f64 {
        match self {
            Reduction::Count => records.len() as f64,
            Reduction::Sum(field) => records
                .iter()
                .filter_map(|r| r.field(field).and_then(|v| v.as_f64()))
                .sum(),
            Reduction::Mean(field) => {
                let mut sum = 0.0;
                let mut n = 0u64;
                for record in records {
                    if let Some(value) = record.field(field).and_then(|v| v.as_f64()) {
                        sum += value;
                        n += 1;
                    }
                }
                if n == 0 {
                    0.0
                } else {
                    sum / n as f64
                }
            }
            Reduction::BandwidthTotal => {
                Reduction::Sum("inbound".to_string()).reduce(records)
                    + Reduction::Sum("outbound".to_string()).reduce(records)
            }
            Reduction::ErrorCount(error_type) => records
                .iter()
                .filter_map(|r| match r {
                    TelemetryRecord::Error(e) if e.error_type == *error_type => {
                        Some(f64::from(e.count))
                    }
                    _ => None,
                })
                .sum(),
        }
    }
}

/// Reduce a bucket for a named metric; unknown names yield `0`.
pub fn reduce_metric(name: &str, source: DataSource, records: &[&TelemetryRecord]) -> f64 {
    match Reduction::for_metric(name, source) {
        Some(reduction) => reduction.reduce(records),
        None => {
            warn!(metric = %name, %source, "unrecognized metric, emitting zero");
            0.0
        }
    }
}

fn function_arg(name: &str, function: &str) -> Option<String> {
    let rest = name
        .strip_prefix(function)
        .or_else(|| name.strip_prefix(&function.to_ascii_lowercase()))?;
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    let inner = inner.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Bandwidth, ErrorRecord, MetricRecord, Severity};
    use chrono::{TimeZone, Utc};

    fn metric(inbound: f64, outbound: f64, cpu: f64) -> TelemetryRecord {
        TelemetryRecord::Metric(MetricRecord {
            device_id: "r1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
            cpu,
            memory: 50.0,
            bandwidth: Bandwidth { inbound, outbound },
            temperature: 45.0,
        })
    }

    fn error(error_type: ErrorType, count: u32) -> TelemetryRecord {
        TelemetryRecord::Error(ErrorRecord {
            device_id: "r1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
            error_type,
            severity: Severity::Medium,
            count,
        })
    }

    #[test]
    fn test_bandwidth_total_sums_both_directions() {
        let a = metric(100.0, 50.0, 10.0);
        let b = metric(200.0, 150.0, 20.0);
        let bucket = vec![&a, &b];
        assert_eq!(
            reduce_metric("total", DataSource::Metrics, &bucket),
            500.0
        );
        assert_eq!(
            reduce_metric("inbound", DataSource::Metrics, &bucket),
            300.0
        );
        assert_eq!(
            reduce_metric("outbound", DataSource::Metrics, &bucket),
            200.0
        );
    }

    #[test]
    fn test_mean_over_empty_bucket_is_zero() {
        let value = reduce_metric("cpu", DataSource::Metrics, &[]);
        assert_eq!(value, 0.0);
        assert!(!value.is_nan());
    }

    #[test]
    fn test_mean_semantics() {
        let a = metric(0.0, 0.0, 40.0);
        let b = metric(0.0, 0.0, 60.0);
        let bucket = vec![&a, &b];
        assert_eq!(reduce_metric("cpu", DataSource::Metrics, &bucket), 50.0);
        assert_eq!(
            reduce_metric("AVG(cpu)", DataSource::Metrics, &bucket),
            50.0
        );
    }

    #[test]
    fn test_count_vs_error_counter() {
        let a = error(ErrorType::Crc, 4);
        let b = error(ErrorType::Crc, 6);
        let bucket = vec![&a, &b];
        // Record count
        assert_eq!(reduce_metric("COUNT", DataSource::Errors, &bucket), 2.0);
        // Error counter field sums on the error source
        assert_eq!(reduce_metric("count", DataSource::Errors, &bucket), 10.0);
    }

    #[test]
    fn test_error_type_rollups() {
        let a = error(ErrorType::Crc, 3);
        let b = error(ErrorType::Fragment, 5);
        let c = error(ErrorType::Crc, 2);
        let bucket = vec![&a, &b, &c];
        assert_eq!(
            reduce_metric("crc_errors", DataSource::Errors, &bucket),
            5.0
        );
        assert_eq!(
            reduce_metric("fragments", DataSource::Errors, &bucket),
            5.0
        );
        assert_eq!(
            reduce_metric("collisions", DataSource::Errors, &bucket),
            0.0
        );
    }

    #[test]
    fn test_unknown_metric_reduces_to_zero() {
        let a = metric(1.0, 1.0, 1.0);
        let bucket = vec![&a];
        assert_eq!(
            reduce_metric("jitter_p99", DataSource::Metrics, &bucket),
            0.0
        );
        assert_eq!(Reduction::for_metric("jitter_p99", DataSource::Metrics), None);
    }

    #[test]
    fn test_function_forms() {
        assert_eq!(
            Reduction::for_metric("AVG(latency)", DataSource::Flows),
            Some(Reduction::Mean("latency".to_string()))
        );
        assert_eq!(
            Reduction::for_metric("SUM(bytes)", DataSource::Flows),
            Some(Reduction::Sum("bytes".to_string()))
        );
        assert_eq!(
            Reduction::for_metric("COUNT", DataSource::Flows),
            Some(Reduction::Count)
        );
    }
}
