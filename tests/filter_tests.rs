use chrono::{Duration, TimeZone, Utc};
use rstest::rstest;

use netquery::filter::{FilterExpr, FilterSet};
use netquery::record::{
    Bandwidth, ErrorRecord, ErrorType, MetricRecord, Protocol, Severity, TrafficRecord,
};
use netquery::TelemetryRecord;

fn sample_flow() -> TelemetryRecord {
    TelemetryRecord::Traffic(TrafficRecord {
        device_id: "srv1".to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 8, 24, 10, 0, 0).unwrap(),
        protocol: Protocol::Https,
        bytes: 2_000_000,
        packets: 1500,
        flows: 12,
        duration_ms: 45.0,
    })
}

fn sample_metric() -> TelemetryRecord {
    TelemetryRecord::Metric(MetricRecord {
        device_id: "r1".to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 8, 24, 10, 0, 0).unwrap(),
        cpu: 72.5,
        memory: 61.0,
        bandwidth: Bandwidth {
            inbound: 400.0,
            outbound: 250.0,
        },
        temperature: 55.0,
    })
}

fn sample_error() -> TelemetryRecord {
    TelemetryRecord::Error(ErrorRecord {
        device_id: "f1".to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 8, 24, 10, 0, 0).unwrap(),
        error_type: ErrorType::Crc,
        severity: Severity::High,
        count: 7,
    })
}

// Conditions as the dashboard's filter presets emit them
#[rstest]
#[case::protocol_membership("protocol IN (\"HTTP\", \"HTTPS\")", true)]
#[case::protocol_equality("protocol = \"TCP\"", false)]
#[case::bytes_threshold("bytes > 1000000", true)]
#[case::bytes_below("bytes < 1000000", false)]
#[case::device_prefix("device_id LIKE \"srv%\"", true)]
#[case::device_other_prefix("device_id LIKE \"r%\"", false)]
#[case::unknown_field("destination_port = 443", false)]
fn test_flow_conditions(#[case] condition: &str, #[case] expected: bool) {
    let expr = FilterExpr::parse(condition).unwrap();
    assert_eq!(expr.matches(&sample_flow()), expected, "{}", condition);
}

#[rstest]
#[case::cpu_band("cpu BETWEEN 50 AND 90", true)]
#[case::cpu_high("cpu > 90", false)]
#[case::inbound_threshold("inbound > 300", true)]
#[case::total_bandwidth("total > 600", true)]
fn test_metric_conditions(#[case] condition: &str, #[case] expected: bool) {
    let expr = FilterExpr::parse(condition).unwrap();
    assert_eq!(expr.matches(&sample_metric()), expected, "{}", condition);
}

#[rstest]
#[case::severity("severity = \"high\"", true)]
#[case::error_type("error_type = \"CRC\"", true)]
#[case::type_alias("type = \"CRC\"", true)]
#[case::count_range("count BETWEEN 5 AND 10", true)]
#[case::other_type("error_type = \"Collision\"", false)]
fn test_error_conditions(#[case] condition: &str, #[case] expected: bool) {
    let expr = FilterExpr::parse(condition).unwrap();
    assert_eq!(expr.matches(&sample_error()), expected, "{}", condition);
}

#[test]
fn test_and_combination_requires_every_condition() {
    let set = FilterSet::compile(&[
        "protocol IN (\"HTTP\", \"HTTPS\")".to_string(),
        "bytes > 1000000".to_string(),
        "device_id LIKE \"srv%\"".to_string(),
    ]);
    assert!(set.matches(&sample_flow()));

    // Same record, one condition tightened past its value
    let set = FilterSet::compile(&[
        "protocol IN (\"HTTP\", \"HTTPS\")".to_string(),
        "bytes > 1000000".to_string(),
        "device_id LIKE \"edge%\"".to_string(),
    ]);
    assert!(!set.matches(&sample_flow()));
}

#[test]
fn test_filter_order_does_not_matter() {
    let conditions = [
        "bytes > 1000000".to_string(),
        "protocol = \"HTTPS\"".to_string(),
    ];
    let forward = FilterSet::compile(&conditions);
    let mut reversed = conditions.to_vec();
    reversed.reverse();
    let backward = FilterSet::compile(&reversed);

    let flow = sample_flow();
    assert_eq!(forward.matches(&flow), backward.matches(&flow));
}

#[test]
fn test_malformed_condition_excludes_everything() {
    let set = FilterSet::compile(&["bytes >".to_string()]);
    assert!(!set.matches(&sample_flow()));
    assert!(!set.matches(&sample_metric()));
    assert!(!set.matches(&sample_error()));
}

#[test]
fn test_filters_are_kind_safe() {
    // A metric-only field referenced against flow and error records: no
    // match, no error
    let expr = FilterExpr::parse("cpu > 10").unwrap();
    assert!(expr.matches(&sample_metric()));
    assert!(!expr.matches(&sample_flow()));
    assert!(!expr.matches(&sample_error()));
}

#[test]
fn test_timestamp_comparison_window() {
    // Records are immutable; evaluating against the same record many times
    // always yields the same decision
    let expr = FilterExpr::parse("packets > 1000").unwrap();
    let flow = sample_flow();
    let decisions: Vec<bool> = (0..100).map(|_| expr.matches(&flow)).collect();
    assert!(decisions.iter().all(|&d| d));
}

#[test]
fn test_in_list_with_numbers() {
    let expr = FilterExpr::parse("flows IN (12, 24)").unwrap();
    assert!(expr.matches(&sample_flow()));
    let expr = FilterExpr::parse("flows IN (1, 2)").unwrap();
    assert!(!expr.matches(&sample_flow()));
}

#[test]
fn test_duration_backs_latency_field() {
    let expr = FilterExpr::parse("latency BETWEEN 40 AND 50").unwrap();
    assert!(expr.matches(&sample_flow()));
}

#[test]
fn test_old_records_unaffected_by_filtering() {
    // Filtering never mutates the record set it reads
    let flow = sample_flow();
    let before = flow.clone();
    let set = FilterSet::compile(&["bytes > 0".to_string()]);
    let _ = set.matches(&flow);
    assert_eq!(flow, before);
    // Window exclusion happens before filtering in the evaluator; a record
    // from last year still evaluates consistently here
    let old = TelemetryRecord::Traffic(TrafficRecord {
        timestamp: Utc.with_ymd_and_hms(2025, 8, 24, 10, 0, 0).unwrap() - Duration::hours(1),
        ..match flow {
            TelemetryRecord::Traffic(t) => t,
            _ => unreachable!(),
        }
    });
    assert!(set.matches(&old));
}
