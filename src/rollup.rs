//! Derived-metric rollups over raw record sets
//!
//! Summary statistics for the dashboard's stat cards: fleet bandwidth from
//! the latest sample per device, health averages, error totals by type, and
//! a packet-loss estimate from recent error counts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::{ErrorType, MetricRecord, TelemetryRecord};

/// Fleet bandwidth totals in Mbps, from the latest sample per device
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandwidthSummary {
    /// Sum of inbound rates
    pub inbound: f64,
    /// Sum of outbound rates
    pub outbound: f64,
    /// Inbound plus outbound
    pub total: f64,
}

/// Sum the most recent bandwidth sample of every device.
///
/// Older samples are ignored so a device reporting frequently does not
/// dominate the total.
pub fn bandwidth_summary(records: &[TelemetryRecord]) -> BandwidthSummary {
    let mut latest: HashMap<&str, &MetricRecord> = HashMap::new();
    for record in records {
        if let TelemetryRecord::Metric(m) = record {
            latest
                .entry(m.device_id.as_str())
                .and_modify(|current| {
                    if m.timestamp > current.timestamp {
                        *current = m;
                    }
                })
                .or_insert(m);
        }
    }

    let mut summary = BandwidthSummary::default();
    for m in latest.values() {
        summary.inbound += m.bandwidth.inbound;
        summary.outbound += m.bandwidth.outbound;
    }
    summary.total = summary.inbound + summary.outbound;
    summary
}

/// Fleet-wide health averages over metric records
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    /// Mean CPU utilization percent
    pub avg_cpu: f64,
    /// Mean memory utilization percent
    pub avg_memory: f64,
    /// Mean chassis temperature in Celsius
    pub avg_temperature: f64,
}

/// Arithmetic means of cpu, memory, and temperature; zeros when no metric
/// records are present.
pub fn health_summary(records: &[TelemetryRecord]) -> HealthSummary {
    let mut summary = HealthSummary::default();
    let mut n = 0u64;
    for record in records {
        if let TelemetryRecord::Metric(m) = record {
            summary.avg_cpu += m.cpu;
            summary.avg_memory += m.memory;
            summary.avg_temperature += m.temperature;
            n += 1;
        }
    }
    if n > 0 {
        summary.avg_cpu /= n as f64;
        summary.avg_memory /= n as f64;
        summary.avg_temperature /= n as f64;
    }
    summary
}

/// Error counts summed by type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorTotals {
    /// CRC checksum failures
    pub crc: u64,
    /// Fragmented frames
    pub fragments: u64,
    /// Collisions
    pub collisions: u64,
}

impl ErrorTotals {
    /// Sum across all types
    pub fn total(&self) -> u64 {
        self.crc + self.fragments + self.collisions
    }
}

/// Sum error counts per error type over error records.
pub fn error_totals(records: &[TelemetryRecord]) -> ErrorTotals {
    let mut totals = ErrorTotals::default();
    for record in records {
        if let TelemetryRecord::Error(e) = record {
            let count = u64::from(e.count);
            match e.error_type {
                ErrorType::Crc => totals.crc += count,
                ErrorType::Fragment => totals.fragments += count,
                ErrorType::Collision => totals.collisions += count,
            }
        }
    }
    totals
}

/// Packet-loss cap in percent
const PACKET_LOSS_CAP: f64 = 5.0;

/// Estimate packet loss percent from error counts in the hour before `now`.
///
/// Simplified dashboard formula: recent error count / 100, capped at 5%.
pub fn packet_loss(records: &[TelemetryRecord], now: DateTime<Utc>) -> f64 {
    let cutoff = now - Duration::hours(1);
    let recent: u64 = records
        .iter()
        .filter_map(|record| match record {
            TelemetryRecord::Error(e) if e.timestamp > cutoff => Some(u64::from(e.count)),
            _ => None,
        })
        .sum();
    (recent as f64 / 100.0).min(PACKET_LOSS_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Bandwidth, ErrorRecord, Severity};
    use chrono::TimeZone;

    fn metric_at(device: &str, hour: u32, inbound: f64, outbound: f64) -> TelemetryRecord {
        TelemetryRecord::Metric(MetricRecord {
            device_id: device.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 24, hour, 0, 0).unwrap(),
            cpu: 40.0,
            memory: 60.0,
            bandwidth: Bandwidth { inbound, outbound },
            temperature: 50.0,
        })
    }

    fn error_at(hour: u32, error_type: ErrorType, count: u32) -> TelemetryRecord {
        TelemetryRecord::Error(ErrorRecord {
            device_id: "r1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 24, hour, 0, 0).unwrap(),
            error_type,
            severity: Severity::High,
            count,
        })
    }

    #[test]
    fn test_bandwidth_uses_latest_sample_per_device() {
        let records = vec![
            metric_at("r1", 8, 100.0, 50.0),
            metric_at("r1", 10, 300.0, 100.0), // latest for r1
            metric_at("r2", 9, 200.0, 150.0),
        ];
        let summary = bandwidth_summary(&records);
        assert_eq!(summary.inbound, 500.0);
        assert_eq!(summary.outbound, 250.0);
        assert_eq!(summary.total, 750.0);
    }

    #[test]
    fn test_health_summary_averages() {
        let records = vec![
            metric_at("r1", 8, 0.0, 0.0),
            metric_at("r2", 8, 0.0, 0.0),
        ];
        let summary = health_summary(&records);
        assert_eq!(summary.avg_cpu, 40.0);
        assert_eq!(summary.avg_memory, 60.0);
        assert_eq!(summary.avg_temperature, 50.0);
    }

    #[test]
    fn test_health_summary_empty_is_zero() {
        let summary = health_summary(&[]);
        assert_eq!(summary, HealthSummary::default());
    }

    #[test]
    fn test_error_totals_by_type() {
        let records = vec![
            error_at(8, ErrorType::Crc, 3),
            error_at(9, ErrorType::Crc, 2),
            error_at(9, ErrorType::Collision, 7),
        ];
        let totals = error_totals(&records);
        assert_eq!(totals.crc, 5);
        assert_eq!(totals.collisions, 7);
        assert_eq!(totals.fragments, 0);
        assert_eq!(totals.total(), 12);
    }

    #[test]
    fn test_packet_loss_recent_only_and_capped() {
        let now = Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap();
        // Stale error, outside the one-hour cutoff
        let records = vec![error_at(9, ErrorType::Crc, 400)];
        assert_eq!(packet_loss(&records, now), 0.0);

        // 120 recent errors -> 1.2%
        let mut recent = vec![error_at(12, ErrorType::Crc, 120)];
        assert_eq!(packet_loss(&recent, now), 1.2);

        // Cap at 5%
        recent.push(error_at(12, ErrorType::Fragment, 2000));
        assert_eq!(packet_loss(&recent, now), 5.0);
    }
}
