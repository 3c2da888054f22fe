//! Telemetry record model
//!
//! Records are immutable, timestamped facts about a device. The model is a
//! closed set of kinds (metric, error, traffic) with a serde discriminant;
//! consumers pattern-match on the kind instead of probing dynamic maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::QueryError;

/// Error event classification on an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// CRC checksum failure
    #[serde(rename = "CRC")]
    Crc,
    /// Fragmented frame
    Fragment,
    /// Collision on a shared segment
    Collision,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::Crc => write!(f, "CRC"),
            ErrorType::Fragment => write!(f, "Fragment"),
            ErrorType::Collision => write!(f, "Collision"),
        }
    }
}

/// Severity of an error event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Low,
    /// Worth watching
    Medium,
    /// Needs attention
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Protocol observed on a traffic flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Plain HTTP
    Http,
    /// HTTP over TLS
    Https,
    /// Raw TCP
    Tcp,
    /// UDP datagrams
    Udp,
    /// ICMP control traffic
    Icmp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
        };
        write!(f, "{}", s)
    }
}

/// Inbound/outbound bandwidth sample in Mbps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bandwidth {
    /// Traffic into the device
    pub inbound: f64,
    /// Traffic out of the device
    pub outbound: f64,
}

/// Periodic health sample for a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Owning device
    pub device_id: String,
    /// Sample instant
    pub timestamp: DateTime<Utc>,
    /// CPU utilization percent
    pub cpu: f64,
    /// Memory utilization percent
    pub memory: f64,
    /// Interface bandwidth sample
    pub bandwidth: Bandwidth,
    /// Chassis temperature in Celsius
    pub temperature: f64,
}

/// Error counter event on a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    /// Owning device
    pub device_id: String,
    /// Event instant
    pub timestamp: DateTime<Utc>,
    /// Error classification
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    /// Event severity
    pub severity: Severity,
    /// Number of errors observed in the interval
    pub count: u32,
}

/// Aggregated flow sample on a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRecord {
    /// Owning device
    pub device_id: String,
    /// Sample instant
    pub timestamp: DateTime<Utc>,
    /// Flow protocol
    pub protocol: Protocol,
    /// Bytes transferred
    pub bytes: u64,
    /// Packets transferred
    pub packets: u64,
    /// Distinct flows in the sample
    pub flows: u64,
    /// Mean flow duration in milliseconds; backs the `latency` metric
    pub duration_ms: f64,
}

/// A single telemetry fact, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryRecord {
    /// Device health sample
    Metric(MetricRecord),
    /// Error counter event
    Error(ErrorRecord),
    /// Traffic flow sample
    Traffic(TrafficRecord),
}

impl TelemetryRecord {
    /// Owning device id
    pub fn device_id(&self) -> &str {
        match self {
            TelemetryRecord::Metric(m) => &m.device_id,
            TelemetryRecord::Error(e) => &e.device_id,
            TelemetryRecord::Traffic(t) => &t.device_id,
        }
    }

    /// Record instant
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TelemetryRecord::Metric(m) => m.timestamp,
            TelemetryRecord::Error(e) => e.timestamp,
            TelemetryRecord::Traffic(t) => t.timestamp,
        }
    }

    /// Select a field by its query-language name.
    ///
    /// Returns `None` for names the record kind does not carry, so filters
    /// referencing unknown fields exclude the record instead of erroring.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        if name == "device_id" {
            return Some(FieldValue::str(self.device_id()));
        }
        match self {
            TelemetryRecord::Metric(m) => match name {
                "cpu" => Some(FieldValue::Float(m.cpu)),
                "memory" => Some(FieldValue::Float(m.memory)),
                "temperature" => Some(FieldValue::Float(m.temperature)),
                "inbound" => Some(FieldValue::Float(m.bandwidth.inbound)),
                "outbound" => Some(FieldValue::Float(m.bandwidth.outbound)),
                "total" => Some(FieldValue::Float(m.bandwidth.inbound + m.bandwidth.outbound)),
                _ => None,
            },
            TelemetryRecord::Error(e) => match name {
                "error_type" | "type" => Some(FieldValue::str(e.error_type.to_string())),
                "severity" => Some(FieldValue::str(e.severity.to_string())),
                "count" => Some(FieldValue::Int(i64::from(e.count))),
                _ => None,
            },
            TelemetryRecord::Traffic(t) => match name {
                "protocol" => Some(FieldValue::str(t.protocol.to_string())),
                "bytes" => Some(FieldValue::Int(t.bytes as i64)),
                "packets" => Some(FieldValue::Int(t.packets as i64)),
                "flows" => Some(FieldValue::Int(t.flows as i64)),
                "latency" | "duration_ms" => Some(FieldValue::Float(t.duration_ms)),
                _ => None,
            },
        }
    }
}

/// Value selected from a record field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// String value - Arc for cheap cloning
    Str(Arc<str>),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
}

impl FieldValue {
    /// Build a string value
    pub fn str(s: impl AsRef<str>) -> Self {
        FieldValue::Str(Arc::from(s.as_ref()))
    }

    /// String view, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Str(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Which record kind a query reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    /// Device health samples
    Metrics,
    /// Error counter events
    Errors,
    /// Traffic flow samples
    Flows,
}

impl DataSource {
    /// Whether a record belongs to this source
    pub fn includes(&self, record: &TelemetryRecord) -> bool {
        matches!(
            (self, record),
            (DataSource::Metrics, TelemetryRecord::Metric(_))
                | (DataSource::Errors, TelemetryRecord::Error(_))
                | (DataSource::Flows, TelemetryRecord::Traffic(_))
        )
    }
}

impl FromStr for DataSource {
    type Err = QueryError;

    /// Accepts both the canonical source tokens and the predefined query ids
    /// the dashboard sends (`bandwidth_usage`, `device_health`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "device-metrics" | "metrics" | "bandwidth_usage" | "device_health" => {
                Ok(DataSource::Metrics)
            }
            "network-errors" | "errors" | "network_errors" => Ok(DataSource::Errors),
            "network-flows" | "flows" | "traffic" | "traffic_patterns" => Ok(DataSource::Flows),
            other => Err(QueryError::UnknownDataSource(other.to_string())),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataSource::Metrics => "device-metrics",
            DataSource::Errors => "network-errors",
            DataSource::Flows => "network-flows",
        };
        write!(f, "{}", s)
    }
}
