//! Record store seam
//!
//! The evaluator reads records through [`RecordStore`], an injected
//! collaborator. Any implementation honoring the read contract (time-window
//! fetch per data source, tolerant of concurrent read-only access) is
//! substitutable: the in-memory store here, the randomized synthetic store,
//! or a real database behind the same trait.

use async_trait::async_trait;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::query::time_range::ResolvedWindow;
use crate::record::{
    Bandwidth, DataSource, ErrorRecord, ErrorType, MetricRecord, Protocol, Severity,
    TelemetryRecord, TrafficRecord,
};

/// Read-only supplier of telemetry records for a time window
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all records of the given source kind with timestamps inside the
    /// window. Read failures surface as [`crate::QueryError::Store`].
    async fn fetch_records(
        &self,
        source: DataSource,
        window: &ResolvedWindow,
    ) -> Result<Vec<TelemetryRecord>>;
}

/// In-memory record store backed by a fixed record set
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<TelemetryRecord>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store over a fixed record set
    pub fn with_records(records: Vec<TelemetryRecord>) -> Self {
        MemoryStore { records }
    }

    /// Append a record
    pub fn push(&mut self, record: TelemetryRecord) {
        self.records.push(record);
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_records(
        &self,
        source: DataSource,
        window: &ResolvedWindow,
    ) -> Result<Vec<TelemetryRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| source.includes(r) && window.contains(r.timestamp()))
            .cloned()
            .collect())
    }
}

/// Device fleet used by the synthetic store
const FLEET: &[&str] = &["r1", "r2", "s1", "f1", "srv1"];

const PROTOCOLS: &[Protocol] = &[
    Protocol::Http,
    Protocol::Https,
    Protocol::Tcp,
    Protocol::Udp,
    Protocol::Icmp,
];

const ERROR_TYPES: &[ErrorType] = &[ErrorType::Crc, ErrorType::Fragment, ErrorType::Collision];

const SEVERITIES: &[Severity] = &[Severity::Low, Severity::Medium, Severity::High];

/// Randomized record store standing in for a real backend.
///
/// Generates one record per device per hour across the requested window with
/// plausible value ranges. Useful for demos and exploratory testing; the
/// evaluator itself is defined over any conforming record set.
pub struct SyntheticStore {
    rng: Mutex<StdRng>,
}

impl SyntheticStore {
    /// Create a store seeded from entropy
    pub fn new() -> Self {
        SyntheticStore {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a store with a fixed seed for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        SyntheticStore {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for SyntheticStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for SyntheticStore {
    async fn fetch_records(
        &self,
        source: DataSource,
        window: &ResolvedWindow,
    ) -> Result<Vec<TelemetryRecord>> {
        let mut rng = self.rng.lock().await;
        let hours = ((window.end - window.start).num_hours()).max(1);
        let mut records = Vec::new();

        for hour in 0..hours {
            let timestamp = window.start + Duration::hours(hour);
            for device in FLEET {
                match source {
                    DataSource::Metrics => {
                        records.push(TelemetryRecord::Metric(MetricRecord {
                            device_id: (*device).to_string(),
                            timestamp,
                            cpu: rng.gen_range(20.0..90.0),
                            memory: rng.gen_range(30.0..85.0),
                            bandwidth: Bandwidth {
                                inbound: rng.gen_range(100.0..1000.0),
                                outbound: rng.gen_range(50.0..800.0),
                            },
                            temperature: rng.gen_range(35.0..75.0),
                        }));
                    }
                    DataSource::Errors => {
                        // Errors are sparse
                        if rng.gen_bool(0.3) {
                            records.push(TelemetryRecord::Error(ErrorRecord {
                                device_id: (*device).to_string(),
                                timestamp,
                                error_type: ERROR_TYPES[rng.gen_range(0..ERROR_TYPES.len())],
                                severity: SEVERITIES[rng.gen_range(0..SEVERITIES.len())],
                                count: rng.gen_range(1..20),
                            }));
                        }
                    }
                    DataSource::Flows => {
                        records.push(TelemetryRecord::Traffic(TrafficRecord {
                            device_id: (*device).to_string(),
                            timestamp,
                            protocol: PROTOCOLS[rng.gen_range(0..PROTOCOLS.len())],
                            bytes: rng.gen_range(1_000..100_000_000),
                            packets: rng.gen_range(10..10_000),
                            flows: rng.gen_range(1..100),
                            duration_ms: rng.gen_range(5.0..200.0),
                        }));
                    }
                }
            }
        }

        Ok(records)
    }
}
