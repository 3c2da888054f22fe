//! Ad-hoc query evaluation engine for network telemetry
//!
//! This library takes a structured query description (data source, metrics,
//! filter predicates, grouping, time range, ordering, limit) and produces a
//! tabular or time-series result set over telemetry records supplied by an
//! injected record store. It also provides the derived-metric rollups
//! (bandwidth totals, device health averages, error and packet-loss
//! summaries) a dashboard builds its stat cards from.
//!
//! # Example
//!
//! ```no_run
//! use netquery::{QueryDescriptor, QueryEvaluator, SyntheticStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let descriptor = QueryDescriptor::new(
//!     "network-flows",
//!     vec!["COUNT".to_string(), "AVG(latency)".to_string()],
//!     "last_24h",
//! )
//! .with_filters(vec!["protocol IN (\"HTTP\", \"HTTPS\")".to_string()])
//! .with_limit(1000);
//!
//! descriptor.validate()?;
//!
//! let store = SyntheticStore::new();
//! let result = QueryEvaluator::new().evaluate(&descriptor, &store).await?;
//! tracing::info!(points = result.time_series_data.len(), "query evaluated");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

// Re-export commonly used items
pub use error::{QueryError, Result};
pub use query::{
    group_by_first, Direction, OrderBy, QueryDescriptor, QueryEvaluator, QueryResult,
    ResolvedWindow, Summary, TimeRange, TimeSeriesPoint,
};
pub use record::{DataSource, FieldValue, TelemetryRecord};
pub use store::{MemoryStore, RecordStore, SyntheticStore};

/// Telemetry record model
pub mod record;

/// Error types
pub mod error;

/// Filter condition parsing and evaluation
pub mod filter;

/// Grouping and time bucketing
pub mod bucket;

/// Metric reductions over buckets
pub mod aggregate;

/// Query descriptor, validation, and the orchestrating evaluator
pub mod query;

/// Record store seam and built-in implementations
pub mod store;

/// Derived-metric rollups for dashboard summaries
pub mod rollup;

/// CSV export of results
pub mod export;
