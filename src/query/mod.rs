//! Query descriptor, validation, and evaluation
//!
//! [`QueryDescriptor`] is the one canonical query shape; the dashboard's
//! form-state variants translate into it at the boundary via serde aliases
//! and [`group_by_first`]. Validation happens before evaluation so invalid
//! descriptors never reach the evaluator.

/// Orchestrating evaluator
pub mod evaluator;
/// Result types
pub mod result;
/// Relative time ranges and window resolution
pub mod time_range;

pub use evaluator::QueryEvaluator;
pub use result::{GroupedRow, QueryResult, Summary, TimeSeriesPoint};
pub use time_range::{RangeUnit, ResolvedWindow, TimeRange};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, Result};
use crate::filter::FilterSet;
use crate::record::DataSource;

/// Sort direction for grouped rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// Result-shaping sort applied after aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Row field to sort by (group key or a metric column)
    pub field: String,
    /// Sort direction
    pub direction: Direction,
}

impl FromStr for OrderBy {
    type Err = QueryError;

    /// Parses `"COUNT DESC"` style clauses; direction defaults to ascending.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| QueryError::InvalidDescriptor("empty orderBy clause".to_string()))?
            .to_string();
        let direction = match parts.next() {
            None => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(other) => {
                return Err(QueryError::InvalidDescriptor(format!(
                    "unknown sort direction: {}",
                    other
                )))
            }
        };
        if parts.next().is_some() {
            return Err(QueryError::InvalidDescriptor(format!(
                "malformed orderBy clause: {}",
                s
            )));
        }
        Ok(OrderBy { field, direction })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        write!(f, "{} {}", self.field, dir)
    }
}

/// Canonical, immutable description of a requested analysis.
///
/// Field names and aliases match the dashboard's form state, so both the
/// `visualizeFields`/`whereConditions` and the `metrics`/`filters` variants
/// deserialize into this one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    /// Record kind to read (`network-flows`, `device-metrics`, ...)
    pub data_source: String,
    /// Requested output measures, in output order
    #[serde(alias = "visualizeFields")]
    pub metrics: Vec<String>,
    /// AND-combined filter condition strings
    #[serde(alias = "whereConditions", default)]
    pub filters: Vec<String>,
    /// Discrete grouping key; absent or empty means time bucketing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Sort clause for grouped rows, e.g. `"COUNT DESC"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    /// Maximum number of grouped rows returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Relative window token, e.g. `last_24h`
    pub time_range: String,
}

impl QueryDescriptor {
    /// Start a descriptor for a source, metric list, and time range.
    pub fn new(
        data_source: impl Into<String>,
        metrics: Vec<String>,
        time_range: impl Into<String>,
    ) -> QueryDescriptor {
        QueryDescriptor {
            data_source: data_source.into(),
            metrics,
            filters: Vec::new(),
            group_by: None,
            order_by: None,
            limit: None,
            time_range: time_range.into(),
        }
    }

    /// Set filter conditions
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Set the grouping key
    pub fn with_group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    /// Set the sort clause
    pub fn with_order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    /// Set the row limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check the descriptor without evaluating it.
    ///
    /// Callers surface the error as a validation message; a descriptor that
    /// fails here must not be handed to the evaluator.
    pub fn validate(&self) -> Result<()> {
        self.compile().map(|_| ())
    }

    /// Parse the string-typed fields into an executable plan.
    pub(crate) fn compile(&self) -> Result<QueryPlan> {
        let source: DataSource = self.data_source.parse()?;
        let metrics: Vec<String> = self
            .metrics
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if metrics.is_empty() {
            return Err(QueryError::InvalidDescriptor(
                "at least one metric must be selected".to_string(),
            ));
        }
        let range: TimeRange = self.time_range.parse()?;
        let order_by = match &self.order_by {
            Some(clause) if !clause.trim().is_empty() => Some(clause.parse()?),
            _ => None,
        };
        let group_by = self
            .group_by
            .as_ref()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        Ok(QueryPlan {
            source,
            metrics,
            filters: FilterSet::compile(&self.filters),
            group_by,
            order_by,
            limit: self.limit,
            range,
        })
    }
}

/// Collapse a multi-select groupBy list to the single supported key.
///
/// The aggregation pipeline handles one active grouping dimension; when the
/// UI sends a list, the first non-empty selection wins.
pub fn group_by_first(selections: &[String]) -> Option<String> {
    selections
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Compiled, executable form of a descriptor
#[derive(Debug)]
pub(crate) struct QueryPlan {
    pub source: DataSource,
    pub metrics: Vec<String>,
    pub filters: FilterSet,
    pub group_by: Option<String>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub range: TimeRange,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptor_validates() {
        let descriptor = QueryDescriptor::new(
            "network-flows",
            vec!["COUNT".to_string(), "AVG(latency)".to_string()],
            "last_24h",
        )
        .with_filters(vec!["bytes > 1000000".to_string()])
        .with_order_by("COUNT DESC")
        .with_limit(1000);
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_empty_metrics_rejected() {
        let descriptor = QueryDescriptor::new("network-flows", vec!["  ".to_string()], "last_24h");
        assert!(matches!(
            descriptor.validate(),
            Err(QueryError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_bad_time_range_rejected() {
        let descriptor =
            QueryDescriptor::new("network-flows", vec!["COUNT".to_string()], "yesterday");
        assert!(matches!(
            descriptor.validate(),
            Err(QueryError::InvalidTimeRange(_))
        ));
    }

    #[test]
    fn test_bad_data_source_rejected() {
        let descriptor = QueryDescriptor::new("netflow-v9", vec!["COUNT".to_string()], "last_1h");
        assert!(matches!(
            descriptor.validate(),
            Err(QueryError::UnknownDataSource(_))
        ));
    }

    #[test]
    fn test_order_by_parsing() {
        let clause: OrderBy = "COUNT DESC".parse().unwrap();
        assert_eq!(clause.field, "COUNT");
        assert_eq!(clause.direction, Direction::Desc);

        let clause: OrderBy = "bytes".parse().unwrap();
        assert_eq!(clause.direction, Direction::Asc);

        assert!("COUNT SIDEWAYS".parse::<OrderBy>().is_err());
    }

    #[test]
    fn test_group_by_first_selection_wins() {
        let selections = vec![
            String::new(),
            "protocol".to_string(),
            "device_id".to_string(),
        ];
        assert_eq!(group_by_first(&selections), Some("protocol".to_string()));
        assert_eq!(group_by_first(&[]), None);
    }

    #[test]
    fn test_ui_aliases_deserialize() {
        let json = r#"{
            "dataSource": "network-flows",
            "visualizeFields": ["COUNT", "AVG(latency)"],
            "whereConditions": ["destination_port = 443"],
            "groupBy": "protocol",
            "orderBy": "COUNT DESC",
            "limit": 1000,
            "timeRange": "last_24h"
        }"#;
        let descriptor: QueryDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.metrics.len(), 2);
        assert_eq!(descriptor.filters.len(), 1);
        assert_eq!(descriptor.group_by.as_deref(), Some("protocol"));
    }
}
