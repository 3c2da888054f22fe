//! Filter condition parsing and evaluation
//!
//! Conditions arrive as the SQL-ish strings the query builder produces
//! (`protocol IN ("HTTP", "HTTPS")`, `device_id LIKE "r%"`). Each condition
//! is one self-contained comparison; a [`FilterSet`] AND-combines them.
//!
//! Filters never fail a query: an unknown field or a type mismatch evaluates
//! to "no match", and an unparseable condition compiles to a member that
//! matches nothing.

/// Tokenizer for condition strings
pub mod lexer;
/// Token-stream parser
pub mod parser;

use glob::Pattern as GlobPattern;
use thiserror::Error;
use tracing::warn;

use crate::record::{FieldValue, TelemetryRecord};

/// Errors that can occur while parsing a filter condition
#[derive(Debug, Error)]
pub enum FilterParseError {
    /// Character not in the condition grammar
    #[error("Unexpected character: {0:?}")]
    UnexpectedChar(char),

    /// Quoted string missing its closing quote
    #[error("Unterminated string literal")]
    UnterminatedString,

    /// Numeric literal failed to parse
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Token out of place for the grammar
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the parser wanted
        expected: String,
        /// What it got
        found: String,
    },

    /// Condition ended mid-comparison
    #[error("Unexpected end of condition")]
    UnexpectedEof,

    /// LIKE pattern did not compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// One parsed comparison against a record field
#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// `field = value`
    Eq {
        /// Field name
        field: String,
        /// Literal to compare against
        value: FieldValue,
    },
    /// `field IN (v1, v2, ...)`
    In {
        /// Field name
        field: String,
        /// Accepted literals
        values: Vec<FieldValue>,
    },
    /// `field BETWEEN low AND high` (inclusive on both ends)
    Between {
        /// Field name
        field: String,
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },
    /// `field > value`
    Gt {
        /// Field name
        field: String,
        /// Threshold
        value: f64,
    },
    /// `field < value`
    Lt {
        /// Field name
        field: String,
        /// Threshold
        value: f64,
    },
    /// `field LIKE "pattern%"` with SQL wildcards
    Like {
        /// Field name
        field: String,
        /// Compiled glob, `%` mapped to `*` and `_` to `?`
        pattern: GlobPattern,
    },
    /// A condition that matches nothing; stands in for unparseable input
    Never,
}

impl FilterExpr {
    /// Parse a condition string into an expression.
    pub fn parse(condition: &str) -> Result<FilterExpr, FilterParseError> {
        let tokens = lexer::tokenize(condition)?;
        parser::parse(&tokens)
    }

    /// Build a LIKE expression, translating SQL wildcards to glob syntax.
    pub fn like(field: String, pattern: &str) -> Result<FilterExpr, FilterParseError> {
        let mut translated = String::with_capacity(pattern.len() + 2);
        for ch in pattern.chars() {
            match ch {
                '%' => translated.push('*'),
                '_' => translated.push('?'),
                // Glob metacharacters in the literal part must stay literal
                '*' | '?' | '[' | ']' => {
                    translated.push_str(&GlobPattern::escape(&ch.to_string()))
                }
                other => translated.push(other),
            }
        }
        let glob = GlobPattern::new(&translated)
            .map_err(|e| FilterParseError::InvalidPattern(e.to_string()))?;
        Ok(FilterExpr::Like {
            field,
            pattern: glob,
        })
    }

    /// Evaluate this comparison against a record.
    ///
    /// Stateless and order-independent; unknown fields yield `false`.
    pub fn matches(&self, record: &TelemetryRecord) -> bool {
        match self {
            FilterExpr::Eq { field, value } => match record.field(field) {
                Some(actual) => literal_eq(&actual, value),
                None => false,
            },
            FilterExpr::In { field, values } => match record.field(field) {
                Some(actual) => values.iter().any(|v| literal_eq(&actual, v)),
                None => false,
            },
            FilterExpr::Between { field, low, high } => match numeric(record, field) {
                Some(n) => *low <= n && n <= *high,
                None => false,
            },
            FilterExpr::Gt { field, value } => match numeric(record, field) {
                Some(n) => n > *value,
                None => false,
            },
            FilterExpr::Lt { field, value } => match numeric(record, field) {
                Some(n) => n < *value,
                None => false,
            },
            FilterExpr::Like { field, pattern } => match record.field(field) {
                Some(actual) => match actual.as_str() {
                    Some(s) => pattern.matches(s),
                    None => false,
                },
                None => false,
            },
            FilterExpr::Never => false,
        }
    }
}

fn numeric(record: &TelemetryRecord, field: &str) -> Option<f64> {
    record.field(field).and_then(|v| v.as_f64())
}

fn literal_eq(actual: &FieldValue, literal: &FieldValue) -> bool {
    match literal.as_str() {
        Some(s) => actual.as_str() == Some(s),
        None => match (actual.as_f64(), literal.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// AND-combined set of filter conditions
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    exprs: Vec<FilterExpr>,
}

impl FilterSet {
    /// Compile a set of condition strings.
    ///
    /// Unparseable conditions are kept as never-matching members so a typo
    /// silently excludes records instead of failing the query.
    pub fn compile(conditions: &[String]) -> FilterSet {
        let exprs = conditions
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|condition| match FilterExpr::parse(condition) {
                Ok(expr) => expr,
                Err(err) => {
                    warn!(condition = %condition, error = %err, "unparseable filter condition, matching nothing");
                    FilterExpr::Never
                }
            })
            .collect();
        FilterSet { exprs }
    }

    /// Whether a record satisfies every condition in the set.
    pub fn matches(&self, record: &TelemetryRecord) -> bool {
        self.exprs.iter().all(|expr| expr.matches(record))
    }

    /// Number of active conditions
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// True when no conditions are active
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}
