//! CSV export of query results
//!
//! Best-effort serialization for download. Row order matches the result's
//! row order exactly; fields containing commas, quotes, or newlines are
//! quoted with doubled quotes.

use serde_json::Value;

use crate::query::result::{GroupedRow, TimeSeriesPoint};

/// Serialize grouped rows to CSV.
///
/// Columns come from the first row's keys, which follow the requested metric
/// order. Rows missing a column emit an empty field.
pub fn grouped_to_csv(rows: &[GroupedRow]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut out = String::new();
    push_row(&mut out, columns.iter().copied());
    for row in rows {
        let fields: Vec<String> = columns
            .iter()
            .map(|column| row.get(*column).map(format_value).unwrap_or_default())
            .collect();
        push_row(&mut out, fields.iter().map(String::as_str));
    }
    out
}

/// Serialize a time series to CSV with `time,value[,latency]` columns.
///
/// The latency column is included when any point carries one; points
/// without it emit an empty field.
pub fn time_series_to_csv(points: &[TimeSeriesPoint]) -> String {
    let with_latency = points.iter().any(|p| p.latency.is_some());
    let mut out = String::new();
    if with_latency {
        push_row(&mut out, ["time", "value", "latency"]);
    } else {
        push_row(&mut out, ["time", "value"]);
    }

    for point in points {
        let time = point.time.to_rfc3339();
        let value = format_number(point.value);
        if with_latency {
            let latency = point.latency.map(format_number).unwrap_or_default();
            push_row(&mut out, [time.as_str(), value.as_str(), latency.as_str()]);
        } else {
            push_row(&mut out, [time.as_str(), value.as_str()]);
        }
    }
    out
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        out.push('"');
        for ch in field.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_number(value: f64) -> String {
    // Trim the trailing .0 the way the UI renders whole numbers
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
