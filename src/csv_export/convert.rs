use serde_json::Value;
use std::collections::HashSet;

use crate::models::Record;

/// Flatten heterogeneous records into one uniform CSV document.
///
/// The header is the union of keys across all records in first-seen order.
/// Every field is double-quoted with embedded quotes doubled; rows are
/// joined with `\n`. A record missing a column renders an empty field.
pub fn records_to_csv(records: &[Record]) -> String {
    if records.is_empty() {
        return "No data available".to_string();
    }

    let mut seen = HashSet::new();
    let mut headers: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|header| quote_field(header))
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in records {
        let row = headers
            .iter()
            .map(|header| quote_field(&scalar_text(record.get(*header))))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }

    lines.join("\n")
}

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Absent columns and JSON null both render as the empty string, not the
/// literal "null". Strings are emitted without their JSON quoting.
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
