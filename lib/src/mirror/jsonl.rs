// lib/src/mirror/jsonl.rs
// Line-delimited JSON mirrors: one object per line.

use serde_json::{Map, Value};

use models::MirrorRow;

use crate::errors::SyncError;

/// Rewrites the first record whose key field equals `row`'s key. Returns
/// `None` when no record matches. Every other line is kept byte for byte.
pub fn apply_row(content: &str, row: &MirrorRow, path: &str) -> Result<Option<String>, SyncError> {
    let mut out = String::with_capacity(content.len() + 64);
    let mut matched = false;

    for (index, raw_line) in content.split_inclusive('\n').enumerate() {
        let line = raw_line.trim_end_matches(['\n', '\r']);
        if matched || line.trim().is_empty() {
            out.push_str(raw_line);
            continue;
        }
        let mut record = parse_record(line, path, index + 1)?;
        if !key_matches(record.get(row.key_field()), row.key()) {
            out.push_str(raw_line);
            continue;
        }
        for (field, value) in row.fields() {
            record.insert((*field).to_string(), Value::String(value.clone()));
        }
        out.push_str(&Value::Object(record).to_string());
        out.push_str(&raw_line[line.len()..]);
        matched = true;
    }

    Ok(matched.then_some(out))
}

fn parse_record(line: &str, path: &str, line_number: usize) -> Result<Map<String, Value>, SyncError> {
    let malformed = |reason: String| SyncError::MalformedRecord { path: path.to_string(), line: line_number, reason };
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(malformed(format!("expected an object, found {}", kind(&other)))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

/// Keys may be stored as JSON numbers (integral floats included) or as strings.
fn key_matches(value: Option<&Value>, key: &str) -> bool {
    match value {
        Some(Value::Number(n)) => match key.parse::<i64>() {
            Ok(k) => n.as_i64() == Some(k) || n.as_f64() == Some(k as f64),
            Err(_) => n.to_string() == key,
        },
        Some(Value::String(s)) => s.trim() == key,
        _ => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
