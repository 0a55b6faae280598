//! Event classifier
//!
//! Turns a decoded access-log record into a [`LogEvent`] with a normalized
//! error flag, or discards it when the record cannot identify a serving pool.
//! Discarding is the normal outcome for health checks and records logged
//! before the pool variable is populated, not a fault.

use crate::events::{LogEvent, RawRecord};
use chrono::Utc;
use log::debug;
use serde_json::Value;

/// Sentinel values the log format uses for "no pool"
const MISSING_POOL_SENTINELS: [&str; 2] = ["-", "null"];

/// Classify one decoded record
///
/// Returns `None` when the `pool` field is absent, not a string, empty, or a
/// missing-value sentinel. Otherwise returns an immutable [`LogEvent`] whose
/// `is_error` flag is set when the primary status or any entry of the
/// upstream status chain falls in [500, 600).
pub fn classify(record: &RawRecord) -> Option<LogEvent> {
    let pool = match record.get("pool").and_then(Value::as_str) {
        Some(p) if !p.is_empty() && !MISSING_POOL_SENTINELS.contains(&p) => p.to_string(),
        other => {
            debug!("Skipping record with unusable pool value: {:?}", other);
            return None;
        }
    };

    let status = record.get("status").and_then(parse_status).unwrap_or(0);
    let upstream_status = upstream_chain(record.get("upstream_status"));

    let is_error = is_5xx(status)
        || upstream_status
            .iter()
            .any(|s| s.parse::<i64>().map(is_5xx).unwrap_or(false));

    let timestamp = record
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    Some(LogEvent {
        timestamp,
        pool,
        status,
        upstream_status,
        is_error,
        release: optional_field(record, "release"),
        upstream_addr: optional_field(record, "upstream_addr"),
    })
}

/// Whether a status code is a server error
fn is_5xx(status: i64) -> bool {
    (500..600).contains(&status)
}

/// Parse a status value that may arrive as a JSON number or string
///
/// Values that fail to parse yield `None`; the caller treats them as
/// non-error rather than failing the record.
fn parse_status(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Split the upstream status field into its comma-separated chain
///
/// The proxy appends one entry per upstream it tried, e.g. `"502, 200"`
/// when a retry succeeded. Numbers are accepted for single-entry chains.
fn upstream_chain(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// Carry a string field through verbatim when present and non-empty
fn optional_field(record: &RawRecord, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
