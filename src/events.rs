//! Core event types for the pool watcher
//!
//! This module defines the data structures shared between the classifier,
//! the sliding window, the transition detector and the alert dispatcher.

use serde::{Deserialize, Serialize};

/// A decoded access-log record before classification
///
/// Produced by the record decoder from one raw log line. Field names and
/// values are whatever the log format emits; the classifier decides what
/// is usable.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A classified access-log event
///
/// Built once per valid log record by the classifier and never mutated
/// afterwards. The `release` and `upstream_addr` fields are carried through
/// verbatim for inclusion in alert text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEvent {
    /// Timestamp string from the log record (RFC 3339 of arrival when absent)
    pub timestamp: String,
    /// Pool that served the request (e.g. "blue", "green")
    pub pool: String,
    /// Primary HTTP status code, 0 when unparseable
    pub status: i64,
    /// Upstream status chain, one entry per attempted upstream
    pub upstream_status: Vec<String>,
    /// Whether any status in this event is a 5xx
    pub is_error: bool,
    /// Release identifier, when the log record carries one
    pub release: Option<String>,
    /// Upstream address, when the log record carries one
    pub upstream_addr: Option<String>,
}

/// Kind of operator alert
///
/// Closed enumeration; each kind has an independent cooldown bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Traffic shifted from the designated primary pool to the backup pool
    Failover,
    /// Traffic shifted back from the backup pool to the primary pool
    Recovery,
    /// Rolling error rate exceeded the configured threshold
    ErrorRate,
    /// Informational notification (startup announcement)
    Info,
}

impl AlertKind {
    /// Wire name used in the notification payload and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Failover => "failover",
            AlertKind::Recovery => "recovery",
            AlertKind::ErrorRate => "error_rate",
            AlertKind::Info => "info",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully formatted alert waiting for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    pub kind: AlertKind,
    pub message: String,
}
