use crate::events::AlertKind;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Per-kind cooldown clock for preventing notification storms
///
/// Tracks when each alert kind was last successfully delivered and enforces
/// a minimum elapsed time between two notifications of the same kind. Kinds
/// are independent buckets: a failover notification never delays an
/// error-rate notification. Entries are created lazily on first send,
/// overwritten on each subsequent send, and never removed.
#[derive(Debug)]
pub struct CooldownTracker {
    /// Minimum elapsed time between sends of the same kind
    cooldown: Duration,
    /// Timestamp of the last successful send per kind
    last_sent: HashMap<AlertKind, DateTime<Utc>>,
}

impl CooldownTracker {
    /// Create a tracker with the given cooldown in seconds
    ///
    /// A cooldown of zero disables suppression entirely.
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            cooldown: Duration::seconds(cooldown_secs as i64),
            last_sent: HashMap::new(),
        }
    }

    /// Check whether a notification of this kind may be sent now
    pub fn can_send(&self, kind: AlertKind) -> bool {
        self.can_send_at(kind, Utc::now())
    }

    /// Check whether a notification of this kind may be sent at a specific time
    ///
    /// This is primarily used for testing with controlled timestamps.
    pub fn can_send_at(&self, kind: AlertKind, now: DateTime<Utc>) -> bool {
        match self.last_sent.get(&kind) {
            Some(&sent) => now - sent >= self.cooldown,
            None => true,
        }
    }

    /// Record a successful send of this kind at the current time
    pub fn record(&mut self, kind: AlertKind) {
        self.record_at(kind, Utc::now());
    }

    /// Record a successful send of this kind at a specific time
    ///
    /// This is primarily used for testing with controlled timestamps.
    pub fn record_at(&mut self, kind: AlertKind, timestamp: DateTime<Utc>) {
        self.last_sent.insert(kind, timestamp);
    }

    /// Seconds elapsed since the last send of this kind, if any
    pub fn elapsed_secs(&self, kind: AlertKind, now: DateTime<Utc>) -> Option<i64> {
        self.last_sent.get(&kind).map(|&sent| (now - sent).num_seconds())
    }
}
