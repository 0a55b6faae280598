//! Pool transition detector
//!
//! Small state machine over the pool label of each event. Only the two
//! directional transitions between the designated primary and backup pools
//! carry operational meaning; a deployment legitimately cycles other pool
//! labels (canary testing, manual toggles), so any other change is logged
//! and otherwise ignored.

use crate::events::LogEvent;
use log::{debug, info};

/// Signal emitted when the serving pool changes between the designated pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Primary stopped serving; backup took over
    Failover,
    /// Primary resumed serving after a failover
    Recovery,
}

/// Tracks the last-observed pool and classifies pool changes
///
/// One mutable instance, owned by the run loop. State updates on every
/// observed event after the transition is evaluated.
#[derive(Debug)]
pub struct PoolTransitionDetector {
    last_seen_pool: Option<String>,
    expected_primary: String,
    expected_backup: String,
}

impl PoolTransitionDetector {
    pub fn new(expected_primary: impl Into<String>, expected_backup: impl Into<String>) -> Self {
        Self {
            last_seen_pool: None,
            expected_primary: expected_primary.into(),
            expected_backup: expected_backup.into(),
        }
    }

    /// Observe one event and report the transition it completes, if any
    ///
    /// The first observation only seeds the state. A repeated pool emits
    /// nothing. A change emits `Failover` for primary→backup, `Recovery`
    /// for backup→primary, and nothing for any other pair.
    pub fn observe(&mut self, event: &LogEvent) -> Option<Transition> {
        let pool = &event.pool;
        let transition = match self.last_seen_pool.as_deref() {
            None => {
                debug!("First observed pool: {}", pool);
                None
            }
            Some(prev) if prev == pool => None,
            Some(prev) => {
                if prev == self.expected_primary && *pool == self.expected_backup {
                    info!("Pool change {} -> {}: failover", prev, pool);
                    Some(Transition::Failover)
                } else if prev == self.expected_backup && *pool == self.expected_primary {
                    info!("Pool change {} -> {}: recovery", prev, pool);
                    Some(Transition::Recovery)
                } else {
                    info!("Unclassified pool change {} -> {}", prev, pool);
                    None
                }
            }
        };
        self.last_seen_pool = Some(pool.clone());
        transition
    }

    /// Pool observed on the most recent event, if any
    pub fn last_seen_pool(&self) -> Option<&str> {
        self.last_seen_pool.as_deref()
    }
}
