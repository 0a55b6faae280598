//! Sliding request window
//!
//! Bounded most-recent-N buffer of classified events used to compute the
//! trailing error rate. Strict ring-buffer semantics: when at capacity,
//! appending evicts the oldest event.

use crate::events::LogEvent;
use std::collections::VecDeque;

/// Bounded FIFO of the last N classified events
///
/// Owned exclusively by the run loop. The window never decides whether to
/// alert; it only reports the current rate and whether it has filled, which
/// the loop uses to gate the error-rate check (a partially filled window is
/// statistically unreliable).
#[derive(Debug)]
pub struct SlidingWindow {
    events: VecDeque<LogEvent>,
    capacity: usize,
    error_count: usize,
}

impl SlidingWindow {
    /// Create a window holding at most `capacity` events
    ///
    /// Capacity is validated to be >= 1 at configuration time.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            error_count: 0,
        }
    }

    /// Append an event, evicting the oldest when at capacity
    pub fn observe(&mut self, event: LogEvent) {
        if self.events.len() == self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                if evicted.is_error {
                    self.error_count -= 1;
                }
            }
        }
        if event.is_error {
            self.error_count += 1;
        }
        self.events.push_back(event);
    }

    /// Current error rate as a percentage of the window
    ///
    /// Returns 0.0 on an empty window; never divides by zero.
    pub fn error_rate(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        100.0 * self.error_count as f64 / self.events.len() as f64
    }

    /// Whether the window has reached its configured capacity
    pub fn is_full(&self) -> bool {
        self.events.len() == self.capacity
    }

    /// Number of events currently held
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the window holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of error events currently in the window
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
