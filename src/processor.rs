//! Per-event processing pipeline
//!
//! Deterministic composition of classifier, sliding window and transition
//! detector. Each decoded record yields zero or more alert requests; the
//! run loop forwards those to the dispatcher. Keeping the pipeline free of
//! channels and clocks makes the alerting logic unit-testable end to end.

use crate::classifier::classify;
use crate::config::Config;
use crate::detector::{PoolTransitionDetector, Transition};
use crate::events::{AlertKind, AlertRequest, RawRecord};
use crate::window::SlidingWindow;
use crate::{alerts::messages, events::LogEvent};
use log::{debug, info};

/// How often progress is logged, in processed records
const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Classifies records, tracks state, and produces alert requests
pub struct EventProcessor {
    window: SlidingWindow,
    detector: PoolTransitionDetector,
    error_rate_threshold: f64,
    check_interval: u32,
    events_since_check: u32,
    records_processed: u64,
    records_skipped: u64,
}

impl EventProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            window: SlidingWindow::new(config.window_size),
            detector: PoolTransitionDetector::new(
                config.primary_pool.clone(),
                config.backup_pool.clone(),
            ),
            error_rate_threshold: config.error_rate_threshold,
            check_interval: config.check_interval,
            events_since_check: 0,
            records_processed: 0,
            records_skipped: 0,
        }
    }

    /// Process one decoded record and return any alerts it triggers
    ///
    /// Order within one event: the pool transition is evaluated before the
    /// error-rate check, and both may fire on the same event. The error rate
    /// is only evaluated once the window is full, every `check_interval`-th
    /// event from then on.
    pub fn process(&mut self, record: &RawRecord) -> Vec<AlertRequest> {
        let event = match classify(record) {
            Some(event) => event,
            None => {
                self.records_skipped += 1;
                return Vec::new();
            }
        };

        self.records_processed += 1;
        if self.records_processed % PROGRESS_LOG_INTERVAL == 0 {
            info!(
                "Processed {} records ({} skipped), window at {}/{}",
                self.records_processed,
                self.records_skipped,
                self.window.len(),
                self.window.capacity()
            );
        }

        let mut requests = Vec::new();

        self.window.observe(event.clone());

        let previous_pool = self.detector.last_seen_pool().map(str::to_string);
        if let Some(transition) = self.detector.observe(&event) {
            // A transition implies a previous pool was observed
            let from = previous_pool.unwrap_or_default();
            requests.push(self.transition_request(transition, &event, &from));
        }

        if let Some(request) = self.error_rate_check(&event) {
            requests.push(request);
        }

        requests
    }

    fn transition_request(
        &self,
        transition: Transition,
        event: &LogEvent,
        from_pool: &str,
    ) -> AlertRequest {
        match transition {
            Transition::Failover => AlertRequest {
                kind: AlertKind::Failover,
                message: messages::failover(event, from_pool),
            },
            Transition::Recovery => AlertRequest {
                kind: AlertKind::Recovery,
                message: messages::recovery(event, from_pool),
            },
        }
    }

    /// Evaluate the rolling error rate if the window permits
    fn error_rate_check(&mut self, event: &LogEvent) -> Option<AlertRequest> {
        if !self.window.is_full() {
            return None;
        }

        self.events_since_check += 1;
        if self.events_since_check < self.check_interval {
            return None;
        }
        self.events_since_check = 0;

        let rate = self.window.error_rate();
        debug!(
            "Error rate {:.2}% (threshold {}%)",
            rate, self.error_rate_threshold
        );
        if rate <= self.error_rate_threshold {
            return None;
        }

        Some(AlertRequest {
            kind: AlertKind::ErrorRate,
            message: messages::error_rate(
                rate,
                self.error_rate_threshold,
                self.window.error_count(),
                self.window.capacity(),
                event,
            ),
        })
    }

    /// Pool observed on the most recent classified event, if any
    pub fn last_seen_pool(&self) -> Option<&str> {
        self.detector.last_seen_pool()
    }

    /// Number of records classified and processed so far
    pub fn records_processed(&self) -> u64 {
        self.records_processed
    }

    /// Number of records discarded by classification so far
    pub fn records_skipped(&self) -> u64 {
        self.records_skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Config {
        let mut full = vec![
            "poolwatch",
            "--slack-webhook-url",
            "https://hooks.example/T/X",
        ];
        full.extend_from_slice(args);
        Config::try_parse_from(full).unwrap()
    }

    fn record(pool: &str, status: i64) -> RawRecord {
        serde_json::json!({ "pool": pool, "status": status })
            .as_object()
            .unwrap()
            .clone()
    }

    fn kinds(requests: &[AlertRequest]) -> Vec<AlertKind> {
        requests.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_skipped_records_are_counted_and_produce_nothing() {
        let mut processor = EventProcessor::new(&config(&[]));
        let rec = serde_json::json!({ "status": 200 }).as_object().unwrap().clone();

        assert!(processor.process(&rec).is_empty());
        assert_eq!(processor.records_skipped(), 1);
        assert_eq!(processor.records_processed(), 0);
    }

    #[test]
    fn test_failover_fires_on_third_event_only() {
        let mut processor = EventProcessor::new(&config(&[]));

        assert!(processor.process(&record("blue", 200)).is_empty());
        assert!(processor.process(&record("blue", 200)).is_empty());
        let requests = processor.process(&record("green", 200));
        assert_eq!(kinds(&requests), vec![AlertKind::Failover]);
    }

    #[test]
    fn test_failover_then_recovery() {
        let mut processor = EventProcessor::new(&config(&[]));

        processor.process(&record("blue", 200));
        let failover = processor.process(&record("green", 200));
        let recovery = processor.process(&record("blue", 200));
        assert_eq!(kinds(&failover), vec![AlertKind::Failover]);
        assert_eq!(kinds(&recovery), vec![AlertKind::Recovery]);
    }

    #[test]
    fn test_failover_message_names_previous_pool() {
        let mut processor = EventProcessor::new(&config(&[]));
        processor.process(&record("blue", 200));
        let requests = processor.process(&record("green", 200));
        assert!(requests[0].message.contains("`blue`"));
        assert!(requests[0].message.contains("`green`"));
    }

    #[test]
    fn test_error_rate_not_checked_below_capacity() {
        let mut processor = EventProcessor::new(&config(&["--window-size", "3"]));

        // Two all-error events: rate would be 100% but the window is not full
        assert!(processor.process(&record("blue", 500)).is_empty());
        assert!(processor.process(&record("blue", 500)).is_empty());

        // Third fills the window and triggers the check
        let requests = processor.process(&record("blue", 500));
        assert_eq!(kinds(&requests), vec![AlertKind::ErrorRate]);
    }

    #[test]
    fn test_error_rate_respects_threshold_strictly() {
        // 1 error out of 4 = 25%; threshold exactly 25 must not fire
        let mut processor = EventProcessor::new(&config(&[
            "--window-size",
            "4",
            "--error-rate-threshold",
            "25.0",
        ]));

        processor.process(&record("blue", 500));
        processor.process(&record("blue", 200));
        processor.process(&record("blue", 200));
        assert!(processor.process(&record("blue", 200)).is_empty());
    }

    #[test]
    fn test_transition_and_error_rate_can_fire_on_same_event() {
        let mut processor = EventProcessor::new(&config(&["--window-size", "2"]));

        processor.process(&record("blue", 500));
        // Window fills, rate 100%, and the pool changes on the same event;
        // transition is evaluated first
        let requests = processor.process(&record("green", 500));
        assert_eq!(
            kinds(&requests),
            vec![AlertKind::Failover, AlertKind::ErrorRate]
        );
    }

    #[test]
    fn test_check_interval_skips_events() {
        let mut processor = EventProcessor::new(&config(&[
            "--window-size",
            "2",
            "--check-interval",
            "3",
        ]));

        processor.process(&record("blue", 500));
        // Window full from here; checks happen on every 3rd full-window event
        assert!(processor.process(&record("blue", 500)).is_empty());
        assert!(processor.process(&record("blue", 500)).is_empty());
        let requests = processor.process(&record("blue", 500));
        assert_eq!(kinds(&requests), vec![AlertKind::ErrorRate]);
        // Counter reset; next two produce nothing
        assert!(processor.process(&record("blue", 500)).is_empty());
        assert!(processor.process(&record("blue", 500)).is_empty());
    }

    #[test]
    fn test_unclassified_pool_changes_produce_no_requests() {
        let mut processor = EventProcessor::new(&config(&[]));

        processor.process(&record("blue", 200));
        assert!(processor.process(&record("canary", 200)).is_empty());
        assert_eq!(processor.last_seen_pool(), Some("canary"));
    }
}
