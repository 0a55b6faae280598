//! Watcher composition root
//!
//! Wires the tail collector, the per-event processor and the alert
//! dispatcher together. Records flow over an unbounded channel from the
//! collector thread into the run loop; alert requests flow over a bounded
//! channel to a dedicated notifier thread, so a slow or unreachable webhook
//! never stalls log ingestion. Alerts of the same kind keep their arrival
//! order, which is all the cooldown logic requires.

use crate::alerts::slack::Notifier;
use crate::alerts::{messages, AlertDispatcher, SlackNotifier};
use crate::collectors::TailCollector;
use crate::config::Config;
use crate::error::{CollectorError, NotifyError};
use crate::events::{AlertKind, AlertRequest, RawRecord};
use crate::processor::EventProcessor;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Capacity of the bounded alert queue between the run loop and the
/// notifier thread; overflow drops the newest request with a warning
const ALERT_QUEUE_CAPACITY: usize = 64;

/// The running watcher: collector, processor, and notifier thread
pub struct Watcher {
    config: Config,
    collector: TailCollector,
    record_receiver: Receiver<RawRecord>,
    processor: EventProcessor,
    alert_sender: Option<SyncSender<AlertRequest>>,
    notifier_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl Watcher {
    /// Create a watcher delivering alerts to the configured Slack webhook
    pub fn new(config: Config) -> Result<Self, NotifyError> {
        let notifier = SlackNotifier::new(config.slack_webhook_url.clone())?;
        Ok(Self::with_notifier(config, Box::new(notifier)))
    }

    /// Create a watcher with a custom notification transport
    ///
    /// This is primarily used for testing with notifier doubles.
    pub fn with_notifier(config: Config, notifier: Box<dyn Notifier>) -> Self {
        let (record_sender, record_receiver) = mpsc::channel();
        let collector = TailCollector::new(config.log_file.clone(), record_sender);
        Self::assemble(config, collector, record_receiver, notifier)
    }

    fn assemble(
        config: Config,
        collector: TailCollector,
        record_receiver: Receiver<RawRecord>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let processor = EventProcessor::new(&config);

        let (alert_sender, alert_receiver) = mpsc::sync_channel(ALERT_QUEUE_CAPACITY);
        let dispatcher = AlertDispatcher::new(
            config.alert_cooldown_sec,
            config.maintenance_mode,
            config.maintenance_scope,
            notifier,
        );
        let notifier_handle = thread::spawn(move || {
            Self::notifier_thread(alert_receiver, dispatcher);
        });

        Self {
            config,
            collector,
            record_receiver,
            processor,
            alert_sender: Some(alert_sender),
            notifier_handle: Some(notifier_handle),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the run loop when set (safe to share with a signal handler)
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run until shutdown is requested
    ///
    /// Starts the collector, announces startup, then processes records
    /// strictly in arrival order. On shutdown the collector stops first, the
    /// alert queue is closed so in-flight dispatches complete, and the
    /// notifier thread is joined. Returns an error if the record source
    /// closes before shutdown was requested, which happens when the log
    /// file never appears or the collector dies for good.
    pub fn run(mut self) -> Result<(), CollectorError> {
        info!(
            "Watching {} (primary pool '{}', backup pool '{}')",
            self.config.log_file.display(),
            self.config.primary_pool,
            self.config.backup_pool
        );

        self.collector.start()?;
        self.enqueue(AlertRequest {
            kind: AlertKind::Info,
            message: messages::startup(&self.config),
        });

        let mut source_failed = false;
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.record_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(record) => {
                    for request in self.processor.process(&record) {
                        self.enqueue(request);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    error!("Record source closed unexpectedly, stopping");
                    source_failed = true;
                    break;
                }
            }
        }

        info!(
            "Shutting down after {} records ({} skipped)",
            self.processor.records_processed(),
            self.processor.records_skipped()
        );

        if let Err(e) = self.collector.stop() {
            error!("Failed to stop collector: {}", e);
        }

        // Closing the queue lets the notifier finish any in-flight dispatch
        // and exit
        drop(self.alert_sender.take());
        if let Some(handle) = self.notifier_handle.take() {
            if handle.join().is_err() {
                error!("Notifier thread panicked during shutdown");
            }
        }

        if source_failed {
            return Err(CollectorError::SubprocessTerminated(
                "Record source closed before shutdown was requested".to_string(),
            ));
        }

        info!("Watcher stopped");
        Ok(())
    }

    /// Hand an alert request to the notifier thread without blocking
    fn enqueue(&self, request: AlertRequest) {
        let Some(sender) = self.alert_sender.as_ref() else {
            return;
        };
        match sender.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) => {
                warn!("Alert queue full, dropping {} alert", request.kind);
            }
            Err(TrySendError::Disconnected(request)) => {
                error!("Notifier thread gone, dropping {} alert", request.kind);
            }
        }
    }

    /// Consumes queued alert requests until the queue closes
    fn notifier_thread(receiver: Receiver<AlertRequest>, mut dispatcher: AlertDispatcher) {
        info!("Notifier thread started");
        for request in receiver.iter() {
            match dispatcher.dispatch(request.kind, &request.message) {
                Ok(_) => {}
                Err(e) => {
                    // Non-fatal: the cooldown clock was not advanced, so a
                    // later qualifying event retries
                    error!("Failed to deliver {} alert: {}", request.kind, e);
                }
            }
        }
        info!("Notifier thread stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use clap::Parser;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    struct RecordingNotifier {
        delivered: Arc<Mutex<Vec<AlertKind>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, kind: AlertKind, _message: &str) -> Result<(), NotifyError> {
            self.delivered.lock().unwrap().push(kind);
            Ok(())
        }
    }

    fn config_for(log_file: &std::path::Path) -> Config {
        Config::try_parse_from([
            "poolwatch",
            "--slack-webhook-url",
            "https://hooks.example/T/X",
            "--log-file",
            log_file.to_str().unwrap(),
            "--window-size",
            "2",
            "--alert-cooldown-sec",
            "300",
        ])
        .unwrap()
    }

    #[test]
    fn test_watcher_end_to_end_failover() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = config_for(temp_file.path());

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let notifier = RecordingNotifier {
            delivered: Arc::clone(&delivered),
        };

        let watcher = Watcher::with_notifier(config, Box::new(notifier));
        let shutdown = watcher.shutdown_handle();
        let handle = thread::spawn(move || watcher.run());

        // Give the tail subprocess time to attach before appending
        thread::sleep(Duration::from_secs(1));

        let mut file = temp_file.reopen().unwrap();
        writeln!(file, r#"{{"pool": "blue", "status": 200}}"#).unwrap();
        writeln!(file, r#"{{"pool": "green", "status": 200}}"#).unwrap();
        file.sync_all().unwrap();

        thread::sleep(Duration::from_secs(1));
        shutdown.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();

        let delivered = delivered.lock().unwrap();
        // Startup announcement plus the failover
        assert_eq!(delivered.first(), Some(&AlertKind::Info));
        assert!(delivered.contains(&AlertKind::Failover));
        assert!(!delivered.contains(&AlertKind::Recovery));
    }

    #[test]
    fn test_watcher_shuts_down_cleanly_without_input() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = config_for(temp_file.path());

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let notifier = RecordingNotifier {
            delivered: Arc::clone(&delivered),
        };

        let watcher = Watcher::with_notifier(config, Box::new(notifier));
        let shutdown = watcher.shutdown_handle();
        let handle = thread::spawn(move || watcher.run());

        thread::sleep(Duration::from_millis(500));
        shutdown.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();

        // Only the startup announcement was delivered
        assert_eq!(*delivered.lock().unwrap(), vec![AlertKind::Info]);
    }

    #[test]
    fn test_run_fails_when_log_file_never_appears() {
        let config = Config::try_parse_from([
            "poolwatch",
            "--slack-webhook-url",
            "https://hooks.example/T/X",
            "--log-file",
            "/nonexistent/dir/access.log",
        ])
        .unwrap();

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let notifier = RecordingNotifier {
            delivered: Arc::clone(&delivered),
        };

        // Short wait policy so the collector gives up promptly
        let (record_sender, record_receiver) = mpsc::channel();
        let collector = TailCollector::with_wait(
            config.log_file.clone(),
            record_sender,
            1,
            Duration::from_millis(10),
        );
        let watcher = Watcher::assemble(config, collector, record_receiver, Box::new(notifier));

        // The run loop must fail instead of spinning on a dead source
        assert!(watcher.run().is_err());
        assert_eq!(*delivered.lock().unwrap(), vec![AlertKind::Info]);
    }
}
