//! Access-log tail collector
//!
//! Spawns and manages a `tail -F -n 0` subprocess to follow the access log
//! through rotation, starting at the current end of file. Decodes JSON lines
//! and sends the resulting records to a channel for the run loop; malformed
//! lines are skipped, never escalated.

use crate::error::CollectorError;
use crate::events::RawRecord;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Decode one raw log line into a record
///
/// Pure function: returns `None` for malformed input or input that is not
/// a JSON object. Callers treat `None` as skip, not fault.
pub fn decode_line(line: &str) -> Option<RawRecord> {
    serde_json::from_str::<RawRecord>(line.trim()).ok()
}

/// Follows a possibly-rotating log file via a `tail -F` subprocess
///
/// Produces a lazy, unbounded sequence of decoded records on the output
/// channel. The subprocess is restarted with exponential backoff if it
/// dies; `tail -F` itself handles file rotation. The collector holds the
/// only sender for its channel, so the receiver disconnects as soon as the
/// collector stops for good and the consumer can tell a dead source from
/// a quiet one.
pub struct TailCollector {
    /// Log file to follow
    path: PathBuf,
    /// Channel to send decoded records; moved into the thread on start
    output_channel: Option<Sender<RawRecord>>,
    /// How many times to poll for the log file before giving up
    wait_attempts: u32,
    /// Delay between wait-for-file polls
    wait_interval: Duration,
    /// Handle to the background thread
    thread_handle: Option<JoinHandle<()>>,
    /// Shared state for controlling the collector
    running: Arc<Mutex<bool>>,
}

impl TailCollector {
    pub fn new(path: PathBuf, channel: Sender<RawRecord>) -> Self {
        Self::with_wait(path, channel, 30, Duration::from_secs(2))
    }

    /// Create a collector with a custom wait-for-file policy
    pub fn with_wait(
        path: PathBuf,
        channel: Sender<RawRecord>,
        wait_attempts: u32,
        wait_interval: Duration,
    ) -> Self {
        Self {
            path,
            output_channel: Some(channel),
            wait_attempts,
            wait_interval,
            thread_handle: None,
            running: Arc::new(Mutex::new(false)),
        }
    }

    /// Start the collector
    ///
    /// Spawns a background thread that waits for the log file to appear,
    /// then manages the `tail` subprocess. Returns immediately. The
    /// collector is single-use: once it has stopped it cannot be restarted.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        let channel = {
            let mut running = self.running.lock().unwrap();
            if *running {
                return Ok(());
            }
            let channel = self.output_channel.take().ok_or_else(|| {
                CollectorError::SubprocessTerminated(
                    "Collector already stopped, cannot restart".to_string(),
                )
            })?;
            *running = true;
            channel
        };

        let path = self.path.clone();
        let running = Arc::clone(&self.running);
        let wait_attempts = self.wait_attempts;
        let wait_interval = self.wait_interval;

        let handle = thread::spawn(move || {
            Self::collector_thread(path, channel, running, wait_attempts, wait_interval);
        });

        self.thread_handle = Some(handle);
        info!("TailCollector started for {}", self.path.display());
        Ok(())
    }

    /// Stop the collector
    ///
    /// Signals the background thread to stop and waits for it to finish.
    pub fn stop(&mut self) -> Result<(), CollectorError> {
        {
            let mut running = self.running.lock().unwrap();
            *running = false;
        }

        if let Some(handle) = self.thread_handle.take() {
            handle.join().map_err(|_| {
                CollectorError::SubprocessTerminated(
                    "Failed to join collector thread".to_string(),
                )
            })?;
        }

        info!("TailCollector stopped");
        Ok(())
    }

    /// Check if the collector is currently running
    pub fn is_running(&self) -> bool {
        *self.running.lock().unwrap()
    }

    /// Main collector thread function
    ///
    /// Waits for the log file, then runs the tail subprocess in a loop with
    /// exponential backoff on failure. Returning drops `channel`, the only
    /// sender, which disconnects the receiver and signals the consumer that
    /// no more records will ever arrive.
    fn collector_thread(
        path: PathBuf,
        channel: Sender<RawRecord>,
        running: Arc<Mutex<bool>>,
        wait_attempts: u32,
        wait_interval: Duration,
    ) {
        if !Self::wait_for_file(&path, &running, wait_attempts, wait_interval) {
            let mut running = running.lock().unwrap();
            // A cleared flag means stop() interrupted the wait, not a give-up
            if *running {
                error!("Log file {} never appeared, collector exiting", path.display());
            }
            *running = false;
            return;
        }
        info!("Log file found, following {}", path.display());

        let mut restart_delay = Duration::from_secs(1);
        let max_delay = Duration::from_secs(60);

        while *running.lock().unwrap() {
            match Self::spawn_tail(&path) {
                Ok(mut child) => {
                    debug!("tail subprocess started");

                    match Self::process_tail_output(&mut child, &channel, &running) {
                        Ok(()) => {
                            restart_delay = Duration::from_secs(1);
                        }
                        Err(e) => {
                            error!("Error processing tail output: {}", e);
                        }
                    }

                    if let Err(e) = child.kill() {
                        warn!("Failed to kill tail subprocess: {}", e);
                    }
                    let _ = child.wait();
                }
                Err(e) => {
                    error!("Failed to spawn tail subprocess: {}", e);
                }
            }

            if !*running.lock().unwrap() {
                break;
            }

            warn!("tail subprocess ended, restarting in {:?}", restart_delay);
            if !Self::interruptible_sleep(restart_delay, &running) {
                break;
            }
            restart_delay = std::cmp::min(restart_delay * 2, max_delay);
        }

        info!("Collector thread finished");
    }

    /// Wait for the log file to appear, checking the running flag
    ///
    /// Returns false if the file did not appear within the configured number
    /// of attempts or the collector was stopped while waiting.
    fn wait_for_file(
        path: &Path,
        running: &Arc<Mutex<bool>>,
        max_attempts: u32,
        interval: Duration,
    ) -> bool {
        let mut attempts = 0;

        while !path.exists() {
            attempts += 1;
            if attempts > max_attempts {
                return false;
            }
            warn!(
                "Waiting for log file {} (attempt {})",
                path.display(),
                attempts
            );
            if !Self::interruptible_sleep(interval, running) {
                return false;
            }
        }
        true
    }

    /// Sleep in short slices, aborting early when the collector is stopped
    ///
    /// Returns false if the running flag was cleared before the full
    /// duration elapsed, so long waits never delay shutdown.
    fn interruptible_sleep(duration: Duration, running: &Arc<Mutex<bool>>) -> bool {
        const SLICE: Duration = Duration::from_millis(100);
        let mut slept = Duration::ZERO;

        while slept < duration {
            if !*running.lock().unwrap() {
                return false;
            }
            let step = SLICE.min(duration - slept);
            thread::sleep(step);
            slept += step;
        }
        *running.lock().unwrap()
    }

    /// Spawn the tail subprocess
    ///
    /// `-F` follows through rotation and retries when the file is replaced;
    /// `-n 0` starts at the current end so only new lines are observed.
    fn spawn_tail(path: &Path) -> Result<Child, CollectorError> {
        let mut child = Command::new("tail")
            .arg("-F")
            .arg("-n")
            .arg("0")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CollectorError::SubprocessSpawn(format!("tail: {}", e)))?;

        // Set stdout to non-blocking mode so shutdown stays responsive
        if let Some(ref mut stdout) = child.stdout {
            #[cfg(unix)]
            {
                use std::os::unix::io::AsRawFd;
                let fd = stdout.as_raw_fd();
                unsafe {
                    let flags = libc::fcntl(fd, libc::F_GETFL);
                    libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                }
            }
        }

        Ok(child)
    }

    /// Process output from the tail subprocess until EOF or shutdown
    fn process_tail_output(
        child: &mut Child,
        channel: &Sender<RawRecord>,
        running: &Arc<Mutex<bool>>,
    ) -> Result<(), CollectorError> {
        use std::io::Read;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            CollectorError::SubprocessTerminated("No stdout available".to_string())
        })?;

        let mut buffer = String::new();
        let mut temp_buf = [0u8; 4096];

        loop {
            if !*running.lock().unwrap() {
                debug!("Stopping tail processing due to shutdown signal");
                break;
            }

            match stdout.read(&mut temp_buf) {
                Ok(0) => {
                    debug!("tail subprocess closed stdout");
                    break;
                }
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&temp_buf[..n]);
                    buffer.push_str(&chunk);

                    while let Some(newline_pos) = buffer.find('\n') {
                        let line = buffer[..newline_pos].to_string();
                        buffer.drain(..=newline_pos);

                        if line.trim().is_empty() {
                            continue;
                        }

                        match decode_line(&line) {
                            Some(record) => {
                                if channel.send(record).is_err() {
                                    // Receiver gone, probably shutting down
                                    debug!("Record channel closed, stopping tail processing");
                                    return Ok(());
                                }
                            }
                            None => {
                                debug!("Skipping malformed log line: {:.100}", line);
                            }
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No data available, sleep briefly and check running again
                    thread::sleep(Duration::from_millis(10));
                    continue;
                }
                Err(e) => {
                    return Err(CollectorError::IoError(e));
                }
            }
        }

        Ok(())
    }
}

impl Drop for TailCollector {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}


// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn prop_decode_line_never_panics(line: String) -> bool {
        // Any outcome is acceptable; the property is graceful handling
        let _ = decode_line(&line);
        true
    }

    #[quickcheck]
    fn prop_decoded_records_are_objects(pool: String, status: u16) -> bool {
        let line = serde_json::json!({ "pool": pool, "status": status }).to_string();
        match decode_line(&line) {
            Some(record) => record.contains_key("pool") && record.contains_key("status"),
            None => false,
        }
    }
}
