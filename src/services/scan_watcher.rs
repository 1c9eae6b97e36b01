//! Single-scan watcher.
//!
//! Tracks one compliance scan run: accumulates distinct check ids until the
//! count declared by the scan's check-count annotation is reached, then
//! pushes exactly one terminal result to the ready queue. A scan can be
//! restarted mid-flight; a strictly newer last-started timestamp discards
//! the checks of the superseded run and restarts the timeout window.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::error::WatchError;
use crate::domain::models::{CheckResult, Scan, ScanWatcherResult, SensorSession};
use crate::sync::{DeadlineTimer, ReadyQueue, Signal, Timer};

use super::config::WatcherConfig;

#[derive(Debug, Default)]
struct ScanState {
    scan: Option<Scan>,
    last_started: Option<DateTime<Utc>>,
    total_checks: usize,
    check_results: HashSet<String>,
    stop_error: Option<WatchError>,
}

/// Handle to a running single-scan watcher.
///
/// The event loop runs on its own task; this handle feeds it messages and
/// observes completion. Dropping the handle closes the message channels but
/// does not cancel the loop; call [`ScanWatcher::stop`] for that.
#[derive(Debug)]
pub struct ScanWatcher {
    watcher_id: String,
    scan_tx: mpsc::Sender<Scan>,
    check_tx: mpsc::Sender<CheckResult>,
    cancel: Signal,
    finished: Signal,
    state: Arc<Mutex<ScanState>>,
}

impl ScanWatcher {
    /// Start a watcher with the production deadline timer.
    pub fn spawn(
        watcher_id: impl Into<String>,
        sensor_session: SensorSession,
        ready_queue: ReadyQueue<ScanWatcherResult>,
        config: &WatcherConfig,
    ) -> Self {
        let timer = DeadlineTimer::new(config.scan_timeout);
        Self::spawn_with_timer(watcher_id, sensor_session, ready_queue, config, timer)
    }

    /// Start a watcher with an injected timer. Used by tests to control the
    /// deadline deterministically.
    pub fn spawn_with_timer<T: Timer + 'static>(
        watcher_id: impl Into<String>,
        sensor_session: SensorSession,
        ready_queue: ReadyQueue<ScanWatcherResult>,
        config: &WatcherConfig,
        timer: T,
    ) -> Self {
        let watcher_id = watcher_id.into();
        let (scan_tx, scan_rx) = mpsc::channel(config.channel_capacity);
        let (check_tx, check_rx) = mpsc::channel(config.channel_capacity);
        let cancel = Signal::new();
        let finished = Signal::new();
        let state = Arc::new(Mutex::new(ScanState::default()));

        let worker = ScanWatcherWorker {
            watcher_id: watcher_id.clone(),
            sensor_session,
            cancel: cancel.clone(),
            finished: finished.clone(),
            state: Arc::clone(&state),
            scan_rx,
            check_rx,
            ready_queue,
        };
        tokio::spawn(worker.run(timer));

        Self {
            watcher_id,
            scan_tx,
            check_tx,
            cancel,
            finished,
            state,
        }
    }

    /// The caller-assigned watcher id.
    pub fn id(&self) -> &str {
        &self.watcher_id
    }

    /// Enqueue a scan-state message for the event loop.
    pub async fn push_scan(&self, scan: Scan) -> Result<(), WatchError> {
        if self.cancel.is_done() || self.finished.is_done() {
            return Err(WatchError::Stopped);
        }
        self.scan_tx
            .send(scan)
            .await
            .map_err(|_| WatchError::Stopped)
    }

    /// Enqueue a check-result message for the event loop.
    pub async fn push_check_result(&self, result: CheckResult) -> Result<(), WatchError> {
        if self.cancel.is_done() || self.finished.is_done() {
            return Err(WatchError::Stopped);
        }
        self.check_tx
            .send(result)
            .await
            .map_err(|_| WatchError::Stopped)
    }

    /// Request cancellation. A non-`None` error becomes the terminal error
    /// unless one was already recorded. Idempotent.
    pub fn stop(&self, error: Option<WatchError>) {
        if let Some(err) = error {
            let mut state = lock_state(&self.state);
            if state.stop_error.is_none() {
                state.stop_error = Some(err);
            }
        }
        self.cancel.signal();
    }

    /// The completion signal. Observers may await or poll it; it carries the
    /// terminal error once set.
    pub fn finished(&self) -> Signal {
        self.finished.clone()
    }

    /// The scan currently tracked by the event loop, if one arrived yet.
    pub fn scan(&self) -> Option<Scan> {
        lock_state(&self.state).scan.clone()
    }
}

fn lock_state(state: &Mutex<ScanState>) -> MutexGuard<'_, ScanState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ScanWatcherWorker {
    watcher_id: String,
    sensor_session: SensorSession,
    cancel: Signal,
    finished: Signal,
    state: Arc<Mutex<ScanState>>,
    scan_rx: mpsc::Receiver<Scan>,
    check_rx: mpsc::Receiver<CheckResult>,
    ready_queue: ReadyQueue<ScanWatcherResult>,
}

impl ScanWatcherWorker {
    async fn run<T: Timer>(mut self, mut timer: T) {
        debug!(watcher_id = %self.watcher_id, "Starting scan watcher");
        let error = loop {
            tokio::select! {
                () = self.cancel.wait() => {
                    break Some(
                        self.take_stop_error()
                            .unwrap_or(WatchError::ScanContextCancelled),
                    );
                }
                () = timer.fired() => {
                    warn!(watcher_id = %self.watcher_id, "Scan watcher timed out");
                    break Some(self.take_stop_error().unwrap_or(WatchError::ScanTimeout));
                }
                Some(scan) = self.scan_rx.recv() => {
                    if self.handle_scan(scan) {
                        timer.reset();
                    }
                    if self.is_complete() {
                        break None;
                    }
                }
                Some(result) = self.check_rx.recv() => {
                    if self.handle_check_result(result) {
                        timer.reset();
                    }
                    if self.is_complete() {
                        break None;
                    }
                }
            }
        };
        timer.stop();

        let result = {
            let state = lock_state(&self.state);
            ScanWatcherResult {
                watcher_id: self.watcher_id.clone(),
                sensor_session: self.sensor_session.clone(),
                scan: state.scan.clone(),
                check_results: state.check_results.clone(),
                error: error.clone(),
            }
        };
        info!(
            watcher_id = %self.watcher_id,
            checks = result.check_results.len(),
            error = ?result.error,
            "Scan watcher finished"
        );
        self.ready_queue.push(result);
        match error {
            Some(err) => self.finished.signal_with_error(err),
            None => self.finished.signal(),
        };
    }

    /// Apply a scan-state message. Returns whether the deadline must be
    /// restarted (the scan restarted).
    fn handle_scan(&self, scan: Scan) -> bool {
        let mut state = lock_state(&self.state);
        match scan.check_count() {
            Some(Ok(count)) => state.total_checks = count,
            Some(Err(raw)) => {
                warn!(
                    watcher_id = %self.watcher_id,
                    raw,
                    "Malformed check-count annotation, keeping previous count"
                );
            }
            None => {}
        }

        if state.scan.is_none() {
            debug!(watcher_id = %self.watcher_id, scan_id = %scan.id, "Tracking scan");
            // A resynchronizing check result may already have moved the run
            // forward; the tracked timestamp never goes backwards.
            match scan.last_started_time.cmp(&state.last_started) {
                std::cmp::Ordering::Greater => {
                    state.last_started = scan.last_started_time;
                    state.scan = Some(scan);
                    if !state.check_results.is_empty() {
                        state.check_results.clear();
                        return true;
                    }
                }
                std::cmp::Ordering::Equal => {
                    state.scan = Some(scan);
                }
                std::cmp::Ordering::Less => {
                    let mut scan = scan;
                    scan.last_started_time = state.last_started;
                    state.scan = Some(scan);
                }
            }
            return false;
        }

        match scan.last_started_time.cmp(&state.last_started) {
            std::cmp::Ordering::Greater => {
                info!(
                    watcher_id = %self.watcher_id,
                    scan_id = %scan.id,
                    "Scan restarted, discarding results of the superseded run"
                );
                state.last_started = scan.last_started_time;
                state.scan = Some(scan);
                state.check_results.clear();
                true
            }
            std::cmp::Ordering::Equal => {
                // Same generation: keep the freshest descriptor.
                state.scan = Some(scan);
                false
            }
            std::cmp::Ordering::Less => {
                debug!(
                    watcher_id = %self.watcher_id,
                    scan_id = %scan.id,
                    "Ignoring scan message from a superseded run"
                );
                false
            }
        }
    }

    /// Apply a check-result message. Returns whether the deadline must be
    /// restarted (the result forced a resynchronization).
    fn handle_check_result(&self, result: CheckResult) -> bool {
        let timestamp = match result.last_scanned_time() {
            Some(Ok(ts)) => ts,
            Some(Err(raw)) => {
                warn!(
                    watcher_id = %self.watcher_id,
                    check_id = %result.check_id,
                    raw,
                    "Malformed last-scanned annotation, skipping check result"
                );
                return false;
            }
            None => {
                warn!(
                    watcher_id = %self.watcher_id,
                    check_id = %result.check_id,
                    "Check result without last-scanned annotation, skipping"
                );
                return false;
            }
        };

        let mut state = lock_state(&self.state);
        match Some(timestamp).cmp(&state.last_started) {
            std::cmp::Ordering::Less => {
                // Check results and scan-status updates race upstream; a
                // result from a superseded run does not count.
                debug!(
                    watcher_id = %self.watcher_id,
                    check_id = %result.check_id,
                    "Dropping stale check result"
                );
                false
            }
            std::cmp::Ordering::Greater => {
                // A check result leaked ahead of its own scan message.
                warn!(
                    watcher_id = %self.watcher_id,
                    check_id = %result.check_id,
                    "Check result is newer than the tracked scan, resynchronizing"
                );
                state.last_started = Some(timestamp);
                if let Some(scan) = state.scan.as_mut() {
                    scan.last_started_time = Some(timestamp);
                }
                state.check_results.clear();
                state.check_results.insert(result.check_id);
                true
            }
            std::cmp::Ordering::Equal => {
                state.check_results.insert(result.check_id);
                false
            }
        }
    }

    fn is_complete(&self) -> bool {
        let state = lock_state(&self.state);
        state.total_checks != 0 && state.total_checks == state.check_results.len()
    }

    fn take_stop_error(&self) -> Option<WatchError> {
        lock_state(&self.state).stop_error.take()
    }
}
