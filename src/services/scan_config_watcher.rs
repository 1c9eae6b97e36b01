//! Scan-configuration watcher.
//!
//! Fans in the terminal results of the single-scan watchers belonging to one
//! scan configuration run, appends scan references to every subscribed
//! report snapshot, and pushes one aggregate result when every expected scan
//! has reported.
//!
//! How many scans are expected is not known up front: it is computed lazily
//! on the first received result by cross-referencing the configuration's
//! profiles and clusters against the scan store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::error::{StoreError, WatchError};
use crate::domain::models::{
    ReportSnapshot, Scan, ScanConfigWatcherResult, ScanConfiguration, ScanReference,
    ScanWatcherResult,
};
use crate::domain::ports::{ProfileStore, ScanStore, SnapshotStore};
use crate::sync::{DeadlineTimer, ReadyQueue, Signal, Timer};

use super::config::WatcherConfig;
use super::watcher_id::id_from_scan;

#[derive(Debug, Default)]
struct ConfigState {
    scan_results: HashMap<String, ScanWatcherResult>,
    /// Subscribed report snapshot ids, in subscription order.
    snapshot_ids: Vec<String>,
    /// Number of scans this run must collect. `None` until the first result
    /// triggers the lazy computation.
    total_results: Option<usize>,
}

/// Handle to a running scan-configuration watcher.
pub struct ScanConfigWatcher {
    watcher_id: String,
    results_tx: mpsc::Sender<ScanWatcherResult>,
    cancel: Signal,
    finished: Signal,
    state: Arc<Mutex<ConfigState>>,
    snapshot_store: Arc<dyn SnapshotStore>,
    /// Serializes snapshot read-modify-writes: a `subscribe` back-fill must
    /// not interleave with the worker's per-result appends.
    snapshot_write: Arc<tokio::sync::Mutex<()>>,
}

impl std::fmt::Debug for ScanConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanConfigWatcher")
            .field("watcher_id", &self.watcher_id)
            .finish_non_exhaustive()
    }
}

/// The datastore collaborators a configuration watcher consults.
#[derive(Clone)]
pub struct ConfigStores {
    pub scans: Arc<dyn ScanStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
}

impl std::fmt::Debug for ConfigStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStores").finish_non_exhaustive()
    }
}

impl ScanConfigWatcher {
    /// Start a watcher with the production deadline timer.
    pub fn spawn(
        watcher_id: impl Into<String>,
        scan_config: ScanConfiguration,
        stores: ConfigStores,
        ready_queue: ReadyQueue<ScanConfigWatcherResult>,
        config: &WatcherConfig,
    ) -> Self {
        let timer = DeadlineTimer::new(config.scan_config_timeout);
        Self::spawn_with_timer(watcher_id, scan_config, stores, ready_queue, config, timer)
    }

    /// Start a watcher with an injected timer for deterministic tests.
    pub fn spawn_with_timer<T: Timer + 'static>(
        watcher_id: impl Into<String>,
        scan_config: ScanConfiguration,
        stores: ConfigStores,
        ready_queue: ReadyQueue<ScanConfigWatcherResult>,
        config: &WatcherConfig,
        timer: T,
    ) -> Self {
        let watcher_id = watcher_id.into();
        let (results_tx, results_rx) = mpsc::channel(config.channel_capacity);
        let cancel = Signal::new();
        let finished = Signal::new();
        let state = Arc::new(Mutex::new(ConfigState::default()));
        let snapshot_write = Arc::new(tokio::sync::Mutex::new(()));

        let worker = ScanConfigWatcherWorker {
            watcher_id: watcher_id.clone(),
            scan_config,
            cancel: cancel.clone(),
            finished: finished.clone(),
            state: Arc::clone(&state),
            results_rx,
            ready_queue,
            stores: stores.clone(),
            snapshot_write: Arc::clone(&snapshot_write),
        };
        tokio::spawn(worker.run(timer));

        Self {
            watcher_id,
            results_tx,
            cancel,
            finished,
            state,
            snapshot_store: stores.snapshots,
            snapshot_write,
        }
    }

    /// The caller-assigned watcher id.
    pub fn id(&self) -> &str {
        &self.watcher_id
    }

    /// Enqueue the terminal result of a child scan watcher.
    pub async fn push_scan_results(&self, result: ScanWatcherResult) -> Result<(), WatchError> {
        if self.cancel.is_done() || self.finished.is_done() {
            return Err(WatchError::Stopped);
        }
        self.results_tx
            .send(result)
            .await
            .map_err(|_| WatchError::Stopped)
    }

    /// Register a report snapshot for this run.
    ///
    /// If scans have already reported, the snapshot is immediately back-filled
    /// with references to every known scan through the snapshot store. Before
    /// any scan reports this produces no writes.
    pub async fn subscribe(&self, snapshot: &ReportSnapshot) -> Result<(), WatchError> {
        let references: Vec<ScanReference> = {
            let mut state = lock_state(&self.state);
            if !state.snapshot_ids.iter().any(|id| *id == snapshot.report_id) {
                state.snapshot_ids.push(snapshot.report_id.clone());
            }
            state
                .scan_results
                .values()
                .filter_map(|r| r.scan.as_ref())
                .map(scan_reference)
                .collect()
        };
        if references.is_empty() {
            return Ok(());
        }
        debug!(
            watcher_id = %self.watcher_id,
            report_id = %snapshot.report_id,
            scans = references.len(),
            "Back-filling subscribed snapshot"
        );
        let _write = self.snapshot_write.lock().await;
        append_references(self.snapshot_store.as_ref(), &snapshot.report_id, &references)
            .await
            .map_err(WatchError::Store)
    }

    /// Request cancellation. Idempotent.
    pub fn stop(&self) {
        self.cancel.signal();
    }

    /// The completion signal, carrying the terminal error once set.
    pub fn finished(&self) -> Signal {
        self.finished.clone()
    }

    /// A read-only snapshot of the currently known child scans.
    pub fn get_scans(&self) -> Vec<Scan> {
        lock_state(&self.state)
            .scan_results
            .values()
            .filter_map(|r| r.scan.clone())
            .collect()
    }
}

fn lock_state(state: &Mutex<ConfigState>) -> MutexGuard<'_, ConfigState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn scan_reference(scan: &Scan) -> ScanReference {
    ScanReference {
        scan_ref_id: scan.scan_ref_id.clone(),
        last_started_time: scan.last_started_time,
    }
}

/// Read-modify-write `references` into the persisted snapshot `report_id`.
async fn append_references(
    store: &dyn SnapshotStore,
    report_id: &str,
    references: &[ScanReference],
) -> Result<(), StoreError> {
    let mut snapshot = store
        .get_snapshot(report_id)
        .await?
        .ok_or_else(|| StoreError::NotFound(report_id.to_string()))?;
    for reference in references {
        snapshot.add_scan_reference(reference.clone());
    }
    store.upsert_snapshot(snapshot).await
}

struct ScanConfigWatcherWorker {
    watcher_id: String,
    scan_config: ScanConfiguration,
    cancel: Signal,
    finished: Signal,
    state: Arc<Mutex<ConfigState>>,
    results_rx: mpsc::Receiver<ScanWatcherResult>,
    ready_queue: ReadyQueue<ScanConfigWatcherResult>,
    stores: ConfigStores,
    snapshot_write: Arc<tokio::sync::Mutex<()>>,
}

impl ScanConfigWatcherWorker {
    async fn run<T: Timer>(mut self, mut timer: T) {
        debug!(watcher_id = %self.watcher_id, "Starting scan config watcher");
        let error = loop {
            tokio::select! {
                () = self.cancel.wait() => {
                    break Some(WatchError::ScanConfigContextCancelled);
                }
                () = timer.fired() => {
                    warn!(watcher_id = %self.watcher_id, "Scan config watcher timed out");
                    break Some(WatchError::ScanConfigTimeout);
                }
                Some(result) = self.results_rx.recv() => {
                    match self.handle_scan_result(result).await {
                        Ok(()) => {
                            if self.is_complete() {
                                break None;
                            }
                        }
                        Err(err) => break Some(err),
                    }
                }
            }
        };
        timer.stop();

        let result = {
            let state = lock_state(&self.state);
            ScanConfigWatcherResult {
                watcher_id: self.watcher_id.clone(),
                scan_config: self.scan_config.clone(),
                report_snapshot_ids: state.snapshot_ids.clone(),
                scan_results: state.scan_results.clone(),
                error: error.clone(),
            }
        };
        info!(
            watcher_id = %self.watcher_id,
            scans = result.scan_results.len(),
            error = ?result.error,
            "Scan config watcher finished"
        );
        self.ready_queue.push(result);
        match error {
            Some(err) => self.finished.signal_with_error(err),
            None => self.finished.signal(),
        };
    }

    /// File one child result and fan its scan reference out to every
    /// subscribed snapshot.
    ///
    /// Errors returned here terminate the watcher: a duplicate key or a
    /// failed lookup needed to size the run means a valid terminal state can
    /// never be reached. Per-snapshot upsert failures are only logged.
    async fn handle_scan_result(&self, result: ScanWatcherResult) -> Result<(), WatchError> {
        let needs_total = lock_state(&self.state).total_results.is_none();
        if needs_total {
            let total = self.compute_total_results().await?;
            info!(
                watcher_id = %self.watcher_id,
                total,
                "Discovered scans for configuration"
            );
            lock_state(&self.state).total_results = Some(total);
        }

        let key = result
            .scan
            .as_ref()
            .map_or_else(|| result.watcher_id.clone(), id_from_scan);
        let reference = result.scan.as_ref().map(scan_reference);
        let snapshot_ids = {
            let mut state = lock_state(&self.state);
            if state.scan_results.contains_key(&key) {
                return Err(WatchError::DuplicateScan(key));
            }
            debug!(watcher_id = %self.watcher_id, key = %key, "Scan reported");
            state.scan_results.insert(key, result);
            state.snapshot_ids.clone()
        };

        if let Some(reference) = reference {
            let references = std::slice::from_ref(&reference);
            let _write = self.snapshot_write.lock().await;
            for report_id in &snapshot_ids {
                if let Err(err) =
                    append_references(self.stores.snapshots.as_ref(), report_id, references).await
                {
                    warn!(
                        watcher_id = %self.watcher_id,
                        report_id = %report_id,
                        %err,
                        "Failed to append scan reference to snapshot"
                    );
                }
            }
        }
        Ok(())
    }

    /// The number of scans the configuration is expected to produce:
    /// profiles declared by the configuration, resolved per cluster, joined
    /// against the scans referencing them.
    async fn compute_total_results(&self) -> Result<usize, WatchError> {
        let cluster_ids = self.scan_config.cluster_ids();
        let profiles = self
            .stores
            .profiles
            .search_profiles(&self.scan_config.profiles, &cluster_ids)
            .await?;
        let profile_ref_ids: Vec<String> =
            profiles.into_iter().map(|p| p.profile_ref_id).collect();
        let scans = self
            .stores
            .scans
            .search_scans(&profile_ref_ids, &cluster_ids)
            .await?;
        let total = scans
            .iter()
            .map(|s| s.id.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();
        if total == 0 {
            return Err(WatchError::NoScansFound(self.scan_config.id.clone()));
        }
        Ok(total)
    }

    fn is_complete(&self) -> bool {
        let state = lock_state(&self.state);
        state.total_results.is_some_and(|total| total == state.scan_results.len())
    }
}
