//! Terminal results pushed by the watchers.

use std::collections::{HashMap, HashSet};

use super::integration::SensorSession;
use super::scan::Scan;
use super::scan_config::ScanConfiguration;
use crate::domain::error::WatchError;

/// Terminal output of a single-scan watcher.
///
/// Created empty when the watcher starts, mutated only by the watcher's own
/// event loop, pushed to the ready queue exactly once and immutable after
/// push. On success (`error == None`) the number of collected check ids
/// equals the check count declared by the scan's annotation.
#[derive(Debug, Clone)]
pub struct ScanWatcherResult {
    /// Caller-assigned id correlating the watcher to its scan.
    pub watcher_id: String,
    /// Liveness handle for the remote agent connection.
    pub sensor_session: SensorSession,
    /// Last known scan descriptor, absent if no scan message ever arrived.
    pub scan: Option<Scan>,
    /// Distinct check ids collected for the current run.
    pub check_results: HashSet<String>,
    /// Terminal error, `None` on success.
    pub error: Option<WatchError>,
}

impl ScanWatcherResult {
    /// Cluster id of the tracked scan, empty when no scan was recorded.
    pub fn cluster_id(&self) -> &str {
        self.scan.as_ref().map_or("", |s| s.cluster_id.as_str())
    }
}

/// Terminal output of a scan-configuration watcher.
#[derive(Debug, Clone)]
pub struct ScanConfigWatcherResult {
    /// Caller-assigned id correlating the watcher to its configuration run.
    pub watcher_id: String,
    /// The configuration whose scans were aggregated.
    pub scan_config: ScanConfiguration,
    /// Report snapshot ids subscribed to this run, in subscription order.
    pub report_snapshot_ids: Vec<String>,
    /// Child results keyed by `"clusterID:scanID"`.
    pub scan_results: HashMap<String, ScanWatcherResult>,
    /// Terminal error, `None` on success.
    pub error: Option<WatchError>,
}
