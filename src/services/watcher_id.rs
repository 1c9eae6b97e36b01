//! Watcher-id derivation helpers.
//!
//! A scan watcher is keyed by `"clusterID:scanID"`, which is also the key
//! its result is filed under in the owning configuration watcher. The report
//! manager uses these helpers to route inbound scan and check-result
//! messages to the right watcher.

use crate::domain::error::WatchError;
use crate::domain::models::{CheckResult, Scan};
use crate::domain::ports::ScanStore;

/// The watcher id for a scan in a cluster: `"clusterID:scanID"`.
pub fn scan_watcher_id(cluster_id: &str, scan_id: &str) -> String {
    format!("{cluster_id}:{scan_id}")
}

/// The watcher id a scan message belongs to.
pub fn id_from_scan(scan: &Scan) -> String {
    scan_watcher_id(&scan.cluster_id, &scan.id)
}

/// Resolve the watcher id a check result belongs to by looking up its
/// owning scan through the scan store.
pub async fn id_from_check_result(
    result: &CheckResult,
    scans: &dyn ScanStore,
) -> Result<String, WatchError> {
    let matches = scans.search_scans_by_ref(&result.scan_ref_id).await?;
    match matches.first() {
        Some(scan) => Ok(id_from_scan(scan)),
        None => Err(WatchError::ScanNotFound(result.scan_ref_id.clone())),
    }
}
