//! Post-run cleanup of results from scans that never reported.
//!
//! When a configuration run finishes without hearing from every scan it
//! expected, check results persisted for the missing scans belong to an
//! older run and would pollute the next report. This purges them.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::error::StoreError;
use crate::domain::models::ScanConfigWatcherResult;
use crate::domain::ports::{CheckResultStore, ProfileStore, ScanStore};
use crate::services::watcher_id::id_from_scan;

/// Delete persisted check results of every scan the configuration expected
/// but which is absent from `results`.
///
/// Re-resolves the configuration's scans the same way the watcher sized the
/// run (profiles x clusters, then scans per profile), then deletes results
/// older than each missing scan's current last-started time. Fails on the
/// first lookup or deletion error.
pub async fn delete_old_results_from_missing_scans(
    results: &ScanConfigWatcherResult,
    profiles: &dyn ProfileStore,
    scans: &dyn ScanStore,
    check_results: &dyn CheckResultStore,
) -> Result<(), StoreError> {
    let config = &results.scan_config;
    let cluster_ids = config.cluster_ids();
    let matched_profiles = profiles
        .search_profiles(&config.profiles, &cluster_ids)
        .await?;
    let profile_ref_ids: Vec<String> = matched_profiles
        .into_iter()
        .map(|p| p.profile_ref_id)
        .collect();
    let expected_scans = scans.search_scans(&profile_ref_ids, &cluster_ids).await?;

    let reported: HashSet<&str> = results.scan_results.keys().map(String::as_str).collect();
    for scan in expected_scans {
        if reported.contains(id_from_scan(&scan).as_str()) {
            continue;
        }
        // The search result may be a partial projection; fetch the full
        // record for the authoritative ref id and timestamp.
        let full = scans
            .get_scan(&scan.id)
            .await?
            .ok_or_else(|| StoreError::NotFound(scan.id.clone()))?;
        debug!(
            scan_id = %full.id,
            scan_ref_id = %full.scan_ref_id,
            "Deleting old results of scan missing from the run"
        );
        check_results
            .delete_old_results(full.last_started_time, &full.scan_ref_id, true)
            .await?;
    }
    Ok(())
}
