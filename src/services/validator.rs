//! Failure classification for finished configuration runs.
//!
//! The validator is the translation boundary between internal watcher errors
//! and the diagnostic strings a report reader sees. It is pure apart from
//! live health lookups through the integration store: nothing here spawns or
//! mutates watcher state.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::error::{ValidationError, WatchError};
use crate::domain::models::{
    FailedCluster, OperatorStatus, ScanConfigWatcherResult, ScanWatcherResult,
};
use crate::domain::ports::IntegrationStore;

/// Oldest compliance operator version the report pipeline supports.
pub const MINIMUM_OPERATOR_VERSION: &str = "v1.6.0";

/// Generic reason shown when the real cause would leak implementation detail.
pub const REASON_INTERNAL_ERROR: &str = "Internal error";
/// The compliance operator is not installed in the cluster.
pub const REASON_OPERATOR_NOT_INSTALLED: &str =
    "Compliance Operator is not installed in the cluster";
/// The compliance operator reports an unhealthy status.
pub const REASON_OPERATOR_UNHEALTHY: &str = "Compliance Operator is unhealthy";
/// The compliance operator version is below the supported minimum.
pub const REASON_OPERATOR_VERSION: &str =
    "Compliance Operator version is unsupported (minimum v1.6.0)";

fn reason_scan_timeout(scan_name: &str) -> String {
    format!("Scan {scan_name} timed out")
}

fn reason_scan_timeout_disconnected(scan_name: &str) -> String {
    format!("Scan {scan_name} timed out and the connection to the cluster was lost")
}

fn reason_scan_removed(scan_name: &str) -> String {
    format!("Scan {scan_name} was removed")
}

/// Outcome of validating a finished configuration run.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    /// Clusters that failed, keyed by cluster id.
    pub failed_clusters: HashMap<String, FailedCluster>,
    /// Overall error for the run, `None` when everything succeeded.
    pub error: Option<ValidationError>,
}

/// Diagnose a finished configuration run into per-cluster failures.
///
/// Every failed child result is classified against the cluster's live agent
/// health; clusters the configuration declares but which never reported are
/// health-checked directly and added as failed too.
pub async fn validate_scan_config_results(
    result: &ScanConfigWatcherResult,
    health: &dyn IntegrationStore,
) -> ValidationOutcome {
    let mut failed: HashMap<String, FailedCluster> = HashMap::new();
    let mut succeeded: HashSet<String> = HashSet::new();

    for child in result.scan_results.values() {
        let cluster_id = child.cluster_id().to_string();
        if child.error.is_none() {
            succeeded.insert(cluster_id);
            continue;
        }
        let (diagnosis, installation_error) = validate_scan_results(child, health).await;
        let Some(diagnosis) = diagnosis else {
            continue;
        };
        let entry = failed
            .entry(cluster_id)
            .or_insert_with(|| FailedCluster {
                cluster_id: diagnosis.cluster_id.clone(),
                cluster_name: diagnosis.cluster_name.clone(),
                operator_version: diagnosis.operator_version.clone(),
                ..FailedCluster::default()
            });
        if installation_error {
            // Installation problems describe the cluster, not the scan:
            // keep only the latest reasons instead of appending per scan.
            entry.reasons = diagnosis.reasons;
        } else {
            entry.reasons.extend(diagnosis.reasons);
        }
        entry.operator_version = diagnosis.operator_version;
        if let Some(scan) = child.scan.clone() {
            entry.failed_scans.push(scan);
        }
    }

    // Clusters the configuration declares but which never reported at all.
    for cluster in &result.scan_config.clusters {
        if succeeded.contains(&cluster.cluster_id) || failed.contains_key(&cluster.cluster_id) {
            continue;
        }
        debug!(cluster_id = %cluster.cluster_id, "Cluster never reported, querying health");
        let mut diagnosis = validate_cluster_health(&cluster.cluster_id, health).await;
        if diagnosis.reasons.is_empty() {
            // The agent looks healthy yet nothing arrived: nothing more
            // specific to tell the reader.
            diagnosis.reasons.push(REASON_INTERNAL_ERROR.to_string());
        }
        if diagnosis.cluster_name.is_empty() {
            diagnosis.cluster_name = cluster.cluster_name.clone();
        }
        failed.insert(cluster.cluster_id.clone(), diagnosis);
    }

    let error = match &result.error {
        Some(WatchError::ScanConfigTimeout) => Some(ValidationError::ScanConfigWatcherTimeout),
        Some(_) => Some(ValidationError::ScanWatchersFailed),
        None if !failed.is_empty() => {
            let mut ids: Vec<String> = failed.keys().cloned().collect();
            ids.sort_unstable();
            Some(ValidationError::ClustersFailed(ids))
        }
        None => None,
    };
    ValidationOutcome {
        failed_clusters: failed,
        error,
    }
}

/// Classify one failed scan result against the cluster's agent health.
///
/// Returns the failed-cluster diagnosis (or `None` for a successful result)
/// and whether the failure is an installation-level problem rather than a
/// run-time one.
pub async fn validate_scan_results(
    result: &ScanWatcherResult,
    health: &dyn IntegrationStore,
) -> (Option<FailedCluster>, bool) {
    let Some(error) = &result.error else {
        return (None, false);
    };
    let cluster_id = result.cluster_id();

    let mut diagnosis = validate_cluster_health(cluster_id, health).await;
    if !diagnosis.reasons.is_empty() {
        // The install itself is broken; the watcher error is secondary.
        return (Some(diagnosis), true);
    }

    let scan_name = result
        .scan
        .as_ref()
        .map_or("", |s| s.scan_name.as_str());
    let reason = match error {
        WatchError::ScanRemoved => reason_scan_removed(scan_name),
        WatchError::ScanTimeout => {
            if result.sensor_session.is_connected() {
                reason_scan_timeout(scan_name)
            } else {
                reason_scan_timeout_disconnected(scan_name)
            }
        }
        _ => REASON_INTERNAL_ERROR.to_string(),
    };
    diagnosis.reasons.push(reason);
    (Some(diagnosis), false)
}

/// Classify a cluster's live agent health into reason strings.
///
/// A healthy, current installation yields an empty `reasons` list; anything
/// else explains what is wrong with the install.
pub async fn validate_cluster_health(
    cluster_id: &str,
    health: &dyn IntegrationStore,
) -> FailedCluster {
    let mut failed = FailedCluster {
        cluster_id: cluster_id.to_string(),
        ..FailedCluster::default()
    };
    let integrations = match health.get_integrations_by_cluster(cluster_id).await {
        Ok(integrations) => integrations,
        Err(_) => {
            failed.reasons.push(REASON_INTERNAL_ERROR.to_string());
            return failed;
        }
    };
    let Some(integration) = integrations.first() else {
        failed.reasons.push(REASON_INTERNAL_ERROR.to_string());
        return failed;
    };
    failed.cluster_name = integration.cluster_name.clone();
    failed.operator_version = integration.version.clone();

    if !integration.operator_installed {
        failed
            .reasons
            .push(REASON_OPERATOR_NOT_INSTALLED.to_string());
    } else if !version_supported(&integration.version) {
        failed.reasons.push(REASON_OPERATOR_VERSION.to_string());
    } else if integration.status != OperatorStatus::Healthy {
        failed.reasons.push(REASON_OPERATOR_UNHEALTHY.to_string());
    }
    failed
}

/// Whether an operator version string meets [`MINIMUM_OPERATOR_VERSION`].
/// Unparseable versions are treated as unsupported.
fn version_supported(version: &str) -> bool {
    match (parse_version(version), parse_version(MINIMUM_OPERATOR_VERSION)) {
        (Some(actual), Some(minimum)) => actual >= minimum,
        _ => false,
    }
}

fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let trimmed = version.strip_prefix('v').unwrap_or(version);
    let mut parts = trimmed.splitn(3, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    // The patch segment may carry a pre-release suffix; ignore it.
    let patch = parts
        .next()
        .map_or(Some(0), |p| {
            p.split(|c: char| !c.is_ascii_digit())
                .next()
                .and_then(|digits| digits.parse().ok())
        })?;
    Some((major, minor, patch))
}
