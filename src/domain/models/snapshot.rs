//! Report snapshot models.
//!
//! A snapshot is the persisted record of one report-generation run. While
//! scans are still in flight the scan-configuration watcher appends scan
//! references to every subscribed snapshot; the validator later attaches the
//! failed-cluster diagnoses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scan::Scan;

/// A reference from a snapshot to one scan run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReference {
    pub scan_ref_id: String,
    pub last_started_time: Option<DateTime<Utc>>,
}

/// A cluster that failed to deliver a usable scan result, with the reasons
/// a report reader sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailedCluster {
    pub cluster_id: String,
    pub cluster_name: String,
    /// Version of the compliance operator in the cluster, when known.
    pub operator_version: String,
    /// Human-readable diagnostic strings, in the order they were found.
    pub reasons: Vec<String>,
    /// Scans attributed to this cluster that failed.
    pub failed_scans: Vec<Scan>,
}

/// A persisted record accumulating scan references for one report run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub report_id: String,
    pub scan_config_id: String,
    pub scans: Vec<ScanReference>,
    pub failed_clusters: Vec<FailedCluster>,
}

impl ReportSnapshot {
    /// Append a scan reference unless one with the same ref id is already
    /// recorded.
    pub fn add_scan_reference(&mut self, reference: ScanReference) {
        if self
            .scans
            .iter()
            .any(|r| r.scan_ref_id == reference.scan_ref_id)
        {
            return;
        }
        self.scans.push(reference);
    }
}
