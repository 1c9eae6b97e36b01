//! Scan and check-result domain models.
//!
//! Scans arrive from remote clusters as status messages carrying two
//! annotations written by the compliance operator: the number of checks the
//! scan will produce, and the wall-clock time the current run started. Both
//! are string-valued and may be absent or malformed on any given message.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Annotation key carrying the total number of checks a scan will emit.
pub const CHECK_COUNT_ANNOTATION_KEY: &str = "compliance.openshift.io/check-count";

/// Annotation key carrying the RFC 3339 timestamp of the run a check result
/// belongs to.
pub const LAST_SCANNED_ANNOTATION_KEY: &str = "compliance.openshift.io/last-scanned-timestamp";

/// One execution of a compliance check suite against a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    /// Unique scan id assigned by the operator.
    pub id: String,
    /// Id of the cluster the scan runs against.
    pub cluster_id: String,
    /// Name of the scan configuration that produced this scan.
    pub scan_config_name: String,
    /// Human-readable scan name.
    pub scan_name: String,
    /// Stable reference id correlating the scan across restarts.
    pub scan_ref_id: String,
    /// When the current run of this scan started. Used to detect restarts.
    pub last_started_time: Option<DateTime<Utc>>,
    /// Operator-written annotations.
    pub annotations: HashMap<String, String>,
}

impl Scan {
    /// The declared check count, if the annotation is present and parses.
    ///
    /// Returns `Some(Err(raw))` when the annotation exists but is not a
    /// number, so callers can log the malformed value.
    pub fn check_count(&self) -> Option<Result<usize, &str>> {
        self.annotations
            .get(CHECK_COUNT_ANNOTATION_KEY)
            .map(|raw| raw.parse::<usize>().map_err(|_| raw.as_str()))
    }
}

/// The outcome of one individual compliance rule evaluation within a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Unique result id.
    pub id: String,
    /// Id of the rule this result evaluates. Distinct per scan run.
    pub check_id: String,
    /// Reference id of the owning scan.
    pub scan_ref_id: String,
    /// Operator-written annotations.
    pub annotations: HashMap<String, String>,
}

impl CheckResult {
    /// The run timestamp this result belongs to, if the annotation is
    /// present and parses as RFC 3339.
    pub fn last_scanned_time(&self) -> Option<Result<DateTime<Utc>, &str>> {
        self.annotations.get(LAST_SCANNED_ANNOTATION_KEY).map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| raw.as_str())
        })
    }
}
