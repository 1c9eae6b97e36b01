//! Domain models for the scan-lifecycle watcher core.

pub mod integration;
pub mod results;
pub mod scan;
pub mod scan_config;
pub mod snapshot;

pub use integration::{ComplianceIntegration, OperatorStatus, SensorSession};
pub use results::{ScanConfigWatcherResult, ScanWatcherResult};
pub use scan::{
    CheckResult, Scan, CHECK_COUNT_ANNOTATION_KEY, LAST_SCANNED_ANNOTATION_KEY,
};
pub use scan_config::{ClusterRef, Profile, ScanConfiguration};
pub use snapshot::{FailedCluster, ReportSnapshot, ScanReference};
