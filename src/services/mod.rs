//! Watcher state machines and failure classification.

pub mod cleanup;
pub mod config;
pub mod scan_config_watcher;
pub mod scan_watcher;
pub mod validator;
pub mod watcher_id;

pub use cleanup::delete_old_results_from_missing_scans;
pub use config::WatcherConfig;
pub use scan_config_watcher::{ConfigStores, ScanConfigWatcher};
pub use scan_watcher::ScanWatcher;
pub use validator::{
    validate_cluster_health, validate_scan_config_results, validate_scan_results,
    ValidationOutcome, MINIMUM_OPERATOR_VERSION,
};
pub use watcher_id::{id_from_check_result, id_from_scan, scan_watcher_id};
