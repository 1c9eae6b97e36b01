//! Compliwatch - scan-lifecycle coordination for compliance scanning
//!
//! Compliwatch tracks the asynchronous, distributed execution of compliance
//! scans run by remote agents across Kubernetes clusters and decides when a
//! scan, and the group of scans belonging to one scan configuration, have
//! finished: successfully, by timeout, or by cancellation.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, collaborator port traits, errors
//! - **Service Layer** (`services`): the two watcher state machines and the
//!   failure-classification validator
//! - **Sync Layer** (`sync`): completion signal, resettable deadline timer,
//!   ready queue
//!
//! The crate is an in-process library: persistence, search, and transports
//! are external collaborators reached only through the `domain::ports`
//! traits. A higher-level report manager creates one
//! [`ScanConfigWatcher`](services::ScanConfigWatcher) per active scan
//! configuration and one [`ScanWatcher`](services::ScanWatcher) per scan it
//! learns about, routes inbound scan and check-result messages to them, and
//! pipes each scan watcher's terminal result into the owning configuration
//! watcher. The finished aggregate lands in a [`sync::ReadyQueue`], where
//! the validator turns it into per-cluster failure diagnoses.
//!
//! # Example
//!
//! ```ignore
//! use compliwatch::services::{ScanWatcher, WatcherConfig};
//! use compliwatch::sync::ReadyQueue;
//!
//! #[tokio::main]
//! async fn main() {
//!     let queue = ReadyQueue::new();
//!     let watcher = ScanWatcher::spawn(
//!         "cluster-1:scan-1",
//!         Default::default(),
//!         queue.clone(),
//!         &WatcherConfig::default(),
//!     );
//!     // push scan and check-result messages, then:
//!     watcher.finished().wait().await;
//!     let result = queue.pull().unwrap();
//! }
//! ```

pub mod domain;
pub mod services;
pub mod sync;

// Re-export commonly used types for convenience
pub use domain::error::{StoreError, ValidationError, WatchError};
pub use domain::models::{
    CheckResult, ComplianceIntegration, FailedCluster, OperatorStatus, Profile, ReportSnapshot,
    Scan, ScanConfigWatcherResult, ScanConfiguration, ScanReference, ScanWatcherResult,
    SensorSession,
};
pub use domain::ports::{
    CheckResultStore, IntegrationStore, ProfileStore, ScanStore, SnapshotStore,
};
pub use services::{ConfigStores, ScanConfigWatcher, ScanWatcher, WatcherConfig};
pub use sync::{DeadlineTimer, ManualTimer, ManualTimerHandle, ReadyQueue, Signal, Timer};
