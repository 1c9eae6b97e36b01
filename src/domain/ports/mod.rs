//! Port trait definitions (Hexagonal Architecture)
//!
//! These async traits are the narrow seams between the watcher core and the
//! excluded persistence layer. The core only calls them synchronously from
//! its event loops; implementations live in the surrounding control plane.

pub mod check_result_store;
pub mod integration_store;
pub mod profile_store;
pub mod scan_store;
pub mod snapshot_store;

pub use check_result_store::CheckResultStore;
pub use integration_store::IntegrationStore;
pub use profile_store::ProfileStore;
pub use scan_store::ScanStore;
pub use snapshot_store::SnapshotStore;
