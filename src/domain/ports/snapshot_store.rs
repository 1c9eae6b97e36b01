//! Report-snapshot store port.

use async_trait::async_trait;

use crate::domain::error::StoreError;
use crate::domain::models::ReportSnapshot;

/// Get and upsert access to report snapshots.
///
/// The scan-configuration watcher appends scan references through a
/// read-modify-write of the persisted snapshot: fetch, mutate, upsert.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch a snapshot by report id.
    async fn get_snapshot(&self, report_id: &str) -> Result<Option<ReportSnapshot>, StoreError>;

    /// Store or replace a snapshot.
    async fn upsert_snapshot(&self, snapshot: ReportSnapshot) -> Result<(), StoreError>;
}
