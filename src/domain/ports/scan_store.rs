//! Scan lookup port.

use async_trait::async_trait;

use crate::domain::error::StoreError;
use crate::domain::models::Scan;

/// Read access to persisted scans.
///
/// The watcher core only searches and fetches; persistence itself is owned
/// by the surrounding control plane.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Search the scans running the given profiles on the given clusters.
    async fn search_scans(
        &self,
        profile_ref_ids: &[String],
        cluster_ids: &[String],
    ) -> Result<Vec<Scan>, StoreError>;

    /// Search scans by their stable reference id.
    async fn search_scans_by_ref(&self, scan_ref_id: &str) -> Result<Vec<Scan>, StoreError>;

    /// Fetch one scan by id.
    async fn get_scan(&self, id: &str) -> Result<Option<Scan>, StoreError>;
}
