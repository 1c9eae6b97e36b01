//! Check-result store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::error::StoreError;

/// Deletion access to persisted check results.
///
/// Used after a configuration run finishes to purge results left behind by
/// scans that never reported in the run.
#[async_trait]
pub trait CheckResultStore: Send + Sync {
    /// Delete the results of `scan_ref_id` older than `older_than`.
    /// `include_unset` also deletes results with no recorded timestamp.
    async fn delete_old_results(
        &self,
        older_than: Option<DateTime<Utc>>,
        scan_ref_id: &str,
        include_unset: bool,
    ) -> Result<(), StoreError>;
}
