//! Profile lookup port.

use async_trait::async_trait;

use crate::domain::error::StoreError;
use crate::domain::models::Profile;

/// Read access to persisted compliance profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Search profiles by name across the given clusters.
    async fn search_profiles(
        &self,
        names: &[String],
        cluster_ids: &[String],
    ) -> Result<Vec<Profile>, StoreError>;
}
