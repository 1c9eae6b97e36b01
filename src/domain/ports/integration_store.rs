//! Compliance-agent health lookup port.

use async_trait::async_trait;

use crate::domain::error::StoreError;
use crate::domain::models::ComplianceIntegration;

/// Live installation and health status of the compliance agent per cluster.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    /// All integration records known for a cluster. An empty list means the
    /// control plane has no record of the agent in that cluster.
    async fn get_integrations_by_cluster(
        &self,
        cluster_id: &str,
    ) -> Result<Vec<ComplianceIntegration>, StoreError>;
}
