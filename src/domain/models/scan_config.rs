//! Scan configuration and profile models.

use serde::{Deserialize, Serialize};

/// A cluster bound to a scan configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRef {
    pub cluster_id: String,
    pub cluster_name: String,
}

/// A named policy binding compliance profiles to clusters.
///
/// One configuration may produce many scans: one or more per cluster and
/// profile combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfiguration {
    pub id: String,
    pub name: String,
    /// Names of the profiles this configuration runs.
    pub profiles: Vec<String>,
    /// Clusters this configuration targets.
    pub clusters: Vec<ClusterRef>,
}

impl ScanConfiguration {
    /// Ids of all clusters declared by this configuration.
    pub fn cluster_ids(&self) -> Vec<String> {
        self.clusters.iter().map(|c| c.cluster_id.clone()).collect()
    }
}

/// A compliance profile as resolved for one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    /// Stable reference id used to search the scans running this profile.
    pub profile_ref_id: String,
    pub cluster_id: String,
}
