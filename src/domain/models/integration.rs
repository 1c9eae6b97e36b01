//! Compliance-agent installation state and remote session liveness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Health of the compliance operator in a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorStatus {
    Healthy,
    Unhealthy,
}

impl Default for OperatorStatus {
    fn default() -> Self {
        Self::Unhealthy
    }
}

/// Installation record of the compliance agent in one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIntegration {
    pub cluster_id: String,
    pub cluster_name: String,
    pub version: String,
    pub operator_installed: bool,
    pub status: OperatorStatus,
}

/// Liveness handle for the connection to a remote cluster's sensor.
///
/// The watchers never act on this; it rides along in results so the
/// validator can distinguish "the scan timed out" from "the scan timed out
/// because the cluster went away".
#[derive(Debug, Clone)]
pub struct SensorSession {
    connected: Arc<AtomicBool>,
}

impl SensorSession {
    /// A session that is currently connected.
    pub fn new() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the remote session as lost. Irreversible.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Default for SensorSession {
    fn default() -> Self {
        Self::new()
    }
}
