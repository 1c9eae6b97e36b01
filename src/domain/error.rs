//! Error types for the watcher core.
//!
//! Watcher failures never cross the public API as panics: they travel inside
//! the terminal result pushed to the ready queue. The only error a `push_*`
//! call can return is [`WatchError::Stopped`].

use thiserror::Error;

/// Errors produced by datastore collaborators.
///
/// Implementations of the port traits map their backend failures into these
/// variants; the watchers only distinguish "the lookup failed" from "the
/// record does not exist".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Terminal and push-time errors of the watcher state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    /// The scan watcher's deadline fired before all checks arrived.
    #[error("scan watcher timed out")]
    ScanTimeout,

    /// The scan watcher was cancelled before completion.
    #[error("scan watcher context cancelled")]
    ScanContextCancelled,

    /// The scan under watch was removed from the cluster mid-run.
    #[error("scan was removed")]
    ScanRemoved,

    /// The scan-configuration watcher's deadline fired before every scan
    /// reported.
    #[error("scan config watcher timed out")]
    ScanConfigTimeout,

    /// The scan-configuration watcher was cancelled before completion.
    #[error("scan config watcher context cancelled")]
    ScanConfigContextCancelled,

    /// A `"clusterID:scanID"` key was delivered twice to the same
    /// scan-configuration watcher. Duplicate delivery is a caller bug and
    /// terminates the watcher.
    #[error("scan {0} already handled by this watcher")]
    DuplicateScan(String),

    /// The configuration declares profiles and clusters that match no scans.
    #[error("no scans found for scan configuration {0}")]
    NoScansFound(String),

    /// No scan could be resolved for a check result's scan reference.
    #[error("no scan found for reference {0}")]
    ScanNotFound(String),

    /// A message was pushed after the watcher's cancellation signal was set.
    #[error("watcher stopped")]
    Stopped,

    /// A datastore lookup required to reach a terminal state failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Overall outcome errors of scan-configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The aggregate result carried a configuration-level timeout.
    #[error("scan configuration watcher timed out")]
    ScanConfigWatcherTimeout,

    /// The aggregate result carried some other top-level error.
    #[error("scan watchers failed")]
    ScanWatchersFailed,

    /// Individual clusters failed; the ids are listed for the report.
    #[error("clusters failed compliance scanning: {}", .0.join(", "))]
    ClustersFailed(Vec<String>),
}
