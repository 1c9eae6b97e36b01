//! Watcher tuning knobs.

use std::time::Duration;

/// Timeouts and buffer sizes for the watcher event loops.
///
/// Injected at construction; there are no global defaults beyond
/// [`WatcherConfig::default`], which mirrors the control plane's shipped
/// settings (10 minutes per scan, 30 minutes per configuration run).
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How long a single-scan watcher waits for its checks before forcing
    /// termination. The window restarts when the scan restarts.
    pub scan_timeout: Duration,
    /// How long a scan-configuration watcher waits for all child results.
    pub scan_config_timeout: Duration,
    /// Capacity of each inbound message channel.
    pub channel_capacity: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(10 * 60),
            scan_config_timeout: Duration::from_secs(30 * 60),
            channel_capacity: 100,
        }
    }
}
