//! Network Monitoring Abstraction
//!
//! Connectivity and server-reachability information for the offline
//! coordinator.

use async_trait::async_trait;

use crate::error::Result;

/// Network connection type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Cellular,
    WiFi,
    Ethernet,
    Other,
}

/// Whether the configured server answered a reachability probe.
///
/// Connectivity alone is not enough to stream: the machine can be on a
/// network that cannot reach the music server. `Unknown` means no probe has
/// run yet and is treated as reachable by the offline rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Yes,
    No,
    Unknown,
}

/// Snapshot of network state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Whether any network connection exists.
    pub connected: bool,
    /// Whether the music server is reachable over that connection.
    pub reachable: Reachability,
    pub network_type: Option<NetworkType>,
}

impl NetworkInfo {
    /// Fully online: connected and the server did not fail a probe.
    pub fn is_online(&self) -> bool {
        self.connected && self.reachable != Reachability::No
    }

    /// Snapshot representing no connectivity at all.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            reachable: Reachability::Unknown,
            network_type: None,
        }
    }
}

/// Network monitor trait
///
/// Lets the core derive the effective offline flag and flip the catalog
/// source when connectivity changes.
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get the current network snapshot.
    async fn network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently connected to any network.
    async fn is_connected(&self) -> bool {
        matches!(
            self.network_info().await,
            Ok(NetworkInfo {
                connected: true,
                ..
            })
        )
    }

    /// Subscribe to network state changes.
    ///
    /// Implementations emit a snapshot whenever the state changes. The
    /// stream ends (`None`) when the monitor shuts down.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network state changes
#[async_trait]
pub trait NetworkChangeStream: Send {
    /// Get the next network snapshot, or `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkInfo>;
}
