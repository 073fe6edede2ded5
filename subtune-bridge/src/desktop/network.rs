//! Network Monitoring Implementation
//!
//! Desktop connectivity detection via TCP probes. Platform-specific APIs
//! (netlink, SystemConfiguration, Network List Manager) would be more
//! precise but need extra dependencies; a probe against a well-known
//! resolver plus an optional probe against the configured music server is
//! enough to drive the offline rule.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::network::{
    NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkType, Reachability,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// TCP-probe network monitor
pub struct ProbingNetworkMonitor {
    /// `host:port` of the music server, probed for reachability.
    server_addr: Option<String>,
}

impl ProbingNetworkMonitor {
    /// Monitor general connectivity only; reachability stays `Unknown`.
    pub fn new() -> Self {
        Self { server_addr: None }
    }

    /// Monitor connectivity and probe the given server address.
    pub fn with_server(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: Some(server_addr.into()),
        }
    }

    async fn probe(addr: &str) -> bool {
        matches!(
            tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }

    async fn snapshot(&self) -> NetworkInfo {
        let connected = Self::probe("8.8.8.8:53").await;
        let reachable = match (&self.server_addr, connected) {
            (Some(addr), true) => {
                if Self::probe(addr).await {
                    Reachability::Yes
                } else {
                    Reachability::No
                }
            }
            _ => Reachability::Unknown,
        };

        let info = NetworkInfo {
            connected,
            reachable,
            // Desktop cannot cheaply distinguish WiFi from Ethernet
            network_type: connected.then_some(NetworkType::Other),
        };
        debug!(?info, "Network probe completed");
        info
    }
}

impl Default for ProbingNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for ProbingNetworkMonitor {
    async fn network_info(&self) -> Result<NetworkInfo> {
        Ok(self.snapshot().await)
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(PollingChangeStream {
            monitor: ProbingNetworkMonitor {
                server_addr: self.server_addr.clone(),
            },
            last: None,
        }))
    }
}

/// Change stream that polls and emits only on state transitions
struct PollingChangeStream {
    monitor: ProbingNetworkMonitor,
    last: Option<NetworkInfo>,
}

#[async_trait]
impl NetworkChangeStream for PollingChangeStream {
    async fn next(&mut self) -> Option<NetworkInfo> {
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let info = self.monitor.snapshot().await;
            if self.last != Some(info) {
                self.last = Some(info);
                return Some(info);
            }
        }
    }
}
