//! Offline coordinator
//!
//! Collapses connectivity (`connected`, `reachable`) and the persisted user
//! preference into one derived flag:
//!
//! ```text
//! effective_offline = offline_mode_pref OR NOT (connected AND reachable != No)
//! ```
//!
//! Transition rules:
//! - Losing connectivity while the preference is `false` persists
//!   `offline_mode = true` so the UI reflects a durable choice, not a
//!   transient flag.
//! - Regaining connectivity never auto-clears a persisted `true`; the user
//!   must disable offline mode explicitly.
//!
//! Every change is published on the event bus so dependents can flip the
//! "available songs" source between the live catalog and the local metadata
//! cache.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use subtune_bridge::{NetworkInfo, NetworkMonitor};

use crate::error::Result;
use crate::events::{CoreEvent, EventBus, NetworkEvent};
use crate::preferences::Preferences;

/// Derives and maintains the effective offline flag.
pub struct OfflineCoordinator {
    preferences: Preferences,
    monitor: Arc<dyn NetworkMonitor>,
    events: EventBus,
    last_info: Mutex<NetworkInfo>,
}

impl OfflineCoordinator {
    pub fn new(
        preferences: Preferences,
        monitor: Arc<dyn NetworkMonitor>,
        events: EventBus,
    ) -> Self {
        Self {
            preferences,
            monitor,
            events,
            last_info: Mutex::new(NetworkInfo::disconnected()),
        }
    }

    /// Query the monitor once and apply the transition rules.
    pub async fn refresh(&self) -> Result<bool> {
        let info = self.monitor.network_info().await?;
        self.apply(info).await
    }

    /// The current derived flag, using the last observed network snapshot.
    pub async fn effective_offline(&self) -> Result<bool> {
        if self.preferences.offline_mode().await? {
            return Ok(true);
        }
        Ok(!self.last_info.lock().await.is_online())
    }

    /// Explicit user toggle; persists and notifies.
    pub async fn set_offline_mode(&self, offline: bool) -> Result<()> {
        self.preferences.set_offline_mode(offline).await?;
        info!(offline, "Offline mode set by user");
        self.events
            .emit(CoreEvent::Network(NetworkEvent::OfflineModeChanged {
                offline,
                forced: false,
            }))
            .ok();
        Ok(())
    }

    /// Apply a network snapshot: update state, persist a forced offline
    /// preference when connectivity is lost, publish change events.
    pub async fn apply(&self, info: NetworkInfo) -> Result<bool> {
        let previous = {
            let mut last = self.last_info.lock().await;
            std::mem::replace(&mut *last, info)
        };

        if previous.is_online() != info.is_online() {
            self.events
                .emit(CoreEvent::Network(NetworkEvent::ConnectivityChanged {
                    online: info.is_online(),
                }))
                .ok();
        }

        let preference = self.preferences.offline_mode().await?;
        if !info.is_online() && !preference {
            // Durable flip; coming back online must not undo it.
            self.preferences.set_offline_mode(true).await?;
            info!("Connectivity lost, persisting offline mode");
            self.events
                .emit(CoreEvent::Network(NetworkEvent::OfflineModeChanged {
                    offline: true,
                    forced: true,
                }))
                .ok();
            return Ok(true);
        }

        debug!(
            online = info.is_online(),
            preference, "Network snapshot applied"
        );
        Ok(preference || !info.is_online())
    }

    /// Spawn a task consuming monitor change events until the stream closes.
    pub fn spawn_watch(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut stream = match coordinator.monitor.subscribe_changes().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Network monitor subscription failed");
                    return;
                }
            };
            while let Some(info) = stream.next().await {
                if let Err(e) = coordinator.apply(info).await {
                    warn!(error = %e, "Failed to apply network change");
                }
            }
            debug!("Network change stream closed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subtune_bridge::memory::{MemorySettingsStore, StaticNetworkMonitor};
    use subtune_bridge::{NetworkType, Reachability};

    fn online() -> NetworkInfo {
        NetworkInfo {
            connected: true,
            reachable: Reachability::Yes,
            network_type: Some(NetworkType::WiFi),
        }
    }

    fn offline() -> NetworkInfo {
        NetworkInfo::disconnected()
    }

    fn coordinator() -> (Arc<OfflineCoordinator>, Preferences) {
        let prefs = Preferences::new(Arc::new(MemorySettingsStore::new()));
        let monitor = Arc::new(StaticNetworkMonitor::new(online()));
        let coordinator = Arc::new(OfflineCoordinator::new(
            prefs.clone(),
            monitor,
            EventBus::new(16),
        ));
        (coordinator, prefs)
    }

    #[tokio::test]
    async fn connectivity_loss_persists_offline_mode() {
        let (coordinator, prefs) = coordinator();
        coordinator.apply(online()).await.unwrap();
        assert!(!prefs.offline_mode().await.unwrap());

        let effective = coordinator.apply(offline()).await.unwrap();
        assert!(effective);
        assert!(prefs.offline_mode().await.unwrap());
    }

    #[tokio::test]
    async fn reconnect_does_not_auto_revert() {
        let (coordinator, prefs) = coordinator();
        coordinator.apply(offline()).await.unwrap();
        assert!(prefs.offline_mode().await.unwrap());

        let effective = coordinator.apply(online()).await.unwrap();
        assert!(effective, "persisted preference keeps us offline");
        assert!(prefs.offline_mode().await.unwrap());
    }

    #[tokio::test]
    async fn user_can_clear_offline_mode() {
        let (coordinator, prefs) = coordinator();
        coordinator.apply(offline()).await.unwrap();
        coordinator.apply(online()).await.unwrap();

        coordinator.set_offline_mode(false).await.unwrap();
        assert!(!prefs.offline_mode().await.unwrap());
        assert!(!coordinator.effective_offline().await.unwrap());
    }

    #[tokio::test]
    async fn failed_server_probe_counts_as_offline() {
        let (coordinator, _prefs) = coordinator();
        let unreachable = NetworkInfo {
            connected: true,
            reachable: Reachability::No,
            network_type: Some(NetworkType::Ethernet),
        };
        let effective = coordinator.apply(unreachable).await.unwrap();
        assert!(effective);
    }

    #[tokio::test]
    async fn change_events_are_published() {
        let prefs = Preferences::new(Arc::new(MemorySettingsStore::new()));
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();
        let monitor = Arc::new(StaticNetworkMonitor::new(online()));
        let coordinator = OfflineCoordinator::new(prefs, monitor, bus);

        coordinator.apply(online()).await.unwrap();
        coordinator.apply(offline()).await.unwrap();

        // Initial state is disconnected, so the first apply is itself a
        // transition to online.
        assert_eq!(
            sub.recv().await.unwrap(),
            CoreEvent::Network(NetworkEvent::ConnectivityChanged { online: true })
        );
        assert_eq!(
            sub.recv().await.unwrap(),
            CoreEvent::Network(NetworkEvent::ConnectivityChanged { online: false })
        );
        assert_eq!(
            sub.recv().await.unwrap(),
            CoreEvent::Network(NetworkEvent::OfflineModeChanged {
                offline: true,
                forced: true
            })
        );
    }

    #[tokio::test]
    async fn watch_task_consumes_monitor_stream() {
        let prefs = Preferences::new(Arc::new(MemorySettingsStore::new()));
        let monitor = Arc::new(StaticNetworkMonitor::new(online()));
        let coordinator = Arc::new(OfflineCoordinator::new(
            prefs.clone(),
            Arc::clone(&monitor) as Arc<dyn NetworkMonitor>,
            EventBus::new(16),
        ));
        let handle = coordinator.spawn_watch();

        // Re-push until the watcher task has subscribed and applied it.
        for _ in 0..50 {
            monitor.set_info(offline());
            if prefs.offline_mode().await.unwrap() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(prefs.offline_mode().await.unwrap());
        handle.abort();
    }
}
