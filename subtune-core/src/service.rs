//! # Service Facade
//!
//! Wires bridges, API client, catalog, cache and playback into one handle
//! for host applications. Browsing calls flip their source on the effective
//! offline flag: online they hit the server (and refresh the catalog cache
//! as a side effect), offline they serve songs with confirmed local audio
//! from the catalog.

use std::sync::Arc;

use subtune_api::{CredentialStore, ServerCredentials, SubsonicClient};
use subtune_catalog::{
    create_pool, CatalogRepository, DatabaseConfig, Song, SqliteCatalogRepository,
};
use subtune_playback::{
    CacheBudgetManager, CacheStats, ContentStore, DownloadOrchestrator, PlayQueue,
    PlaybackController, PlaybackStatus, PlayableUri, QueueSource, RepeatMode,
};
use subtune_runtime::events::{CoreEvent, Receiver};
use subtune_runtime::{CoreConfig, EventBus, OfflineCoordinator, Preferences};
use tracing::{info, warn};

use crate::endpoint::RemoteCatalog;
use crate::error::Result;

/// Number of songs a live library fetch asks for.
const LIBRARY_FETCH_SIZE: u32 = 100;
const SEARCH_FETCH_SIZE: u32 = 50;

/// Primary facade exposed to host applications.
pub struct SubtuneService {
    client: Arc<SubsonicClient>,
    catalog: Arc<dyn CatalogRepository>,
    budget: Arc<CacheBudgetManager>,
    orchestrator: Arc<DownloadOrchestrator>,
    offline: Arc<OfflineCoordinator>,
    controller: PlaybackController,
    preferences: Preferences,
    events: EventBus,
}

impl SubtuneService {
    /// Assemble the core from a validated configuration. Restores persisted
    /// credentials, opens the catalog database and starts the network
    /// watcher.
    pub async fn new(config: CoreConfig) -> Result<Self> {
        let events = EventBus::new(config.event_buffer);
        let preferences = Preferences::new(config.settings_store.clone());

        let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;
        let catalog: Arc<dyn CatalogRepository> = Arc::new(SqliteCatalogRepository::new(pool));

        let client = Arc::new(SubsonicClient::new(
            config.http_client.clone(),
            CredentialStore::new(config.secure_store.clone()),
        ));
        client.initialize().await?;

        let store = Arc::new(ContentStore::new(config.file_system.clone()));
        let budget = Arc::new(CacheBudgetManager::new(
            store.clone(),
            preferences.clone(),
            catalog.clone(),
            events.clone(),
        ));
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            Arc::new(RemoteCatalog::new(client.clone())),
            store,
            budget.clone(),
            catalog.clone(),
            events.clone(),
        ));

        let offline = Arc::new(OfflineCoordinator::new(
            preferences.clone(),
            config.network_monitor.clone(),
            events.clone(),
        ));
        if let Err(e) = offline.refresh().await {
            warn!(error = %e, "Initial network probe failed");
        }
        offline.spawn_watch();

        let controller = PlaybackController::new(
            config.transport.clone(),
            orchestrator.clone(),
            offline.clone(),
            events.clone(),
        );

        info!("Core service assembled");
        Ok(Self {
            client,
            catalog,
            budget,
            orchestrator,
            offline,
            controller,
            preferences,
            events,
        })
    }

    /// Subscribe to core events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Server configuration
    // ------------------------------------------------------------------

    /// Validate credentials against the server and persist them.
    pub async fn configure_server(&self, credentials: ServerCredentials) -> Result<()> {
        self.client.configure(credentials).await?;
        Ok(())
    }

    /// Forget the configured server.
    pub async fn reset_server(&self) -> Result<()> {
        self.client.reset().await?;
        Ok(())
    }

    pub async fn is_configured(&self) -> bool {
        self.client.is_configured().await
    }

    // ------------------------------------------------------------------
    // Browsing
    // ------------------------------------------------------------------

    /// Songs available right now. Online: a live fetch, cached into the
    /// catalog for later offline browsing. Offline: songs with a locally
    /// cached audio file.
    pub async fn available_songs(&self) -> Result<Vec<Song>> {
        if self.offline.effective_offline().await? {
            return Ok(self.catalog.songs_with_local_audio().await?);
        }

        let songs = self.client.get_random_songs(LIBRARY_FETCH_SIZE).await?;
        self.remember(&songs).await;
        Ok(songs)
    }

    /// Search songs; the server when online, the catalog cache otherwise.
    pub async fn search(&self, query: &str) -> Result<Vec<Song>> {
        if self.offline.effective_offline().await? {
            return Ok(self.catalog.search(query).await?);
        }

        let songs = self.client.search(query, SEARCH_FETCH_SIZE).await?;
        self.remember(&songs).await;
        Ok(songs)
    }

    /// Songs of a server-side playlist. Requires connectivity.
    pub async fn playlist_songs(&self, playlist_id: &str) -> Result<Vec<Song>> {
        let songs = self.client.get_playlist(playlist_id).await?;
        self.remember(&songs).await;
        Ok(songs)
    }

    /// Cached metadata refresh is best-effort; browsing must not fail
    /// because a local write did.
    async fn remember(&self, songs: &[Song]) {
        for song in songs {
            if let Err(e) = self.catalog.upsert_song(song).await {
                warn!(song_id = %song.id, error = %e, "Failed to cache song metadata");
            }
        }
    }

    /// Cover art for a song: local path when cached, remote URL otherwise.
    pub async fn cover_uri(&self, song: &Song) -> Result<Option<PlayableUri>> {
        Ok(self.orchestrator.cover_uri(song).await?)
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    pub async fn play(&self, songs: Vec<Song>, source: QueueSource, start: usize) -> Result<()> {
        self.controller
            .play_queue(PlayQueue::new(songs, source), start)
            .await?;
        Ok(())
    }

    pub async fn next(&self) -> Result<()> {
        Ok(self.controller.next().await?)
    }

    pub async fn previous(&self) -> Result<()> {
        Ok(self.controller.previous().await?)
    }

    pub async fn pause(&self) -> Result<()> {
        Ok(self.controller.pause().await?)
    }

    pub async fn resume(&self) -> Result<()> {
        Ok(self.controller.resume().await?)
    }

    pub async fn stop(&self) -> Result<()> {
        Ok(self.controller.stop().await?)
    }

    pub async fn seek_to(&self, position: std::time::Duration) -> Result<()> {
        Ok(self.controller.seek_to(position).await?)
    }

    pub async fn seek_forward(&self) -> Result<()> {
        Ok(self.controller.seek_forward().await?)
    }

    pub async fn seek_backward(&self) -> Result<()> {
        Ok(self.controller.seek_backward().await?)
    }

    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        Ok(self.controller.set_rate(rate).await?)
    }

    pub async fn toggle_shuffle(&self) {
        self.controller.toggle_shuffle().await
    }

    pub async fn set_shuffle(&self, shuffle: bool) {
        self.controller.set_shuffle(shuffle).await
    }

    pub async fn cycle_repeat(&self) {
        self.controller.cycle_repeat().await
    }

    pub async fn set_repeat(&self, repeat: RepeatMode) {
        self.controller.set_repeat(repeat).await
    }

    pub async fn playback_status(&self) -> PlaybackStatus {
        self.controller.status().await
    }

    pub async fn current_song(&self) -> Option<Song> {
        self.controller.current_song().await
    }

    // ------------------------------------------------------------------
    // Offline mode & cache
    // ------------------------------------------------------------------

    /// The derived offline flag (preference OR no usable connectivity).
    pub async fn is_offline(&self) -> Result<bool> {
        Ok(self.offline.effective_offline().await?)
    }

    /// Set the user's offline preference.
    pub async fn set_offline_mode(&self, offline: bool) -> Result<()> {
        Ok(self.offline.set_offline_mode(offline).await?)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.budget.stats().await
    }

    pub async fn clear_cache(&self) -> Result<usize> {
        Ok(self.budget.clear_cache().await?)
    }

    pub async fn max_cache_size_gb(&self) -> Result<f64> {
        Ok(self.preferences.max_cache_size_gb().await?)
    }

    pub async fn set_max_cache_size_gb(&self, gigabytes: f64) -> Result<()> {
        Ok(self.preferences.set_max_cache_size_gb(gigabytes).await?)
    }
}
