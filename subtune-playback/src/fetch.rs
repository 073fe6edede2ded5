//! # Download Orchestrator
//!
//! Stream-first resolution: a cache hit plays the local file with no
//! network traffic, a miss plays the remote stream URL immediately while a
//! background task tries to fill the cache for next time. Fills are
//! budget-gated (one reclaim attempt, then silent abandonment), deduplicated
//! per `(id, kind)`, and never surface failures to the player.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use subtune_catalog::{CatalogRepository, Song, SongId};
use subtune_runtime::events::{CacheEvent, CoreEvent};
use subtune_runtime::EventBus;
use tracing::{debug, info, warn};

use crate::budget::CacheBudgetManager;
use crate::error::{PlaybackError, Result};
use crate::store::{ContentKind, ContentStore};

/// Estimated transfer size for a song: duration at a typical transcode
/// bitrate, floored so short tracks still reserve a sane amount.
const AUDIO_BYTES_PER_SEC: u64 = 24_000;
const MIN_AUDIO_ESTIMATE: u64 = 10 * 1024 * 1024;
const COVER_ART_ESTIMATE: u64 = 256 * 1024;

/// Remote endpoint the orchestrator pulls media from. Implemented by the
/// service layer on top of the API client.
#[async_trait]
pub trait MediaEndpoint: Send + Sync {
    /// Authenticated streaming URL for a song.
    async fn stream_url(&self, song_id: &SongId) -> Result<String>;

    /// Authenticated cover art URL.
    async fn cover_art_url(&self, cover_art_id: &str) -> Result<String>;

    /// Fetch a media URL into memory, failing on non-2xx statuses.
    async fn download(&self, url: &str) -> Result<Bytes>;
}

/// Where the player should read a song from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayableUri {
    Local(PathBuf),
    Remote(String),
}

pub struct DownloadOrchestrator {
    endpoint: Arc<dyn MediaEndpoint>,
    store: Arc<ContentStore>,
    budget: Arc<CacheBudgetManager>,
    catalog: Arc<dyn CatalogRepository>,
    events: EventBus,
    in_flight: Arc<Mutex<HashSet<(String, ContentKind)>>>,
}

impl DownloadOrchestrator {
    pub fn new(
        endpoint: Arc<dyn MediaEndpoint>,
        store: Arc<ContentStore>,
        budget: Arc<CacheBudgetManager>,
        catalog: Arc<dyn CatalogRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            endpoint,
            store,
            budget,
            catalog,
            events,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether the song's audio is already cached.
    pub async fn has_local_audio(&self, song_id: &SongId) -> bool {
        self.store.exists(song_id.as_str(), ContentKind::Audio).await
    }

    /// Resolve a song to a playable source.
    ///
    /// Cache hit: the local path, no network. Miss: the remote stream URL,
    /// plus a spawned background fill for the audio and (when present) the
    /// cover art.
    pub async fn resolve(self: &Arc<Self>, song: &Song) -> Result<PlayableUri> {
        let id = song.id.as_str();
        if self.store.exists(id, ContentKind::Audio).await {
            let path = self.store.path_for(id, ContentKind::Audio).await?;
            debug!(song_id = id, "Cache hit, playing local file");
            return Ok(PlayableUri::Local(path));
        }

        let url = self.endpoint.stream_url(&song.id).await?;
        self.spawn_audio_fill(song.clone(), url.clone());
        self.spawn_cover_fill(song.clone());
        Ok(PlayableUri::Remote(url))
    }

    /// Local path for a song's cover art when cached, remote URL otherwise,
    /// `None` when the song has no art. No background fill; art is filled
    /// alongside the audio.
    pub async fn cover_uri(&self, song: &Song) -> Result<Option<PlayableUri>> {
        let Some(cover_id) = song.cover_art_id.as_deref() else {
            return Ok(None);
        };
        if self.store.exists(cover_id, ContentKind::Image).await {
            let path = self.store.path_for(cover_id, ContentKind::Image).await?;
            return Ok(Some(PlayableUri::Local(path)));
        }
        Ok(Some(PlayableUri::Remote(
            self.endpoint.cover_art_url(cover_id).await?,
        )))
    }

    fn begin(&self, content_id: &str, kind: ContentKind) -> bool {
        match self.in_flight.lock() {
            Ok(mut set) => set.insert((content_id.to_string(), kind)),
            Err(_) => false,
        }
    }

    fn finish(&self, content_id: &str, kind: ContentKind) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&(content_id.to_string(), kind));
        }
    }

    fn spawn_audio_fill(self: &Arc<Self>, song: Song, url: String) {
        let id = song.id.as_str().to_string();
        if !self.begin(&id, ContentKind::Audio) {
            debug!(song_id = %id, "Audio fill already in flight");
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.events
                .emit(CoreEvent::Cache(CacheEvent::FillStarted {
                    content_id: id.clone(),
                }))
                .ok();
            if let Err(reason) = this.fill_audio(&song, &url).await {
                debug!(song_id = %id, %reason, "Audio fill abandoned");
                this.events
                    .emit(CoreEvent::Cache(CacheEvent::FillSkipped {
                        content_id: id.clone(),
                        reason: reason.to_string(),
                    }))
                    .ok();
            }
            this.finish(&id, ContentKind::Audio);
        });
    }

    fn spawn_cover_fill(self: &Arc<Self>, song: Song) {
        let Some(cover_id) = song.cover_art_id.clone() else {
            return;
        };
        if !self.begin(&cover_id, ContentKind::Image) {
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(reason) = this.fill_cover(&cover_id).await {
                debug!(cover_id = %cover_id, %reason, "Cover fill abandoned");
            }
            this.finish(&cover_id, ContentKind::Image);
        });
    }

    /// Admission check with one reclaim retry. `Ok(false)` means there is
    /// genuinely no room; the fill gives up quietly.
    async fn admit(&self, estimate: u64) -> Result<bool> {
        if self.budget.has_space(estimate).await? {
            return Ok(true);
        }
        self.budget.reclaim(estimate).await;
        self.budget.has_space(estimate).await
    }

    async fn fill_audio(&self, song: &Song, url: &str) -> Result<()> {
        let id = song.id.as_str();
        let estimate = (song.duration_secs.max(0) as u64 * AUDIO_BYTES_PER_SEC)
            .max(MIN_AUDIO_ESTIMATE);

        if !self.admit(estimate).await? {
            return Err(PlaybackError::SourceUnavailable(
                "no cache space".to_string(),
            ));
        }
        if self.store.exists(id, ContentKind::Audio).await {
            return Ok(());
        }

        let bytes = self.endpoint.download(url).await?;
        let entry = self.store.write(id, ContentKind::Audio, bytes).await?;

        let mut record = song.clone();
        record.has_local_audio = true;
        if let Err(e) = self.catalog.upsert_song(&record).await {
            warn!(song_id = id, error = %e, "Failed to record cached song");
        }

        info!(song_id = id, size_bytes = entry.size_bytes, "Song cached");
        self.events
            .emit(CoreEvent::Cache(CacheEvent::FillCompleted {
                content_id: id.to_string(),
                size_bytes: entry.size_bytes,
            }))
            .ok();
        Ok(())
    }

    async fn fill_cover(&self, cover_id: &str) -> Result<()> {
        if self.store.exists(cover_id, ContentKind::Image).await {
            return Ok(());
        }
        if !self.admit(COVER_ART_ESTIMATE).await? {
            return Err(PlaybackError::SourceUnavailable(
                "no cache space".to_string(),
            ));
        }

        let url = self.endpoint.cover_art_url(cover_id).await?;
        let bytes = self.endpoint.download(&url).await?;
        self.store.write(cover_id, ContentKind::Image, bytes).await?;
        debug!(cover_id, "Cover art cached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use subtune_bridge::memory::{MemoryFileSystem, MemorySettingsStore};
    use subtune_catalog::{create_test_pool, SqliteCatalogRepository};
    use subtune_runtime::Preferences;

    /// Endpoint serving fixed-size bodies and counting downloads.
    struct FakeEndpoint {
        body_size: usize,
        downloads: AtomicUsize,
        fail_downloads: bool,
    }

    impl FakeEndpoint {
        fn new(body_size: usize) -> Self {
            Self {
                body_size,
                downloads: AtomicUsize::new(0),
                fail_downloads: false,
            }
        }

        fn failing() -> Self {
            Self {
                body_size: 0,
                downloads: AtomicUsize::new(0),
                fail_downloads: true,
            }
        }
    }

    #[async_trait]
    impl MediaEndpoint for FakeEndpoint {
        async fn stream_url(&self, song_id: &SongId) -> Result<String> {
            Ok(format!("https://srv/rest/stream.view?id={song_id}"))
        }

        async fn cover_art_url(&self, cover_art_id: &str) -> Result<String> {
            Ok(format!("https://srv/rest/getCoverArt.view?id={cover_art_id}"))
        }

        async fn download(&self, _url: &str) -> Result<Bytes> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            if self.fail_downloads {
                return Err(PlaybackError::SourceUnavailable("HTTP 503".to_string()));
            }
            Ok(Bytes::from(vec![0u8; self.body_size]))
        }
    }

    struct Fixture {
        store: Arc<ContentStore>,
        catalog: Arc<SqliteCatalogRepository>,
        preferences: Preferences,
        orchestrator: Arc<DownloadOrchestrator>,
        endpoint: Arc<FakeEndpoint>,
    }

    async fn fixture(endpoint: FakeEndpoint) -> Fixture {
        let fs = Arc::new(MemoryFileSystem::new());
        let store = Arc::new(ContentStore::new(fs));
        let preferences = Preferences::new(Arc::new(MemorySettingsStore::new()));
        let catalog = Arc::new(SqliteCatalogRepository::new(create_test_pool().await.unwrap()));
        let events = EventBus::default();
        let budget = Arc::new(CacheBudgetManager::new(
            store.clone(),
            preferences.clone(),
            catalog.clone(),
            events.clone(),
        ));
        let endpoint = Arc::new(endpoint);
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            endpoint.clone(),
            store.clone(),
            budget,
            catalog.clone(),
            events,
        ));
        Fixture {
            store,
            catalog,
            preferences,
            orchestrator,
            endpoint,
        }
    }

    fn song(id: &str) -> Song {
        Song {
            id: SongId::from(id),
            title: format!("Song {id}"),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            genre: None,
            duration_secs: 180,
            cover_art_id: None,
            has_local_audio: false,
        }
    }

    /// Wait for the spawned fill to settle.
    async fn settle(f: &Fixture, id: &str) {
        for _ in 0..200 {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            let busy = f
                .orchestrator
                .in_flight
                .lock()
                .unwrap()
                .contains(&(id.to_string(), ContentKind::Audio));
            if !busy {
                return;
            }
        }
        panic!("fill for {id} never settled");
    }

    #[tokio::test]
    async fn cache_hit_resolves_locally_without_network() {
        let f = fixture(FakeEndpoint::new(64)).await;
        f.store
            .write("s1", ContentKind::Audio, Bytes::from(vec![0u8; 64]))
            .await
            .unwrap();

        let uri = f.orchestrator.resolve(&song("s1")).await.unwrap();
        let expected = f.store.path_for("s1", ContentKind::Audio).await.unwrap();
        assert_eq!(uri, PlayableUri::Local(expected));
        assert_eq!(f.endpoint.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_miss_streams_and_fills_in_background() {
        let f = fixture(FakeEndpoint::new(64)).await;
        f.preferences.set_max_cache_size_gb(1.0).await.unwrap();

        let uri = f.orchestrator.resolve(&song("s1")).await.unwrap();
        assert!(matches!(uri, PlayableUri::Remote(url) if url.contains("id=s1")));

        settle(&f, "s1").await;
        assert!(f.store.exists("s1", ContentKind::Audio).await);

        let record = f
            .catalog
            .find_by_id(&SongId::from("s1"))
            .await
            .unwrap()
            .unwrap();
        assert!(record.has_local_audio);
    }

    #[tokio::test]
    async fn disabled_cache_streams_without_filling() {
        let f = fixture(FakeEndpoint::new(64)).await;
        f.preferences.set_max_cache_size_gb(0.0).await.unwrap();

        let uri = f.orchestrator.resolve(&song("s1")).await.unwrap();
        assert!(matches!(uri, PlayableUri::Remote(_)));

        settle(&f, "s1").await;
        assert!(!f.store.exists("s1", ContentKind::Audio).await);
        assert_eq!(f.endpoint.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_download_degrades_to_streaming() {
        let f = fixture(FakeEndpoint::failing()).await;
        f.preferences.set_max_cache_size_gb(1.0).await.unwrap();

        let uri = f.orchestrator.resolve(&song("s1")).await.unwrap();
        assert!(matches!(uri, PlayableUri::Remote(_)));

        settle(&f, "s1").await;
        assert!(!f.store.exists("s1", ContentKind::Audio).await);
        // No catalog record was invented for the failed fill.
        assert!(f.catalog.find_by_id(&SongId::from("s1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_resolve_does_not_restart_a_fill() {
        let f = fixture(FakeEndpoint::new(64)).await;
        f.preferences.set_max_cache_size_gb(1.0).await.unwrap();

        let s = song("s1");
        let _ = f.orchestrator.resolve(&s).await.unwrap();
        let _ = f.orchestrator.resolve(&s).await.unwrap();
        settle(&f, "s1").await;

        assert!(f.endpoint.downloads.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test]
    async fn cover_art_fills_alongside_audio() {
        let f = fixture(FakeEndpoint::new(64)).await;
        f.preferences.set_max_cache_size_gb(1.0).await.unwrap();

        let mut s = song("s1");
        s.cover_art_id = Some("al-1".to_string());
        let _ = f.orchestrator.resolve(&s).await.unwrap();

        settle(&f, "s1").await;
        for _ in 0..200 {
            if f.store.exists("al-1", ContentKind::Image).await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        assert!(f.store.exists("al-1", ContentKind::Image).await);

        let uri = f.orchestrator.cover_uri(&s).await.unwrap().unwrap();
        assert!(matches!(uri, PlayableUri::Local(_)));
    }

    #[tokio::test]
    async fn songs_without_art_have_no_cover_uri() {
        let f = fixture(FakeEndpoint::new(64)).await;
        assert!(f.orchestrator.cover_uri(&song("s1")).await.unwrap().is_none());
    }
}
