//! End-to-end cache behavior through the public API: background fills stay
//! within the configured budget, and eviction makes room for new content
//! while keeping the quota invariant.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use subtune_bridge::memory::{MemoryFileSystem, MemorySettingsStore};
use subtune_catalog::{create_test_pool, CatalogRepository, Song, SongId, SqliteCatalogRepository};
use subtune_playback::{
    CacheBudgetManager, ContentKind, ContentStore, DownloadOrchestrator, MediaEndpoint,
    PlayableUri, Result,
};
use subtune_runtime::preferences::BYTES_PER_GB;
use subtune_runtime::{EventBus, Preferences};

/// Serves bodies sized `duration_secs` bytes so tests control cache usage
/// precisely by picking durations.
struct SizedEndpoint;

#[async_trait]
impl MediaEndpoint for SizedEndpoint {
    async fn stream_url(&self, song_id: &SongId) -> Result<String> {
        Ok(format!("https://srv/rest/stream.view?id={song_id}"))
    }

    async fn cover_art_url(&self, cover_art_id: &str) -> Result<String> {
        Ok(format!("https://srv/rest/getCoverArt.view?id={cover_art_id}"))
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        // id=<n> encodes the body size.
        let size: usize = url
            .rsplit("id=sz")
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(64);
        Ok(Bytes::from(vec![0u8; size]))
    }
}

struct Harness {
    fs: Arc<MemoryFileSystem>,
    store: Arc<ContentStore>,
    budget: Arc<CacheBudgetManager>,
    orchestrator: Arc<DownloadOrchestrator>,
    catalog: Arc<SqliteCatalogRepository>,
    preferences: Preferences,
}

async fn harness() -> Harness {
    let fs = Arc::new(MemoryFileSystem::new());
    let store = Arc::new(ContentStore::new(fs.clone()));
    let preferences = Preferences::new(Arc::new(MemorySettingsStore::new()));
    let catalog = Arc::new(SqliteCatalogRepository::new(create_test_pool().await.unwrap()));
    let events = EventBus::default();
    let budget = Arc::new(CacheBudgetManager::new(
        store.clone(),
        preferences.clone(),
        catalog.clone(),
        events.clone(),
    ));
    let orchestrator = Arc::new(DownloadOrchestrator::new(
        Arc::new(SizedEndpoint),
        store.clone(),
        budget.clone(),
        catalog.clone(),
        events,
    ));
    Harness {
        fs,
        store,
        budget,
        orchestrator,
        catalog,
        preferences,
    }
}

async fn set_budget_bytes(h: &Harness, bytes: u64) {
    h.preferences
        .set_max_cache_size_gb(bytes as f64 / BYTES_PER_GB)
        .await
        .unwrap();
}

fn song(n: u64) -> Song {
    Song {
        id: SongId::from(format!("sz{n}").as_str()),
        title: format!("Track {n}"),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        genre: None,
        duration_secs: 0,
        cover_art_id: None,
        has_local_audio: false,
    }
}

async fn resolve_and_settle(h: &Harness, song: &Song) -> PlayableUri {
    let uri = h.orchestrator.resolve(song).await.unwrap();
    // Background fills have no completion future to await; poll the store.
    for _ in 0..500 {
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        if h.store.exists(song.id.as_str(), ContentKind::Audio).await {
            break;
        }
    }
    uri
}

/// One minimum-estimate admission plus a little slack, so consecutive
/// fills must evict to get admitted.
const TIGHT_BUDGET: u64 = 10 * 1024 * 1024 + 500;

#[tokio::test]
async fn fills_never_leave_usage_above_budget_after_reclaim() {
    let h = harness().await;
    set_budget_bytes(&h, TIGHT_BUDGET).await;

    for n in [1000u64, 2000, 3000, 4000] {
        let s = song(n);
        let _ = resolve_and_settle(&h, &s).await;
        let usage = h.budget.usage().await;
        let max = h.budget.max_bytes().await.unwrap();
        assert!(usage <= max, "usage {usage} exceeded budget {max}");
    }
}

#[tokio::test]
async fn admission_evicts_oldest_to_make_room() {
    let h = harness().await;
    set_budget_bytes(&h, TIGHT_BUDGET).await;

    // Each fill reserves the 10 MiB minimum estimate, so the tight budget
    // holds one entry at a time; the second fill evicts the first.
    let first = song(1000);
    resolve_and_settle(&h, &first).await;
    assert!(h.store.exists("sz1000", ContentKind::Audio).await);

    let second = song(2000);
    resolve_and_settle(&h, &second).await;
    assert!(h.store.exists("sz2000", ContentKind::Audio).await);
    assert!(
        !h.store.exists("sz1000", ContentKind::Audio).await,
        "oldest entry should have been evicted"
    );

    // The evicted song keeps its catalog record, minus the audio flag.
    let record = h
        .catalog
        .find_by_id(&SongId::from("sz1000"))
        .await
        .unwrap()
        .unwrap();
    assert!(!record.has_local_audio);
}

#[tokio::test]
async fn second_resolve_is_a_local_hit() {
    let h = harness().await;
    set_budget_bytes(&h, 64 * 1024 * 1024).await;

    let s = song(500);
    let first = resolve_and_settle(&h, &s).await;
    assert!(matches!(first, PlayableUri::Remote(_)));

    let second = h.orchestrator.resolve(&s).await.unwrap();
    let expected = h.store.path_for("sz500", ContentKind::Audio).await.unwrap();
    assert_eq!(second, PlayableUri::Local(expected));
}

#[tokio::test]
async fn clearing_the_cache_resets_usage_and_flags() {
    let h = harness().await;
    set_budget_bytes(&h, 64 * 1024 * 1024).await;

    let s = song(700);
    resolve_and_settle(&h, &s).await;
    assert!(h.budget.usage().await > 0);
    assert!(h.fs.file_count() > 0);

    h.budget.clear_cache().await.unwrap();
    assert_eq!(h.budget.usage().await, 0);
    let record = h
        .catalog
        .find_by_id(&SongId::from("sz700"))
        .await
        .unwrap()
        .unwrap();
    assert!(!record.has_local_audio);
}
