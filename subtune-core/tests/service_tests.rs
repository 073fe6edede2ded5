//! Service-level wiring tests: the browsing source flips with the offline
//! flag, and playback fills feed the offline catalog.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use subtune_bridge::memory::{
    MemoryFileSystem, MemorySecureStore, MemorySettingsStore, StaticNetworkMonitor,
};
use subtune_bridge::transport::{AudioSource, TransportEvent, TransportHandle};
use subtune_bridge::{
    AudioTransport, HttpClient, HttpRequest, HttpResponse, NetworkInfo, Reachability,
};
use subtune_core::{
    CoreConfig, PlaybackStatus, QueueSource, ServerCredentials, Song, SongId, SubtuneService,
};
use tokio::sync::mpsc;

/// Routes requests by URL substring instead of call order.
struct RoutedHttp;

const PING_OK: &str = r#"{"subsonic-response":{"status":"ok"}}"#;
const RANDOM_SONGS: &str = r#"{"subsonic-response":{"status":"ok","randomSongs":{"song":[
    {"id":"s1","title":"Alpha","artist":"A","album":"X","duration":120},
    {"id":"s2","title":"Beta","artist":"B","album":"Y","duration":240}
]}}}"#;

#[async_trait]
impl HttpClient for RoutedHttp {
    async fn execute(&self, request: HttpRequest) -> subtune_bridge::error::Result<HttpResponse> {
        let body = if request.url.contains("/rest/ping.view") {
            Bytes::from_static(PING_OK.as_bytes())
        } else if request.url.contains("/rest/getRandomSongs.view") {
            Bytes::from_static(RANDOM_SONGS.as_bytes())
        } else if request.url.contains("/rest/stream.view") {
            Bytes::from(vec![0u8; 2048])
        } else {
            Bytes::from_static(PING_OK.as_bytes())
        };
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body,
        })
    }
}

/// Transport that accepts everything and does nothing.
struct PassiveTransport;
struct PassiveHandle;

#[async_trait]
impl AudioTransport for PassiveTransport {
    async fn open(
        &self,
        _source: AudioSource,
        _events: mpsc::UnboundedSender<TransportEvent>,
    ) -> subtune_bridge::error::Result<Box<dyn TransportHandle>> {
        Ok(Box::new(PassiveHandle))
    }
}

#[async_trait]
impl TransportHandle for PassiveHandle {
    async fn play(&mut self) -> subtune_bridge::error::Result<()> {
        Ok(())
    }
    async fn pause(&mut self) -> subtune_bridge::error::Result<()> {
        Ok(())
    }
    async fn seek(&mut self, _position: Duration) -> subtune_bridge::error::Result<()> {
        Ok(())
    }
    async fn set_rate(&mut self, _rate: f32) -> subtune_bridge::error::Result<()> {
        Ok(())
    }
    async fn position(&self) -> subtune_bridge::error::Result<Duration> {
        Ok(Duration::ZERO)
    }
    async fn duration(&self) -> subtune_bridge::error::Result<Option<Duration>> {
        Ok(None)
    }
    async fn release(self: Box<Self>) -> subtune_bridge::error::Result<()> {
        Ok(())
    }
}

fn online() -> NetworkInfo {
    NetworkInfo {
        connected: true,
        reachable: Reachability::Yes,
        network_type: None,
    }
}

async fn service(info: NetworkInfo) -> SubtuneService {
    let config = CoreConfig::builder()
        .database_path(":memory:")
        .http_client(Arc::new(RoutedHttp))
        .file_system(Arc::new(MemoryFileSystem::new()))
        .secure_store(Arc::new(MemorySecureStore::new()))
        .settings_store(Arc::new(MemorySettingsStore::new()))
        .network_monitor(Arc::new(StaticNetworkMonitor::new(info)))
        .transport(Arc::new(PassiveTransport))
        .build()
        .unwrap();
    SubtuneService::new(config).await.unwrap()
}

async fn configured_service() -> SubtuneService {
    let service = service(online()).await;
    service
        .configure_server(ServerCredentials::new(
            "https://music.example.com",
            "alice",
            "sesame",
        ))
        .await
        .unwrap();
    service
}

#[tokio::test]
async fn available_songs_flip_between_live_and_cached() {
    let service = configured_service().await;
    service.set_max_cache_size_gb(1.0).await.unwrap();

    // Online: the live fetch.
    let online_songs = service.available_songs().await.unwrap();
    assert_eq!(online_songs.len(), 2);

    // Play the first song so its audio gets cached in the background.
    service
        .play(online_songs.clone(), QueueSource::Library, 0)
        .await
        .unwrap();
    assert_eq!(service.playback_status().await, PlaybackStatus::Playing);

    service.set_offline_mode(true).await.unwrap();

    // Offline: only songs with confirmed local audio remain browsable.
    let mut offline_songs = Vec::new();
    for _ in 0..500 {
        offline_songs = service.available_songs().await.unwrap();
        if !offline_songs.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(offline_songs.len(), 1);
    assert_eq!(offline_songs[0].id, SongId::from("s1"));
    assert!(offline_songs[0].has_local_audio);
}

#[tokio::test]
async fn lost_connectivity_means_offline_regardless_of_preference() {
    let service = service(NetworkInfo::disconnected()).await;

    assert!(service.is_offline().await.unwrap());
    // Clearing the preference cannot override a dead network.
    service.set_offline_mode(false).await.unwrap();
    assert!(service.is_offline().await.unwrap());
}

#[tokio::test]
async fn unconfigured_browsing_fails_descriptively_online() {
    let service = service(online()).await;
    assert!(!service.is_configured().await);

    let err = service.available_songs().await.unwrap_err();
    assert!(err.to_string().contains("No server is configured"));
}

#[tokio::test]
async fn offline_search_uses_the_catalog_cache() {
    let service = configured_service().await;

    // Online browsing caches metadata as a side effect.
    let songs: Vec<Song> = service.available_songs().await.unwrap();
    assert_eq!(songs.len(), 2);

    service.set_offline_mode(true).await.unwrap();

    // Nothing has local audio, so the offline library is empty, but the
    // metadata cache still answers searches.
    assert!(service.available_songs().await.unwrap().is_empty());
    let found = service.search("Alpha").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, SongId::from("s1"));
}
