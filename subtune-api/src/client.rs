//! Subsonic REST client

use std::sync::Arc;

use bytes::Bytes;
use subtune_bridge::{HttpClient, HttpRequest};
use subtune_catalog::Song;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credentials::{CredentialStore, ServerCredentials};
use crate::error::{ApiError, Result};
use crate::request::api_url;
use crate::types::Envelope;

/// Client for a Subsonic-compatible server.
///
/// Holds the active credentials behind a lock so the server can be
/// reconfigured at runtime. Every call fails with
/// [`ApiError::NotConfigured`] until credentials are set or loaded.
pub struct SubsonicClient {
    http: Arc<dyn HttpClient>,
    credential_store: CredentialStore,
    credentials: RwLock<Option<ServerCredentials>>,
}

impl SubsonicClient {
    pub fn new(http: Arc<dyn HttpClient>, credential_store: CredentialStore) -> Self {
        Self {
            http,
            credential_store,
            credentials: RwLock::new(None),
        }
    }

    /// Load persisted credentials from the secure store, if any.
    /// Returns whether the client is now configured.
    pub async fn initialize(&self) -> Result<bool> {
        let loaded = self.credential_store.load().await?;
        let configured = loaded.is_some();
        *self.credentials.write().await = loaded;
        if configured {
            info!("Server credentials restored");
        }
        Ok(configured)
    }

    /// Validate credentials against the server with `ping`, then persist
    /// them and make them active. Invalid credentials are not stored.
    pub async fn configure(&self, credentials: ServerCredentials) -> Result<()> {
        let url = api_url(&credentials, "ping", &[]);
        self.call(&url).await?;

        self.credential_store.save(&credentials).await?;
        *self.credentials.write().await = Some(credentials);
        info!("Server configured");
        Ok(())
    }

    /// Drop the active credentials and remove them from the secure store.
    pub async fn reset(&self) -> Result<()> {
        self.credential_store.clear().await?;
        *self.credentials.write().await = None;
        Ok(())
    }

    pub async fn is_configured(&self) -> bool {
        self.credentials.read().await.is_some()
    }

    async fn current_credentials(&self) -> Result<ServerCredentials> {
        self.credentials
            .read()
            .await
            .clone()
            .ok_or(ApiError::NotConfigured)
    }

    async fn call(&self, url: &str) -> Result<crate::types::SubsonicResponse> {
        let response = self.http.execute(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(ApiError::Server(format!("HTTP {}", response.status)));
        }

        let envelope: Envelope = response
            .json()
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope.into_result()
    }

    async fn call_method(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<crate::types::SubsonicResponse> {
        let credentials = self.current_credentials().await?;
        let url = api_url(&credentials, method, params);
        debug!(method, "Subsonic request");
        self.call(&url).await
    }

    /// Liveness check against the configured server.
    pub async fn ping(&self) -> Result<()> {
        self.call_method("ping", &[]).await?;
        Ok(())
    }

    /// Fetch up to `size` random songs for library browsing.
    pub async fn get_random_songs(&self, size: u32) -> Result<Vec<Song>> {
        let response = self
            .call_method("getRandomSongs", &[("size", size.to_string())])
            .await?;

        Ok(response
            .random_songs
            .unwrap_or_default()
            .song
            .into_iter()
            .map(|s| s.into_song())
            .collect())
    }

    /// Full-text song search (`search3`).
    pub async fn search(&self, query: &str, count: u32) -> Result<Vec<Song>> {
        let response = self
            .call_method(
                "search3",
                &[
                    ("query", query.to_string()),
                    ("songCount", count.to_string()),
                    ("artistCount", "0".to_string()),
                    ("albumCount", "0".to_string()),
                ],
            )
            .await?;

        Ok(response
            .search_result3
            .unwrap_or_default()
            .song
            .into_iter()
            .map(|s| s.into_song())
            .collect())
    }

    /// Songs of a server-side playlist.
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Vec<Song>> {
        let response = self
            .call_method("getPlaylist", &[("id", playlist_id.to_string())])
            .await?;

        Ok(response
            .playlist
            .unwrap_or_default()
            .entry
            .into_iter()
            .map(|s| s.into_song())
            .collect())
    }

    /// Authenticated streaming URL for a song. The token inside is salted,
    /// so handing the URL to an audio transport leaks no password.
    pub async fn stream_url(&self, song_id: &str) -> Result<String> {
        let credentials = self.current_credentials().await?;
        Ok(api_url(
            &credentials,
            "stream",
            &[("id", song_id.to_string())],
        ))
    }

    /// Authenticated cover art URL.
    pub async fn cover_art_url(&self, cover_art_id: &str) -> Result<String> {
        let credentials = self.current_credentials().await?;
        Ok(api_url(
            &credentials,
            "getCoverArt",
            &[("id", cover_art_id.to_string())],
        ))
    }

    /// Download a media URL into memory. Fails on non-2xx statuses.
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        Ok(self.http.download(url).await?)
    }
}
