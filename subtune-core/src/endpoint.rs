//! Adapter from the API client to the playback crate's media seam.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use subtune_api::SubsonicClient;
use subtune_catalog::SongId;
use subtune_playback::{MediaEndpoint, PlaybackError};

/// [`MediaEndpoint`] backed by the Subsonic client. Keeps the playback
/// crate free of any protocol knowledge.
pub struct RemoteCatalog {
    client: Arc<SubsonicClient>,
}

impl RemoteCatalog {
    pub fn new(client: Arc<SubsonicClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaEndpoint for RemoteCatalog {
    async fn stream_url(&self, song_id: &SongId) -> subtune_playback::Result<String> {
        self.client
            .stream_url(song_id.as_str())
            .await
            .map_err(|e| PlaybackError::SourceUnavailable(e.to_string()))
    }

    async fn cover_art_url(&self, cover_art_id: &str) -> subtune_playback::Result<String> {
        self.client
            .cover_art_url(cover_art_id)
            .await
            .map_err(|e| PlaybackError::SourceUnavailable(e.to_string()))
    }

    async fn download(&self, url: &str) -> subtune_playback::Result<Bytes> {
        self.client
            .download(url)
            .await
            .map_err(|e| PlaybackError::SourceUnavailable(e.to_string()))
    }
}
