//! Subsonic wire types
//!
//! Every response is wrapped in a `subsonic-response` envelope carrying a
//! `status` of `"ok"` or `"failed"`. Failed responses include an `error`
//! object whose `message` is surfaced to the caller verbatim.

use serde::Deserialize;
use subtune_catalog::{Song, SongId};

use crate::error::{ApiError, Result};

/// Top-level response wrapper.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "subsonic-response")]
    pub response: SubsonicResponse,
}

impl Envelope {
    /// Unwrap the envelope, turning `status: "failed"` into an error that
    /// carries the server's own message.
    pub fn into_result(self) -> Result<SubsonicResponse> {
        if self.response.status == "ok" {
            return Ok(self.response);
        }

        let message = self
            .response
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| "server returned an error".to_string());
        Err(ApiError::Server(message))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicResponse {
    pub status: String,
    pub error: Option<ServerFault>,
    pub random_songs: Option<SongList>,
    pub search_result3: Option<SearchResult3>,
    pub playlist: Option<PlaylistBody>,
}

#[derive(Debug, Deserialize)]
pub struct ServerFault {
    #[serde(default)]
    pub code: i32,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SongList {
    #[serde(default)]
    pub song: Vec<SubsonicSong>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResult3 {
    #[serde(default)]
    pub song: Vec<SubsonicSong>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistBody {
    #[serde(default)]
    pub entry: Vec<SubsonicSong>,
}

/// A song as the server describes it. Most fields are optional on the wire;
/// conversion fills in placeholder text the way a UI expects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicSong {
    pub id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    /// Duration in seconds.
    pub duration: Option<i64>,
    pub cover_art: Option<String>,
}

impl SubsonicSong {
    pub fn into_song(self) -> Song {
        Song {
            id: SongId(self.id),
            title: self.title.unwrap_or_else(|| "Unknown Title".to_string()),
            artist: self.artist.unwrap_or_else(|| "Unknown Artist".to_string()),
            album: self.album.unwrap_or_else(|| "Unknown Album".to_string()),
            genre: self.genre,
            duration_secs: self.duration.unwrap_or(0).max(0),
            cover_art_id: self.cover_art,
            has_local_audio: false,
        }
    }
}
