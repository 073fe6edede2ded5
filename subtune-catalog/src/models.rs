//! Catalog data models
//!
//! [`Song`] is a denormalized browsing record: everything the UI needs to
//! show a track without joining other tables. Identity is the server-assigned
//! [`SongId`]; two songs are the same entity iff their ids are equal.

use serde::{Deserialize, Serialize};

/// Opaque, stable song identifier assigned by the remote server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct SongId(pub String);

impl SongId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SongId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SongId {
    fn from(value: &str) -> Self {
        SongId(value.to_string())
    }
}

impl From<String> for SongId {
    fn from(value: String) -> Self {
        SongId(value)
    }
}

/// Denormalized song metadata, cached locally for offline browsing.
///
/// The record's lifecycle is independent from the cached audio bytes:
/// evicting an audio file clears `has_local_audio` but keeps the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: Option<String>,
    /// Track duration in seconds, 0 when the server did not report one.
    pub duration_secs: i64,
    /// Server-side identifier for the cover art image, if any.
    pub cover_art_id: Option<String>,
    /// True while a locally cached audio file exists for this song.
    pub has_local_audio: bool,
}

impl Song {
    /// Validate required fields before persisting.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.as_str().is_empty() {
            return Err("song id must not be empty".to_string());
        }
        if self.title.is_empty() {
            return Err("song title must not be empty".to_string());
        }
        if self.duration_secs < 0 {
            return Err("duration must not be negative".to_string());
        }
        Ok(())
    }
}
