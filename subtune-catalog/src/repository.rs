//! Catalog repository trait and SQLite implementation

use crate::error::{CatalogError, Result};
use crate::models::{Song, SongId};
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};
use tracing::debug;

const SONG_COLUMNS: &str =
    "id, title, artist, album, genre, duration_secs, cover_art_id, has_local_audio";

/// Data access interface for the offline catalog cache
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert a song or refresh its descriptive metadata.
    ///
    /// The `has_local_audio` flag is only ever raised here, never lowered:
    /// re-upserting metadata for a song whose audio is already cached must
    /// not mark it uncached.
    async fn upsert_song(&self, song: &Song) -> Result<()>;

    /// Find a song by id.
    async fn find_by_id(&self, id: &SongId) -> Result<Option<Song>>;

    /// Record whether a locally cached audio file exists for the song.
    /// Unknown ids are ignored.
    async fn set_has_local_audio(&self, id: &SongId, cached: bool) -> Result<()>;

    /// Songs with a confirmed local audio file, ordered by artist then title.
    /// This is the browsing source while offline.
    async fn songs_with_local_audio(&self) -> Result<Vec<Song>>;

    /// Case-insensitive substring search over title, artist and album.
    async fn search(&self, query: &str) -> Result<Vec<Song>>;

    /// Distinct artist names, sorted.
    async fn list_artists(&self) -> Result<Vec<String>>;

    /// Distinct album names, sorted.
    async fn list_albums(&self) -> Result<Vec<String>>;

    /// Distinct genres, sorted; songs without a genre are skipped.
    async fn list_genres(&self) -> Result<Vec<String>>;

    /// Total number of cached records.
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of [`CatalogRepository`]
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn upsert_song(&self, song: &Song) -> Result<()> {
        song.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "song".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO songs (
                id, title, artist, album, genre, duration_secs,
                cover_art_id, has_local_audio, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist = excluded.artist,
                album = excluded.album,
                genre = excluded.genre,
                duration_secs = excluded.duration_secs,
                cover_art_id = excluded.cover_art_id,
                has_local_audio = songs.has_local_audio OR excluded.has_local_audio,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&song.id)
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.album)
        .bind(&song.genre)
        .bind(song.duration_secs)
        .bind(&song.cover_art_id)
        .bind(song.has_local_audio)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        debug!(song_id = %song.id, "Upserted catalog record");
        Ok(())
    }

    async fn find_by_id(&self, id: &SongId) -> Result<Option<Song>> {
        let song = query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(song)
    }

    async fn set_has_local_audio(&self, id: &SongId, cached: bool) -> Result<()> {
        sqlx::query("UPDATE songs SET has_local_audio = ?, updated_at = ? WHERE id = ?")
            .bind(cached)
            .bind(chrono::Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(song_id = %id, cached, "Updated local audio flag");
        Ok(())
    }

    async fn songs_with_local_audio(&self) -> Result<Vec<Song>> {
        let songs = query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs WHERE has_local_audio = 1 \
             ORDER BY artist COLLATE NOCASE, title COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn search(&self, query: &str) -> Result<Vec<Song>> {
        // Escape LIKE wildcards so user input matches literally.
        let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("%{}%", escaped);

        let songs = query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs \
             WHERE title LIKE ? ESCAPE '\\' \
                OR artist LIKE ? ESCAPE '\\' \
                OR album LIKE ? ESCAPE '\\' \
             ORDER BY artist COLLATE NOCASE, title COLLATE NOCASE"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn list_artists(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = query_as(
            "SELECT DISTINCT artist FROM songs ORDER BY artist COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(a,)| a).collect())
    }

    async fn list_albums(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            query_as("SELECT DISTINCT album FROM songs ORDER BY album COLLATE NOCASE")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(a,)| a).collect())
    }

    async fn list_genres(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = query_as(
            "SELECT DISTINCT genre FROM songs WHERE genre IS NOT NULL \
             ORDER BY genre COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(g,)| g).collect())
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = query_as("SELECT COUNT(*) FROM songs")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn song(id: &str, title: &str, artist: &str) -> Song {
        Song {
            id: SongId::from(id),
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Test Album".to_string(),
            genre: Some("Rock".to_string()),
            duration_secs: 200,
            cover_art_id: None,
            has_local_audio: false,
        }
    }

    async fn repo() -> SqliteCatalogRepository {
        SqliteCatalogRepository::new(create_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn upsert_and_find_round_trip() {
        let repo = repo().await;
        let s = song("s1", "Alpha", "The Band");
        repo.upsert_song(&s).await.unwrap();

        let found = repo.find_by_id(&SongId::from("s1")).await.unwrap().unwrap();
        assert_eq!(found, s);
        assert!(repo.find_by_id(&SongId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_refreshes_metadata_without_lowering_audio_flag() {
        let repo = repo().await;
        repo.upsert_song(&song("s1", "Alpha", "The Band")).await.unwrap();
        repo.set_has_local_audio(&SongId::from("s1"), true).await.unwrap();

        // Metadata refresh from a live fetch carries has_local_audio = false.
        let mut refreshed = song("s1", "Alpha (Remastered)", "The Band");
        refreshed.has_local_audio = false;
        repo.upsert_song(&refreshed).await.unwrap();

        let found = repo.find_by_id(&SongId::from("s1")).await.unwrap().unwrap();
        assert_eq!(found.title, "Alpha (Remastered)");
        assert!(found.has_local_audio, "flag must survive metadata refresh");
    }

    #[tokio::test]
    async fn local_audio_flag_controls_offline_listing() {
        let repo = repo().await;
        repo.upsert_song(&song("s1", "Alpha", "Bravo")).await.unwrap();
        repo.upsert_song(&song("s2", "Beta", "Alpha Artist")).await.unwrap();

        assert!(repo.songs_with_local_audio().await.unwrap().is_empty());

        repo.set_has_local_audio(&SongId::from("s2"), true).await.unwrap();
        let local = repo.songs_with_local_audio().await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].id, SongId::from("s2"));

        // Eviction lowers the flag but keeps the record browsable.
        repo.set_has_local_audio(&SongId::from("s2"), false).await.unwrap();
        assert!(repo.songs_with_local_audio().await.unwrap().is_empty());
        assert!(repo.find_by_id(&SongId::from("s2")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn search_matches_title_artist_and_album() {
        let repo = repo().await;
        repo.upsert_song(&song("s1", "Harvest Moon", "Neil Young")).await.unwrap();
        repo.upsert_song(&song("s2", "Heart of Gold", "Neil Young")).await.unwrap();
        repo.upsert_song(&song("s3", "Yellow", "Coldplay")).await.unwrap();

        assert_eq!(repo.search("neil").await.unwrap().len(), 2);
        assert_eq!(repo.search("harvest").await.unwrap().len(), 1);
        assert_eq!(repo.search("test album").await.unwrap().len(), 3);
        assert!(repo.search("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let repo = repo().await;
        repo.upsert_song(&song("s1", "100% Pure", "Someone")).await.unwrap();
        repo.upsert_song(&song("s2", "Plain", "Someone")).await.unwrap();

        assert_eq!(repo.search("100%").await.unwrap().len(), 1);
        assert!(repo.search("%q%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn distinct_listings_are_sorted() {
        let repo = repo().await;
        let mut a = song("s1", "One", "Zeta");
        a.album = "ZZ".to_string();
        let mut b = song("s2", "Two", "alpha");
        b.album = "AA".to_string();
        b.genre = None;
        repo.upsert_song(&a).await.unwrap();
        repo.upsert_song(&b).await.unwrap();

        assert_eq!(repo.list_artists().await.unwrap(), vec!["alpha", "Zeta"]);
        assert_eq!(repo.list_albums().await.unwrap(), vec!["AA", "ZZ"]);
        assert_eq!(repo.list_genres().await.unwrap(), vec!["Rock"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn invalid_song_is_rejected() {
        let repo = repo().await;
        let mut s = song("", "Alpha", "Bravo");
        s.id = SongId::from("");
        let err = repo.upsert_song(&s).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput { .. }));
    }
}
