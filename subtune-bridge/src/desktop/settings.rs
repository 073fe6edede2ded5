//! Settings Storage using SQLite

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::storage::SettingsStore;

/// SQLite-backed settings store implementation
///
/// Durable key-value storage for user preferences. Values are stored as text
/// with a type tag so a read with the wrong accessor returns `None` instead
/// of garbage.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs want forward slashes even on Windows
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| BridgeError::Database(format!("Failed to connect to DB: {}", e)))?;

        Self::bootstrap(&pool).await?;
        debug!(path = ?db_path, "Initialized settings store");

        Ok(Self { pool })
    }

    /// Create an in-memory settings store (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::Database(format!("Failed to connect to DB: {}", e)))?;
        Self::bootstrap(&pool).await?;
        Ok(Self { pool })
    }

    async fn bootstrap(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                value_type TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| BridgeError::Database(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    async fn set_value(&self, key: &str, value: &str, value_type: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, value_type, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                value_type = excluded.value_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(value_type)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Database(format!("Failed to set setting: {}", e)))?;

        debug!(key = key, value_type = value_type, "Stored setting");
        Ok(())
    }

    async fn get_value(&self, key: &str, expected_type: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value, value_type FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::Database(format!("Failed to get setting: {}", e)))?;

        Ok(row.and_then(|row| {
            let value_type: String = row.get("value_type");
            if value_type == expected_type {
                Some(row.get("value"))
            } else {
                None
            }
        }))
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value, "string").await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key, "string").await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, if value { "1" } else { "0" }, "bool").await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get_value(key, "bool").await?.map(|v| v == "1"))
    }

    async fn set_f64(&self, key: &str, value: f64) -> Result<()> {
        self.set_value(key, &value.to_string(), "f64").await
    }

    async fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        Ok(self
            .get_value(key, "f64")
            .await?
            .and_then(|v| v.parse().ok()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Database(format!("Failed to delete setting: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn string_round_trip() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_string("server.url", "http://music.local").await.unwrap();
        assert_eq!(
            store.get_string("server.url").await.unwrap().as_deref(),
            Some("http://music.local")
        );
    }

    #[tokio::test]
    async fn bool_and_f64_round_trip() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_bool("playback.offline_mode", true).await.unwrap();
        store.set_f64("cache.max_size_gb", 2.5).await.unwrap();

        assert_eq!(store.get_bool("playback.offline_mode").await.unwrap(), Some(true));
        assert_eq!(store.get_f64("cache.max_size_gb").await.unwrap(), Some(2.5));
    }

    #[tokio::test]
    async fn type_mismatch_reads_none() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_string("key", "not a bool").await.unwrap();
        assert_eq!(store.get_bool("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_value() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_bool("flag", true).await.unwrap();
        store.delete("flag").await.unwrap();
        assert_eq!(store.get_bool("flag").await.unwrap(), None);
    }
}
