//! Typed user preferences
//!
//! Thin wrapper over the settings store for the two durable playback
//! preferences: the offline-mode flag and the cache quota. The
//! gigabyte→byte conversion lives here so every cache component sees the
//! same quota.

use std::sync::Arc;

use subtune_bridge::SettingsStore;

use crate::error::Result;

const KEY_OFFLINE_MODE: &str = "playback.offline_mode";
const KEY_MAX_CACHE_GB: &str = "cache.max_size_gb";

/// Default cache quota when the user has not configured one.
pub const DEFAULT_MAX_CACHE_GB: f64 = 1.0;

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Durable user preferences.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn SettingsStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// The persisted offline-mode flag; defaults to `false`.
    pub async fn offline_mode(&self) -> Result<bool> {
        Ok(self.store.get_bool(KEY_OFFLINE_MODE).await?.unwrap_or(false))
    }

    /// Persist the offline-mode flag.
    pub async fn set_offline_mode(&self, offline: bool) -> Result<()> {
        self.store.set_bool(KEY_OFFLINE_MODE, offline).await?;
        Ok(())
    }

    /// Configured cache quota in gigabytes; defaults to
    /// [`DEFAULT_MAX_CACHE_GB`]. `0` disables caching.
    pub async fn max_cache_size_gb(&self) -> Result<f64> {
        Ok(self
            .store
            .get_f64(KEY_MAX_CACHE_GB)
            .await?
            .unwrap_or(DEFAULT_MAX_CACHE_GB))
    }

    /// Persist the cache quota in gigabytes.
    pub async fn set_max_cache_size_gb(&self, gigabytes: f64) -> Result<()> {
        self.store.set_f64(KEY_MAX_CACHE_GB, gigabytes.max(0.0)).await?;
        Ok(())
    }

    /// Cache quota in bytes.
    pub async fn max_cache_bytes(&self) -> Result<u64> {
        let gigabytes = self.max_cache_size_gb().await?.max(0.0);
        Ok((gigabytes * BYTES_PER_GB) as u64)
    }
}
