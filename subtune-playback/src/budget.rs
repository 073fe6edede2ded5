//! # Cache Budget Manager
//!
//! Enforces the user-configured cache size: admission checks before a fill
//! and oldest-first eviction when space runs out. Usage is computed from
//! the content store on demand, so the budget always reflects the disk.
//!
//! Concurrency: `reclaim` is guarded by an atomic flag checked before any
//! await. A caller that loses the race gets `0` back immediately and treats
//! it as "no space freed right now"; the winning pass is already making
//! room. The flag and the deleted-path set are per-manager state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use subtune_catalog::{CatalogRepository, SongId};
use subtune_runtime::events::{CacheEvent, CoreEvent};
use subtune_runtime::{EventBus, Preferences};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::{CacheEntry, ContentKind, ContentStore};

/// Per-kind cache usage summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub audio_entries: usize,
    pub image_entries: usize,
    pub audio_bytes: u64,
    pub image_bytes: u64,
}

impl CacheStats {
    pub fn total_bytes(&self) -> u64 {
        self.audio_bytes + self.image_bytes
    }

    pub fn total_entries(&self) -> usize {
        self.audio_entries + self.image_entries
    }
}

/// Resets the reclaim flag when an eviction pass ends, early returns and
/// error paths included.
struct ReclaimGuard<'a>(&'a AtomicBool);

impl Drop for ReclaimGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CacheBudgetManager {
    store: Arc<ContentStore>,
    preferences: Preferences,
    catalog: Arc<dyn CatalogRepository>,
    events: EventBus,
    reclaiming: AtomicBool,
    /// Paths this manager already deleted, with the evicted file's
    /// modification stamp. Overlapping directory listings can still name
    /// such a path; counting it again would overstate the freed total. A
    /// listing entry *newer* than the recorded stamp is a refill of the
    /// same path and evicts normally.
    recently_deleted: Mutex<HashMap<PathBuf, i64>>,
}

impl CacheBudgetManager {
    pub fn new(
        store: Arc<ContentStore>,
        preferences: Preferences,
        catalog: Arc<dyn CatalogRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            preferences,
            catalog,
            events,
            reclaiming: AtomicBool::new(false),
            recently_deleted: Mutex::new(HashMap::new()),
        }
    }

    /// Configured budget in bytes. Zero disables caching entirely.
    pub async fn max_bytes(&self) -> Result<u64> {
        Ok(self.preferences.max_cache_bytes().await?)
    }

    /// Bytes currently used, straight from the content store.
    pub async fn usage(&self) -> u64 {
        self.store.usage().await
    }

    /// Whether `extra` more bytes fit within the budget right now.
    pub async fn has_space(&self, extra: u64) -> Result<bool> {
        let max = self.max_bytes().await?;
        if max == 0 {
            return Ok(false);
        }
        Ok(self.usage().await + extra <= max)
    }

    /// Evict oldest entries until at least `min_bytes` are freed, also
    /// correcting any existing overshoot past the budget. Returns the bytes
    /// actually freed; `0` when another pass is already running or the
    /// cache is empty.
    pub async fn reclaim(&self, min_bytes: u64) -> u64 {
        if self
            .reclaiming
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!("Reclaim already in progress, yielding");
            return 0;
        }
        let _guard = ReclaimGuard(&self.reclaiming);

        let max = match self.max_bytes().await {
            Ok(max) => max,
            Err(e) => {
                warn!(error = %e, "Cannot read cache budget, skipping reclaim");
                return 0;
            }
        };
        let usage = self.usage().await;

        // Freeing only min_bytes from an already-over-budget cache would
        // leave it over budget; aim for whichever is larger.
        let target = min_bytes.max((usage + min_bytes).saturating_sub(max));
        if target == 0 {
            return 0;
        }

        let mut entries = self.store.list_all().await;
        entries.sort_by_key(|e| e.last_modified);

        let mut freed = 0u64;
        for entry in entries {
            if freed >= target {
                break;
            }
            if self.already_deleted(&entry) {
                continue;
            }
            match self.evict(&entry).await {
                Ok(()) => freed += entry.size_bytes,
                Err(e) => {
                    warn!(
                        content_id = %entry.content_id,
                        error = %e,
                        "Failed to evict cache entry"
                    );
                }
            }
        }

        info!(freed, target, "Cache reclaim finished");
        freed
    }

    /// Whether `entry` is a stale listing of a path this manager already
    /// deleted. A newer modification stamp means the path was refilled
    /// since the eviction; the stale record is dropped and the entry is
    /// evictable like any other.
    fn already_deleted(&self, entry: &CacheEntry) -> bool {
        let Ok(mut deleted) = self.recently_deleted.lock() else {
            return false;
        };
        match deleted.get(&entry.path) {
            Some(&stamp) if entry.last_modified <= stamp => true,
            Some(_) => {
                deleted.remove(&entry.path);
                false
            }
            None => false,
        }
    }

    fn mark_deleted(&self, path: PathBuf, last_modified: i64) {
        if let Ok(mut deleted) = self.recently_deleted.lock() {
            deleted.insert(path, last_modified);
        }
    }

    async fn evict(&self, entry: &CacheEntry) -> Result<()> {
        self.store.delete(&entry.path).await?;
        self.mark_deleted(entry.path.clone(), entry.last_modified);

        // The catalog record stays browsable; only the audio flag drops.
        if entry.kind == ContentKind::Audio {
            let id = SongId::from(entry.content_id.as_str());
            if let Err(e) = self.catalog.set_has_local_audio(&id, false).await {
                warn!(song_id = %id, error = %e, "Failed to clear local audio flag");
            }
        }

        self.events
            .emit(CoreEvent::Cache(CacheEvent::Evicted {
                content_id: entry.content_id.clone(),
                size_bytes: entry.size_bytes,
            }))
            .ok();
        Ok(())
    }

    /// Delete every cached file and clear all local-audio flags. A full
    /// wipe ignores eviction history; a file that vanished since the
    /// listing just fails its delete and is not counted.
    pub async fn clear_cache(&self) -> Result<usize> {
        let entries = self.store.list_all().await;
        let mut removed = 0usize;
        for entry in &entries {
            match self.evict(entry).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(content_id = %entry.content_id, error = %e, "Failed to clear entry")
                }
            }
        }

        if let Ok(mut deleted) = self.recently_deleted.lock() {
            deleted.clear();
        }

        self.events
            .emit(CoreEvent::Cache(CacheEvent::Cleared { entries: removed }))
            .ok();
        info!(removed, "Cache cleared");
        Ok(removed)
    }

    /// Usage summary for display.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for entry in self.store.list_all().await {
            match entry.kind {
                ContentKind::Audio => {
                    stats.audio_entries += 1;
                    stats.audio_bytes += entry.size_bytes;
                }
                ContentKind::Image => {
                    stats.image_entries += 1;
                    stats.image_bytes += entry.size_bytes;
                }
            }
        }
        stats
    }
}
