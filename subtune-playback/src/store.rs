//! # Content Store
//!
//! Flat on-disk cache keyed by content id. The file name *is* the index:
//! `<id>.mp3` for audio, `<id>.jpg` for cover art, all under one root
//! directory. No sidecar database — presence, size and age are always read
//! back from the filesystem, so the store can never disagree with the disk.
//!
//! Read probes (`exists`, `size_of`, listing) degrade to "not cached" on
//! I/O errors; writes and deletes propagate theirs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use subtune_bridge::FileSystemAccess;
use tracing::{debug, warn};

use crate::error::Result;

/// What a cached file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Audio,
    Image,
}

impl ContentKind {
    pub fn extension(self) -> &'static str {
        match self {
            ContentKind::Audio => "mp3",
            ContentKind::Image => "jpg",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp3" => Some(ContentKind::Audio),
            "jpg" => Some(ContentKind::Image),
            _ => None,
        }
    }
}

/// One cached file, described from filesystem state.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content_id: String,
    pub kind: ContentKind,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Modification timestamp used for oldest-first eviction ordering.
    pub last_modified: i64,
}

/// Flat file cache under a single root directory.
pub struct ContentStore {
    fs: Arc<dyn FileSystemAccess>,
}

impl ContentStore {
    pub fn new(fs: Arc<dyn FileSystemAccess>) -> Self {
        Self { fs }
    }

    async fn root(&self) -> Result<PathBuf> {
        Ok(self.fs.cache_directory().await?.join("content"))
    }

    /// Deterministic path for a content id. Pure given the cache root; does
    /// not touch the disk.
    pub async fn path_for(&self, content_id: &str, kind: ContentKind) -> Result<PathBuf> {
        Ok(self
            .root()
            .await?
            .join(format!("{content_id}.{}", kind.extension())))
    }

    /// Whether a cached file exists. Probe errors read as "not cached".
    pub async fn exists(&self, content_id: &str, kind: ContentKind) -> bool {
        let Ok(path) = self.path_for(content_id, kind).await else {
            return false;
        };
        self.fs.exists(&path).await.unwrap_or(false)
    }

    /// Size of a cached file in bytes, 0 when missing or unreadable.
    pub async fn size_of(&self, content_id: &str, kind: ContentKind) -> u64 {
        let Ok(path) = self.path_for(content_id, kind).await else {
            return 0;
        };
        match self.fs.metadata(&path).await {
            Ok(metadata) => metadata.size,
            Err(_) => 0,
        }
    }

    /// Persist content bytes, creating the cache root on first use.
    pub async fn write(
        &self,
        content_id: &str,
        kind: ContentKind,
        data: Bytes,
    ) -> Result<CacheEntry> {
        let root = self.root().await?;
        self.fs.create_dir_all(&root).await?;

        let path = root.join(format!("{content_id}.{}", kind.extension()));
        let size_bytes = data.len() as u64;
        self.fs.write_file(&path, data).await?;

        let last_modified = match self.fs.metadata(&path).await {
            Ok(metadata) => metadata.modified_at.unwrap_or(0),
            Err(_) => 0,
        };

        debug!(content_id, size_bytes, "Cached content written");
        Ok(CacheEntry {
            content_id: content_id.to_string(),
            kind,
            path,
            size_bytes,
            last_modified,
        })
    }

    /// Remove a cached file. Propagates the failure; callers decide whether
    /// it is fatal.
    pub async fn delete(&self, path: &Path) -> Result<()> {
        self.fs.delete_file(path).await?;
        debug!(path = %path.display(), "Cached content deleted");
        Ok(())
    }

    /// Enumerate every cached file. A missing root is an empty cache; an
    /// entry whose metadata cannot be read is skipped with a warning.
    pub async fn list_all(&self) -> Vec<CacheEntry> {
        let Ok(root) = self.root().await else {
            return Vec::new();
        };
        let Ok(paths) = self.fs.list_directory(&root).await else {
            return Vec::new();
        };

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(kind) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ContentKind::from_extension)
            else {
                continue;
            };
            let Some(content_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.fs.metadata(&path).await {
                Ok(metadata) if !metadata.is_directory => entries.push(CacheEntry {
                    content_id: content_id.to_string(),
                    kind,
                    path: path.clone(),
                    size_bytes: metadata.size,
                    last_modified: metadata.modified_at.unwrap_or(0),
                }),
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable cache entry");
                }
            }
        }
        entries
    }

    /// Total bytes currently cached.
    pub async fn usage(&self) -> u64 {
        self.list_all().await.iter().map(|e| e.size_bytes).sum()
    }
}
