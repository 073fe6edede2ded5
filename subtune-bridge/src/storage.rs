//! Storage and File System Abstractions
//!
//! Platform-agnostic traits for file I/O, secure credential storage, and
//! key-value settings storage.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// All cache-directory mutation in the core goes through this trait; no
/// component touches the disk directly.
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get the application's cache directory, creating it if needed.
    async fn cache_directory(&self) -> Result<PathBuf>;

    /// Get the application's data directory, creating it if needed.
    async fn data_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory.
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory.
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it if it doesn't exist.
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file.
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory.
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Secure credential storage trait
///
/// Implementations must encrypt at rest using platform secure storage and
/// never log or expose stored values.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value, `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a missing key is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;
}

/// Key-value settings storage trait
///
/// Durable user preferences (offline mode, cache size), persisted across
/// restarts.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store a floating-point value
    async fn set_f64(&self, key: &str, value: f64) -> Result<()>;

    /// Retrieve a floating-point value
    async fn get_f64(&self, key: &str) -> Result<Option<f64>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;
}
