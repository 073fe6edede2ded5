//! In-memory bridge implementations.
//!
//! Hermetic stand-ins for the desktop bridges, used by tests and headless
//! tooling. `MemoryFileSystem` assigns monotonically increasing modification
//! timestamps so age-ordered cache eviction is deterministic.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::error::{BridgeError, Result};
use crate::network::{NetworkChangeStream, NetworkInfo, NetworkMonitor};
use crate::storage::{FileMetadata, FileSystemAccess, SecureStore, SettingsStore};

#[derive(Debug, Clone)]
struct MemFile {
    data: Bytes,
    modified_at: i64,
}

/// In-memory file system
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, MemFile>>,
    directories: Mutex<HashSet<PathBuf>>,
    clock: AtomicI64,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn not_found(path: &Path) -> BridgeError {
        BridgeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no such file: {}", path.display()),
        ))
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.files.lock().expect("filesystem lock").len()
    }

    /// Override a file's modification timestamp (test control).
    pub fn set_modified(&self, path: &Path, modified_at: i64) {
        if let Some(file) = self.files.lock().expect("filesystem lock").get_mut(path) {
            file.modified_at = modified_at;
        }
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn cache_directory(&self) -> Result<PathBuf> {
        let path = PathBuf::from("/cache");
        self.directories
            .lock()
            .expect("filesystem lock")
            .insert(path.clone());
        Ok(path)
    }

    async fn data_directory(&self) -> Result<PathBuf> {
        let path = PathBuf::from("/data");
        self.directories
            .lock()
            .expect("filesystem lock")
            .insert(path.clone());
        Ok(path)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let files = self.files.lock().expect("filesystem lock");
        if files.contains_key(path) {
            return Ok(true);
        }
        Ok(self
            .directories
            .lock()
            .expect("filesystem lock")
            .contains(path))
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        if let Some(file) = self.files.lock().expect("filesystem lock").get(path) {
            return Ok(FileMetadata {
                size: file.data.len() as u64,
                modified_at: Some(file.modified_at),
                is_directory: false,
            });
        }
        if self
            .directories
            .lock()
            .expect("filesystem lock")
            .contains(path)
        {
            return Ok(FileMetadata {
                size: 0,
                modified_at: None,
                is_directory: true,
            });
        }
        Err(Self::not_found(path))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut directories = self.directories.lock().expect("filesystem lock");
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            directories.insert(current.clone());
        }
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        self.files
            .lock()
            .expect("filesystem lock")
            .get(path)
            .map(|file| file.data.clone())
            .ok_or_else(|| Self::not_found(path))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }
        let modified_at = self.tick();
        self.files
            .lock()
            .expect("filesystem lock")
            .insert(path.to_path_buf(), MemFile { data, modified_at });
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        self.files
            .lock()
            .expect("filesystem lock")
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(path))
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().expect("filesystem lock");
        let directories = self.directories.lock().expect("filesystem lock");
        if !directories.contains(path) {
            return Err(Self::not_found(path));
        }
        Ok(files
            .keys()
            .filter(|candidate| candidate.parent() == Some(path))
            .cloned()
            .collect())
    }
}

/// In-memory settings store
#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, key: &str, value: String) {
        self.values
            .lock()
            .expect("settings lock")
            .insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().expect("settings lock").get(key).cloned()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, value.to_string());
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get(key).and_then(|v| v.parse().ok()))
    }

    async fn set_f64(&self, key: &str, value: f64) -> Result<()> {
        self.set(key, value.to_string());
        Ok(())
    }

    async fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        Ok(self.get(key).and_then(|v| v.parse().ok()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().expect("settings lock").remove(key);
        Ok(())
    }
}

/// In-memory secure store
#[derive(Default)]
pub struct MemorySecureStore {
    secrets: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        self.secrets
            .lock()
            .expect("secrets lock")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.secrets.lock().expect("secrets lock").get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.secrets.lock().expect("secrets lock").remove(key);
        Ok(())
    }
}

/// Scriptable network monitor
///
/// Holds a settable snapshot and pushes every change to all subscribers,
/// letting tests simulate connectivity flips.
pub struct StaticNetworkMonitor {
    info: Mutex<NetworkInfo>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<NetworkInfo>>>,
}

impl StaticNetworkMonitor {
    pub fn new(info: NetworkInfo) -> Self {
        Self {
            info: Mutex::new(info),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Replace the snapshot and notify subscribers.
    pub fn set_info(&self, info: NetworkInfo) {
        *self.info.lock().expect("network lock") = info;
        self.subscribers
            .lock()
            .expect("network lock")
            .retain(|sender| sender.send(info).is_ok());
    }
}

#[async_trait]
impl NetworkMonitor for StaticNetworkMonitor {
    async fn network_info(&self) -> Result<NetworkInfo> {
        Ok(*self.info.lock().expect("network lock"))
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().expect("network lock").push(sender);
        Ok(Box::new(PushChangeStream { receiver }))
    }
}

struct PushChangeStream {
    receiver: mpsc::UnboundedReceiver<NetworkInfo>,
}

#[async_trait]
impl NetworkChangeStream for PushChangeStream {
    async fn next(&mut self) -> Option<NetworkInfo> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Reachability;

    #[tokio::test]
    async fn filesystem_write_read_delete() {
        let fs = MemoryFileSystem::new();
        let root = fs.cache_directory().await.unwrap();
        let path = root.join("song.mp3");

        fs.write_file(&path, Bytes::from_static(b"abc")).await.unwrap();
        assert!(fs.exists(&path).await.unwrap());
        assert_eq!(fs.read_file(&path).await.unwrap(), Bytes::from_static(b"abc"));

        fs.delete_file(&path).await.unwrap();
        assert!(!fs.exists(&path).await.unwrap());
        assert!(fs.delete_file(&path).await.is_err());
    }

    #[tokio::test]
    async fn filesystem_timestamps_are_monotonic() {
        let fs = MemoryFileSystem::new();
        let root = fs.cache_directory().await.unwrap();
        fs.write_file(&root.join("a"), Bytes::new()).await.unwrap();
        fs.write_file(&root.join("b"), Bytes::new()).await.unwrap();

        let a = fs.metadata(&root.join("a")).await.unwrap();
        let b = fs.metadata(&root.join("b")).await.unwrap();
        assert!(a.modified_at < b.modified_at);
    }

    #[tokio::test]
    async fn directory_listing_is_non_recursive() {
        let fs = MemoryFileSystem::new();
        let root = fs.cache_directory().await.unwrap();
        fs.write_file(&root.join("top.mp3"), Bytes::new()).await.unwrap();
        fs.write_file(&root.join("nested").join("low.mp3"), Bytes::new())
            .await
            .unwrap();

        let entries = fs.list_directory(&root).await.unwrap();
        assert_eq!(entries, vec![root.join("top.mp3")]);
    }

    #[tokio::test]
    async fn network_monitor_pushes_changes() {
        let monitor = StaticNetworkMonitor::new(NetworkInfo::disconnected());
        let mut stream = monitor.subscribe_changes().await.unwrap();

        let online = NetworkInfo {
            connected: true,
            reachable: Reachability::Yes,
            network_type: None,
        };
        monitor.set_info(online);

        assert_eq!(stream.next().await, Some(online));
        assert_eq!(monitor.network_info().await.unwrap(), online);
    }
}
