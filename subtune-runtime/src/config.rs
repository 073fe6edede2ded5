//! # Core Configuration
//!
//! Builder for the dependency bundle the core needs at startup. Required
//! capabilities (secure store, settings store, audio transport) fail fast
//! with actionable messages; HTTP, filesystem and network monitoring fall
//! back to the desktop bridges when not injected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use subtune_bridge::desktop::{ProbingNetworkMonitor, ReqwestHttpClient, TokioFileSystem};
use subtune_bridge::{
    AudioTransport, FileSystemAccess, HttpClient, NetworkMonitor, SecureStore, SettingsStore,
};

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Validated dependency bundle for the core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the catalog metadata SQLite database.
    pub database_path: PathBuf,

    /// HTTP client for API requests and media downloads.
    pub http_client: Arc<dyn HttpClient>,

    /// File system access for the content cache.
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Secure credential storage (required).
    pub secure_store: Arc<dyn SecureStore>,

    /// Durable user preferences (required).
    pub settings_store: Arc<dyn SettingsStore>,

    /// Connectivity monitor.
    pub network_monitor: Arc<dyn NetworkMonitor>,

    /// Host audio engine (required).
    pub transport: Arc<dyn AudioTransport>,

    /// Event bus channel capacity.
    pub event_buffer: usize,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    transport: Option<Arc<dyn AudioTransport>>,
    event_buffer: Option<usize>,
}

impl CoreConfigBuilder {
    pub fn database_path(mut self, path: impl AsRef<Path>) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn AudioTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = Some(capacity);
        self
    }

    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self
            .database_path
            .ok_or_else(|| Error::Config("database_path is required".to_string()))?;

        let secure_store = self.secure_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "SecureStore".to_string(),
            message: "No secure store provided. Desktop: use KeyringSecureStore \
                      (enable the secure-store feature)."
                .to_string(),
        })?;

        let settings_store = self.settings_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "SettingsStore".to_string(),
            message: "No settings store provided. Desktop: use SqliteSettingsStore."
                .to_string(),
        })?;

        let transport = self.transport.ok_or_else(|| Error::CapabilityMissing {
            capability: "AudioTransport".to_string(),
            message: "No audio transport provided. Inject the host audio engine adapter."
                .to_string(),
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => Arc::new(
                ReqwestHttpClient::new()
                    .map_err(|e| Error::Config(format!("Default HTTP client: {}", e)))?,
            ),
        };

        Ok(CoreConfig {
            database_path,
            http_client,
            file_system: self
                .file_system
                .unwrap_or_else(|| Arc::new(TokioFileSystem::new())),
            secure_store,
            settings_store,
            network_monitor: self
                .network_monitor
                .unwrap_or_else(|| Arc::new(ProbingNetworkMonitor::new())),
            transport,
            event_buffer: self.event_buffer.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        })
    }
}
