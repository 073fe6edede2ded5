//! # Platform Bridges
//!
//! Capability traits the Subtune core depends on, plus the desktop
//! implementations. Each trait covers one platform concern that must be
//! injectable for testing and portability:
//!
//! - [`HttpClient`](http::HttpClient) — async HTTP with TLS and timeouts
//! - [`FileSystemAccess`](storage::FileSystemAccess) — cache/data file I/O
//! - [`SecureStore`](storage::SecureStore) — credential persistence
//! - [`SettingsStore`](storage::SettingsStore) — durable user preferences
//! - [`NetworkMonitor`](network::NetworkMonitor) — connectivity and server
//!   reachability
//! - [`AudioTransport`](transport::AudioTransport) — opaque playback
//!   primitives (play/pause/seek/rate)
//!
//! The `desktop` module ships ready adapters (reqwest, tokio fs, SQLite
//! settings, keyring, TCP-probe monitoring); the `memory` module ships
//! hermetic in-memory implementations used throughout the test suites.
//!
//! All traits require `Send + Sync` and report failures through
//! [`BridgeError`](error::BridgeError). Implementations must never log
//! secret values.

pub mod desktop;
pub mod error;
pub mod http;
pub mod memory;
pub mod network;
pub mod storage;
pub mod transport;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkType, Reachability};
pub use storage::{FileMetadata, FileSystemAccess, SecureStore, SettingsStore};
pub use transport::{AudioSource, AudioTransport, TransportEvent, TransportHandle};
