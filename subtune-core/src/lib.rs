//! # Subtune Core
//!
//! Facade crate for host applications: assemble a [`SubtuneService`] from a
//! [`CoreConfig`](subtune_runtime::CoreConfig) and drive browsing, playback
//! and the offline cache through one handle. Re-exports the types a host
//! needs so most embedders depend on this crate alone.

pub mod endpoint;
pub mod error;
pub mod service;

pub use endpoint::RemoteCatalog;
pub use error::{CoreError, Result};
pub use service::SubtuneService;

pub use subtune_api::ServerCredentials;
pub use subtune_catalog::{Song, SongId};
pub use subtune_playback::{CacheStats, PlayableUri, PlaybackStatus, QueueSource, RepeatMode};
pub use subtune_runtime::events::{CacheEvent, CoreEvent, NetworkEvent, PlaybackEvent};
pub use subtune_runtime::{CoreConfig, LoggingConfig};
