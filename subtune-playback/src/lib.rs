//! # Playback & Offline Cache
//!
//! The heart of the client: a size-bounded content cache with oldest-first
//! eviction, stream-first download orchestration, and a playback controller
//! whose track selection stays consistent across online/offline
//! transitions, shuffle and repeat.
//!
//! - [`store::ContentStore`] — flat `<id>.<ext>` file cache, filesystem as
//!   the index
//! - [`budget::CacheBudgetManager`] — admission checks and eviction against
//!   the user's size budget
//! - [`fetch::DownloadOrchestrator`] — cache-hit-or-stream resolution with
//!   background fills
//! - [`queue::QueueState`] — pure next/previous resolution with
//!   shuffle/repeat rules
//! - [`controller::PlaybackController`] — transport lifecycle and the
//!   playback state machine

pub mod budget;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod queue;
pub mod store;

pub use budget::{CacheBudgetManager, CacheStats};
pub use controller::{PlaybackController, PlaybackStatus};
pub use error::{PlaybackError, Result};
pub use fetch::{DownloadOrchestrator, MediaEndpoint, PlayableUri};
pub use queue::{PlayQueue, QueueSource, QueueState, RepeatMode};
pub use store::{CacheEntry, ContentKind, ContentStore};
