//! # Event Bus
//!
//! Decoupled communication between core modules over
//! `tokio::sync::broadcast`. Producers emit typed [`CoreEvent`]s; any number
//! of subscribers consume them independently. Slow subscribers receive
//! `RecvError::Lagged` instead of blocking fast ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback lifecycle events
    Playback(PlaybackEvent),
    /// Offline cache events
    Cache(CacheEvent),
    /// Connectivity and offline-mode events
    Network(NetworkEvent),
}

/// Events related to audio playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Playback started.
    Started { song_id: String, title: String },
    /// Playback paused.
    Paused { song_id: String },
    /// Playback resumed after pause.
    Resumed { song_id: String },
    /// Playback stopped.
    Stopped { song_id: String },
    /// Track finished playing naturally.
    Completed { song_id: String },
    /// Playback error occurred.
    Error {
        song_id: Option<String>,
        message: String,
        recoverable: bool,
    },
}

/// Events related to the offline content cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// A background cache fill began.
    FillStarted { content_id: String },
    /// A background cache fill persisted its bytes.
    FillCompleted { content_id: String, size_bytes: u64 },
    /// A background cache fill was abandoned (no budget, transfer failed).
    FillSkipped { content_id: String, reason: String },
    /// An entry was evicted to reclaim space.
    Evicted { content_id: String, size_bytes: u64 },
    /// The whole cache was cleared.
    Cleared { entries: usize },
}

/// Events related to connectivity and the offline flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NetworkEvent {
    /// The underlying connectivity changed.
    ConnectivityChanged { online: bool },
    /// The effective offline mode flipped.
    ///
    /// `forced` is true when connectivity loss persisted the setting, as
    /// opposed to the user toggling it.
    OfflineModeChanged { offline: bool, forced: bool },
}

/// Central event bus for publishing and subscribing to events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are none. Emission is fire-and-forget for most
    /// callers; having no subscribers is not a failure of the producer.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
