//! Audio transport abstraction.
//!
//! The core treats playback as an opaque transport with play/pause/seek/rate
//! primitives. Host applications supply the engine (rodio, AVPlayer,
//! ExoPlayer, ...); the core only sequences handles and reacts to completion
//! events.
//!
//! Ownership model: `open` hands out a boxed [`TransportHandle`] and exactly
//! one handle may be live at a time. The playback controller releases the
//! previous handle before opening the next; handles are transferred, never
//! shared.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::Result;

/// Source descriptor handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// Remote HTTP(S) stream fetched by the host.
    RemoteStream { url: String },
}

impl AudioSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::RemoteStream { .. })
    }
}

/// Out-of-band notifications from a live transport.
///
/// Delivered on the channel passed to [`AudioTransport::open`]; the
/// controller consumes them from its own task rather than from inside any
/// host callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The track played to its natural end.
    Finished,
    /// The transport failed mid-stream.
    Failed { message: String },
}

/// Factory for transport handles.
#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Prepare a transport for the given source.
    ///
    /// `events` receives completion/failure notifications for the returned
    /// handle. Implementations must stop emitting once the handle is
    /// released.
    async fn open(
        &self,
        source: AudioSource,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn TransportHandle>>;
}

/// Exclusive handle to one prepared audio stream.
#[async_trait]
pub trait TransportHandle: Send {
    /// Begin or resume playback.
    async fn play(&mut self) -> Result<()>;

    /// Pause without releasing the stream.
    async fn pause(&mut self) -> Result<()>;

    /// Seek to an absolute position.
    async fn seek(&mut self, position: Duration) -> Result<()>;

    /// Adjust playback rate with pitch-preserving resampling.
    async fn set_rate(&mut self, rate: f32) -> Result<()>;

    /// Current playback position.
    async fn position(&self) -> Result<Duration>;

    /// Total stream duration, when known.
    async fn duration(&self) -> Result<Option<Duration>>;

    /// Stop playback and free all resources, consuming the handle.
    async fn release(self: Box<Self>) -> Result<()>;
}
