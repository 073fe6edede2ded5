//! Playback and cache error types

use thiserror::Error;

/// Errors from the playback and offline-cache subsystem.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The song has no cached audio and the client is in offline mode.
    /// Recoverable: pick another song or leave offline mode.
    #[error("'{title}' is not available offline")]
    OfflineRestriction { title: String },

    /// The audio source could not be resolved or opened.
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// The host transport rejected an operation.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Cache storage failure (write or delete; read probes degrade instead).
    #[error(transparent)]
    Storage(#[from] subtune_bridge::BridgeError),

    /// Catalog metadata failure.
    #[error(transparent)]
    Catalog(#[from] subtune_catalog::CatalogError),

    /// Preferences or runtime wiring failure.
    #[error(transparent)]
    Runtime(#[from] subtune_runtime::Error),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
