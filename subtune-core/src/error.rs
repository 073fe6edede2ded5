//! Facade error type

use thiserror::Error;

/// Top-level error exposed to host applications.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] subtune_api::ApiError),

    #[error(transparent)]
    Catalog(#[from] subtune_catalog::CatalogError),

    #[error(transparent)]
    Playback(#[from] subtune_playback::PlaybackError),

    #[error(transparent)]
    Runtime(#[from] subtune_runtime::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
