//! API error types
//!
//! Error messages never contain credential material. Server-reported
//! failures carry the server's own `error.message` text.

use thiserror::Error;

/// Errors from the Subsonic REST client
#[derive(Error, Debug)]
pub enum ApiError {
    /// No server credentials are configured
    #[error("No server is configured")]
    NotConfigured,

    /// The server answered with `status: "failed"`
    #[error("Server error: {0}")]
    Server(String),

    /// Transport-level failure (connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Http(#[from] subtune_bridge::BridgeError),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Credential persistence failure
    #[error("Credential store error: {0}")]
    CredentialStore(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
