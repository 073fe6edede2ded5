//! # Subsonic API Client
//!
//! REST client for Subsonic-compatible servers. Requests authenticate with
//! a per-request salted MD5 token so the password never travels or lands in
//! a URL; credentials persist through the platform secure store and are
//! redacted from all diagnostics. Responses arrive in the standard
//! `subsonic-response` envelope; failed calls surface the server's own
//! error message.

pub mod client;
pub mod credentials;
pub mod error;
pub mod request;
pub mod types;

pub use client::SubsonicClient;
pub use credentials::{CredentialStore, ServerCredentials, DEFAULT_API_VERSION};
pub use error::{ApiError, Result};
