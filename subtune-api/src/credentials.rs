//! Server credentials and their persistence
//!
//! Credentials live in the platform secure store as a single JSON blob.
//! The password is redacted from `Debug` output and must never be logged
//! or interpolated into error messages.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use subtune_bridge::SecureStore;
use tracing::debug;

use crate::error::{ApiError, Result};

/// Secure store key holding the serialized credentials.
const CREDENTIALS_KEY: &str = "subsonic.credentials";

/// Protocol version sent with every request.
pub const DEFAULT_API_VERSION: &str = "1.16.1";

/// Connection settings for a Subsonic-compatible server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCredentials {
    /// Base URL, e.g. `https://music.example.com`. Trailing slashes are
    /// stripped when building request URLs.
    pub server_url: String,
    pub username: String,
    pub password: String,
    /// Subsonic protocol version, [`DEFAULT_API_VERSION`] unless overridden.
    pub api_version: String,
}

impl ServerCredentials {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.server_url.trim().trim_end_matches('/')
    }
}

impl std::fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCredentials")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Persists [`ServerCredentials`] through the [`SecureStore`] bridge.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn SecureStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, credentials: &ServerCredentials) -> Result<()> {
        let json = serde_json::to_string(credentials)
            .map_err(|e| ApiError::CredentialStore(e.to_string()))?;
        self.store
            .set_secret(CREDENTIALS_KEY, json.as_bytes())
            .await
            .map_err(|e| ApiError::CredentialStore(e.to_string()))?;
        debug!("Server credentials persisted");
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<ServerCredentials>> {
        let Some(bytes) = self
            .store
            .get_secret(CREDENTIALS_KEY)
            .await
            .map_err(|e| ApiError::CredentialStore(e.to_string()))?
        else {
            return Ok(None);
        };

        let credentials = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::CredentialStore(e.to_string()))?;
        Ok(Some(credentials))
    }

    pub async fn clear(&self) -> Result<()> {
        self.store
            .delete_secret(CREDENTIALS_KEY)
            .await
            .map_err(|e| ApiError::CredentialStore(e.to_string()))?;
        debug!("Server credentials cleared");
        Ok(())
    }
}
