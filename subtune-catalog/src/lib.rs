//! # Catalog Metadata Cache
//!
//! Durable, denormalized song metadata stored in SQLite so browsing works
//! without connectivity. Records outlive the cached audio bytes: evicting a
//! file clears `has_local_audio` but keeps the row searchable. The
//! `songs_with_local_audio` listing is the library source while offline.

pub mod db;
pub mod error;
pub mod models;
pub mod repository;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{CatalogError, Result};
pub use models::{Song, SongId};
pub use repository::{CatalogRepository, SqliteCatalogRepository};
