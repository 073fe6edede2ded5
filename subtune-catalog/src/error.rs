//! Catalog error types

use thiserror::Error;

/// Errors from the catalog metadata cache
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure
    #[error("Migration error: {0}")]
    Migration(String),

    /// Rejected input (empty id, invalid field)
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
