//! Error types for ringside-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ringside-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ringside-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Network error (connect failure, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote manifest could not be decoded or served
    #[error("Malformed manifest: {0}")]
    ManifestMalformed(String),

    /// Catalog payload download aborted before completion
    #[error("Incomplete download: {0}")]
    DownloadIncomplete(String),

    /// Atomic catalog replace failed; the transaction was rolled back
    #[error("Catalog merge failed: {0}")]
    MergeFailed(String),

    /// First-run seed template is absent; no usable store can be built
    #[error("Bundled catalog template not found at {}", .0.display())]
    BundleMissing(PathBuf),

    /// Deck slot number outside the 1-30 main-deck range
    #[error("Invalid deck slot number {0} (must be 1-30)")]
    InvalidSlot(i64),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Default folders cannot be deleted
    #[error("Cannot delete a default folder")]
    DefaultFolderProtected,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
