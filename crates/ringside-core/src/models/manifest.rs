//! Remote manifest models for catalog and image sync

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Descriptor of the current published catalog snapshot.
///
/// Fetched per sync and compared against the persisted version marker; never
/// stored as a row anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Monotonically increasing snapshot version
    pub version: i64,
    /// Generation timestamp as published (RFC 3339 string)
    pub generated: String,
    /// Payload filename on the server
    pub filename: String,
    /// Content hash of the payload
    pub hash: String,
    /// Payload size in bytes, checked after download
    pub size_bytes: u64,
    pub card_count: i64,
    pub related_finishes_count: i64,
    pub related_cards_count: i64,
}

/// A single image's location and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Path relative to the image endpoint, e.g. `ab/ab12...-uuid.webp`
    pub path: String,
    /// SHA-256 hex digest of the image bytes
    pub hash: String,
}

/// Mapping from card identifier to image location and hash.
///
/// The same shape is used for the remote manifest, the bundled baseline, and
/// the locally persisted synced manifest. `BTreeMap` keeps iteration in
/// ascending id order so sync runs visit entries deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageManifest {
    pub version: i64,
    pub generated: String,
    pub image_count: i64,
    pub images: BTreeMap<String, ImageEntry>,
}

impl ImageManifest {
    /// An empty manifest at version 0, used when no local copy exists yet.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: 0,
            generated: String::new(),
            image_count: 0,
            images: BTreeMap::new(),
        }
    }
}
