//! Sync orchestrators for the catalog and image assets

pub mod catalog;
pub mod images;

pub use catalog::{CatalogSync, SyncOutcome, SyncPhase, UpdateCheck};
pub use images::{ImageSync, ImageSyncReport, ImageSyncStatus};
