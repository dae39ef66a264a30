//! Remote catalog and image endpoints

mod client;

pub use client::{ApiClient, CatalogSource, ImageSource, DEFAULT_BASE_URL};
