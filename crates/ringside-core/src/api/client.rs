//! HTTP client for the published catalog service

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::models::{CatalogManifest, ImageManifest};

/// Production catalog service.
pub const DEFAULT_BASE_URL: &str = "https://cards.srguniverse.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of catalog manifests and payload databases.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// Fetch the descriptor of the current published catalog snapshot
    async fn catalog_manifest(&self) -> Result<CatalogManifest>;

    /// Download the catalog payload named by the manifest into `dest`,
    /// returning the number of bytes written
    async fn download_catalog(&self, filename: &str, dest: &Path) -> Result<u64>;
}

/// Source of image manifests and image bytes.
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    /// Fetch the full remote image manifest
    async fn image_manifest(&self) -> Result<ImageManifest>;

    /// Download one image by its manifest-relative path
    async fn download_image(&self, path: &str) -> Result<Vec<u8>>;
}

/// HTTP implementation of both remote sources
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client against `base_url` (no trailing slash required).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch_ok(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        Ok(response.error_for_status()?)
    }
}

impl CatalogSource for ApiClient {
    async fn catalog_manifest(&self) -> Result<CatalogManifest> {
        let url = format!("{}/api/cards/manifest", self.base_url);
        tracing::debug!(%url, "Fetching catalog manifest");
        let response = self.fetch_ok(&url).await?;
        response
            .json()
            .await
            .map_err(|e| Error::ManifestMalformed(e.to_string()))
    }

    async fn download_catalog(&self, filename: &str, dest: &Path) -> Result<u64> {
        let url = format!("{}/api/cards/database", self.base_url);
        tracing::info!(%url, filename, "Downloading catalog payload");

        // Streamed chunk-by-chunk; the payload can be tens of megabytes.
        let mut response = self.fetch_ok(&url).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

impl ImageSource for ApiClient {
    async fn image_manifest(&self) -> Result<ImageManifest> {
        let url = format!("{}/api/images/manifest", self.base_url);
        tracing::debug!(%url, "Fetching image manifest");
        let response = self.fetch_ok(&url).await?;
        response
            .json()
            .await
            .map_err(|e| Error::ManifestMalformed(e.to_string()))
    }

    async fn download_image(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/images/mobile/{path}", self.base_url);
        let response = self.fetch_ok(&url).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
