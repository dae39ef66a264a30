//! Image sync orchestrator
//!
//! Incremental, content-addressed, and independent of the catalog version:
//! card identifiers are stable across catalog versions, so image freshness is
//! decided purely by hash comparison against the local manifest view.

use std::collections::BTreeMap;

use tokio::sync::Mutex;

use crate::api::ImageSource;
use crate::error::Result;
use crate::images::ImageCache;
use crate::models::{ImageEntry, ImageManifest};

/// Local manifest is re-persisted after this many downloads so a crashed run
/// resumes from the last checkpoint.
const CHECKPOINT_INTERVAL: usize = 25;

/// Outcome of a sync run; `downloaded` falls short of `total` when some
/// items failed and were skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSyncReport {
    pub downloaded: usize,
    pub total: usize,
}

/// Pending work as reported by `sync_status`, without downloading anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSyncStatus {
    pub pending: usize,
    pub total: usize,
}

/// Orchestrator for content-hash image sync.
pub struct ImageSync<S> {
    source: S,
    cache: ImageCache,
    // Serializes runs so concurrent triggers cannot interleave the local
    // manifest's read-modify-write.
    run_lock: Mutex<()>,
}

impl<S: ImageSource> ImageSync<S> {
    pub const fn new(source: S, cache: ImageCache) -> Self {
        Self {
            source,
            cache,
            run_lock: Mutex::const_new(()),
        }
    }

    pub const fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Entries whose local hash is absent or differs from the remote hash,
    /// in ascending id order.
    fn to_sync(
        local: &BTreeMap<String, String>,
        remote: &ImageManifest,
    ) -> Vec<(String, ImageEntry)> {
        remote
            .images
            .iter()
            .filter(|(id, entry)| local.get(*id) != Some(&entry.hash))
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    /// Report pending and total image counts without downloading.
    pub async fn sync_status(&self) -> Result<ImageSyncStatus> {
        let local = self.cache.local_hashes()?;
        let remote = self.source.image_manifest().await?;
        let pending = Self::to_sync(&local, &remote).len();
        Ok(ImageSyncStatus {
            pending,
            total: remote.images.len(),
        })
    }

    /// Download every absent-or-changed image, checkpointing the local
    /// manifest as the run progresses.
    ///
    /// Per-item failures are logged and skipped; one bad image never aborts
    /// the batch. `progress` receives `(downloaded, total)` after each item.
    pub async fn sync_images(
        &self,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ImageSyncReport> {
        let _guard = self.run_lock.lock().await;

        let local = self.cache.local_hashes()?;
        let remote = self.source.image_manifest().await?;
        let pending = Self::to_sync(&local, &remote);
        let total = pending.len();

        if total == 0 {
            tracing::info!("Image cache already current");
            return Ok(ImageSyncReport { downloaded: 0, total: 0 });
        }
        tracing::info!(total, remote_version = remote.version, "Syncing images");

        let mut synced_this_run: BTreeMap<String, ImageEntry> = BTreeMap::new();
        let mut downloaded = 0;

        for (id, entry) in pending {
            match self.source.download_image(&entry.path).await {
                Ok(bytes) => {
                    self.cache.write_image(&id, &bytes)?;
                    synced_this_run.insert(id, entry);
                    downloaded += 1;
                    if downloaded % CHECKPOINT_INTERVAL == 0 {
                        self.checkpoint(&remote, &synced_this_run)?;
                    }
                }
                Err(e) => {
                    tracing::warn!(card = %id, error = %e, "Image download failed, skipping");
                }
            }
            progress(downloaded, total);
        }

        self.checkpoint(&remote, &synced_this_run)?;
        tracing::info!(downloaded, total, "Image sync finished");
        Ok(ImageSyncReport { downloaded, total })
    }

    /// Merge this run's completed downloads into the persisted local
    /// manifest. Only fully written images are recorded, so a crash between
    /// checkpoints loses at most the interval's worth of progress.
    fn checkpoint(
        &self,
        remote: &ImageManifest,
        synced_this_run: &BTreeMap<String, ImageEntry>,
    ) -> Result<()> {
        let mut manifest = self.cache.local_manifest()?;
        manifest.version = remote.version;
        manifest.generated = remote.generated.clone();
        for (id, entry) in synced_this_run {
            manifest.images.insert(id.clone(), entry.clone());
        }
        manifest.image_count = manifest.images.len() as i64;
        self.cache.save_local_manifest(&manifest)
    }
}
