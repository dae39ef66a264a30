//! Content-addressed image storage
//!
//! Synced images live under `{root}/synced_images/{first-2-chars}/{file}`,
//! sharded by the first two characters of the card identifier so no single
//! directory grows unbounded. The install ships a bundled baseline manifest
//! describing images packed into the app; downloads layer a local manifest on
//! top of it, and the effective hash view is bundled-then-overlay.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::ImageManifest;

const SYNCED_DIR: &str = "synced_images";
const LOCAL_MANIFEST: &str = "local_manifest.json";

/// On-disk image store with bundled baseline and local overlay manifests.
pub struct ImageCache {
    root: PathBuf,
    bundled_manifest_path: PathBuf,
}

impl ImageCache {
    /// Create a cache rooted at `root`, reading the bundled baseline manifest
    /// from `bundled_manifest_path` when present.
    pub fn new(root: impl Into<PathBuf>, bundled_manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bundled_manifest_path: bundled_manifest_path.into(),
        }
    }

    /// Directory holding downloaded image shards.
    #[must_use]
    pub fn synced_dir(&self) -> PathBuf {
        self.root.join(SYNCED_DIR)
    }

    /// Sharded on-disk path for a card's image.
    ///
    /// Identifiers whose first two bytes are not a whole prefix (too short,
    /// or starting with a multibyte character) shard under the full
    /// identifier; the catalog never publishes such ids but a malformed
    /// manifest must not panic here.
    #[must_use]
    pub fn image_path(&self, uuid: &str) -> PathBuf {
        let shard = uuid.get(..2).unwrap_or(uuid);
        self.synced_dir().join(shard).join(format!("{uuid}.webp"))
    }

    /// Whether a synced image exists on disk for `uuid`.
    #[must_use]
    pub fn has_image(&self, uuid: &str) -> bool {
        self.image_path(uuid).exists()
    }

    /// Bundled baseline manifest; empty when the install ships none.
    pub fn bundled_manifest(&self) -> Result<ImageManifest> {
        if !self.bundled_manifest_path.exists() {
            return Ok(ImageManifest::empty());
        }
        let raw = fs::read_to_string(&self.bundled_manifest_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Locally persisted manifest of downloaded images; empty before the
    /// first sync.
    pub fn local_manifest(&self) -> Result<ImageManifest> {
        let path = self.root.join(LOCAL_MANIFEST);
        if !path.exists() {
            return Ok(ImageManifest::empty());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the local manifest, creating the cache root if needed.
    pub fn save_local_manifest(&self, manifest: &ImageManifest) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(LOCAL_MANIFEST);
        fs::write(&path, serde_json::to_string(manifest)?)?;
        Ok(())
    }

    /// Effective hash per card id: bundled baseline overlaid with every
    /// locally synced entry.
    pub fn local_hashes(&self) -> Result<BTreeMap<String, String>> {
        let mut hashes: BTreeMap<String, String> = self
            .bundled_manifest()?
            .images
            .into_iter()
            .map(|(id, entry)| (id, entry.hash))
            .collect();
        for (id, entry) in self.local_manifest()?.images {
            hashes.insert(id, entry.hash);
        }
        Ok(hashes)
    }

    /// Write downloaded image bytes into the shard for `uuid`.
    pub fn write_image(&self, uuid: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.image_path(uuid);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Delete every synced image and the local manifest.
    pub fn clear(&self) -> Result<()> {
        let synced = self.synced_dir();
        if synced.exists() {
            fs::remove_dir_all(&synced)?;
        }
        let manifest = self.root.join(LOCAL_MANIFEST);
        if manifest.exists() {
            fs::remove_file(&manifest)?;
        }
        Ok(())
    }

    /// Re-hash the on-disk image for `uuid` and compare against `expected`.
    ///
    /// Returns false when the file is missing or its digest differs.
    #[must_use]
    pub fn verify_hash(&self, uuid: &str, expected: &str) -> bool {
        let path = self.image_path(uuid);
        match fs::read(&path) {
            Ok(bytes) => sha256_hex(&bytes) == expected,
            Err(_) => false,
        }
    }
}

/// SHA-256 hex digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Hash a file on disk without loading it through the cache.
pub fn hash_file(path: &Path) -> Result<String> {
    Ok(sha256_hex(&fs::read(path)?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::ImageEntry;

    fn cache(dir: &Path) -> ImageCache {
        ImageCache::new(dir.join("images"), dir.join("bundled_manifest.json"))
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_image_path_is_sharded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());

        let path = cache.image_path("ab12-uuid");
        assert!(path.ends_with("synced_images/ab/ab12-uuid.webp"));
    }

    #[test]
    fn test_image_path_tolerates_odd_ids() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());

        // Multibyte first character: shard falls back to the full id.
        let path = cache.image_path("あ-card");
        assert!(path.ends_with("synced_images/あ-card/あ-card.webp"));
        cache.write_image("あ-card", b"x").unwrap();
        assert!(cache.has_image("あ-card"));

        // Single-character id.
        let path = cache.image_path("a");
        assert!(path.ends_with("synced_images/a/a.webp"));
    }

    #[test]
    fn test_write_verify_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());

        let bytes = b"webp bytes";
        cache.write_image("ab12", bytes).unwrap();
        assert!(cache.has_image("ab12"));
        assert!(cache.verify_hash("ab12", &sha256_hex(bytes)));
        assert!(!cache.verify_hash("ab12", "0000"));
        assert!(!cache.verify_hash("missing", &sha256_hex(bytes)));

        cache.clear().unwrap();
        assert!(!cache.has_image("ab12"));
    }

    #[test]
    fn test_local_overlay_wins_over_bundled_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());

        let mut bundled = ImageManifest::empty();
        bundled.images.insert(
            "card-a".to_string(),
            ImageEntry {
                path: "ca/card-a.webp".to_string(),
                hash: "old".to_string(),
            },
        );
        bundled.images.insert(
            "card-b".to_string(),
            ImageEntry {
                path: "ca/card-b.webp".to_string(),
                hash: "keep".to_string(),
            },
        );
        fs::write(
            dir.path().join("bundled_manifest.json"),
            serde_json::to_string(&bundled).unwrap(),
        )
        .unwrap();

        let mut local = ImageManifest::empty();
        local.images.insert(
            "card-a".to_string(),
            ImageEntry {
                path: "ca/card-a.webp".to_string(),
                hash: "new".to_string(),
            },
        );
        cache.save_local_manifest(&local).unwrap();

        let hashes = cache.local_hashes().unwrap();
        assert_eq!(hashes.get("card-a").map(String::as_str), Some("new"));
        assert_eq!(hashes.get("card-b").map(String::as_str), Some("keep"));
    }

    #[test]
    fn test_manifests_empty_before_first_sync() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        assert_eq!(cache.bundled_manifest().unwrap(), ImageManifest::empty());
        assert_eq!(cache.local_manifest().unwrap(), ImageManifest::empty());
        assert!(cache.local_hashes().unwrap().is_empty());
    }
}
