//! Persistent sync state
//!
//! A tiny JSON document next to the store holding the installed catalog
//! version and the last successful sync time. Kept outside the database on
//! purpose: the version marker must only advance after the merge transaction
//! has committed, and a separate file makes that sequencing explicit.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Trait for reading and advancing sync state
pub trait VersionStore {
    /// Installed catalog version; 0 before the first successful sync
    fn catalog_version(&self) -> i64;

    /// Record a newly installed catalog version
    fn set_catalog_version(&mut self, version: i64) -> Result<()>;

    /// Unix millis of the last successful catalog sync, if any
    fn last_synced_at(&self) -> Option<i64>;

    /// Record a successful catalog sync time
    fn set_last_synced_at(&mut self, at: i64) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDoc {
    #[serde(default)]
    catalog_version: i64,
    #[serde(default)]
    last_synced_at: Option<i64>,
}

/// File-backed `VersionStore`
#[derive(Debug)]
pub struct JsonStateFile {
    path: PathBuf,
    doc: StateDoc,
}

impl JsonStateFile {
    /// Load state from `path`, starting from version 0 when the file does not
    /// exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            StateDoc::default()
        };
        Ok(Self { path, doc })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash mid-write cannot truncate the live
        // marker file.
        let scratch = self.path.with_extension("tmp");
        fs::write(&scratch, serde_json::to_string_pretty(&self.doc)?)?;
        fs::rename(&scratch, &self.path)?;
        Ok(())
    }
}

impl VersionStore for JsonStateFile {
    fn catalog_version(&self) -> i64 {
        self.doc.catalog_version
    }

    fn set_catalog_version(&mut self, version: i64) -> Result<()> {
        self.doc.catalog_version = version;
        self.persist()
    }

    fn last_synced_at(&self) -> Option<i64> {
        self.doc.last_synced_at
    }

    fn set_last_synced_at(&mut self, at: i64) -> Result<()> {
        self.doc.last_synced_at = Some(at);
        self.persist()
    }
}

/// In-memory `VersionStore` for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    pub version: i64,
    pub last_synced_at: Option<i64>,
}

#[cfg(test)]
impl VersionStore for MemoryVersionStore {
    fn catalog_version(&self) -> i64 {
        self.version
    }

    fn set_catalog_version(&mut self, version: i64) -> Result<()> {
        self.version = version;
        Ok(())
    }

    fn last_synced_at(&self) -> Option<i64> {
        self.last_synced_at
    }

    fn set_last_synced_at(&mut self, at: i64) -> Result<()> {
        self.last_synced_at = Some(at);
        Ok(())
    }
}
