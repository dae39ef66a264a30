//! Local store connection management

use std::fs;
use std::path::Path;

use rusqlite::{Connection, Transaction};

use crate::error::{Error, Result};

use super::schema;

/// The local relational store.
///
/// Holds two zones: the catalog zone (`cards` plus relationship tables),
/// fully replaced by sync, and the user zone (folders, decks, slots), never
/// touched by sync. Owns the single writable connection.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at `db_path`, seeding it from the bundled template on
    /// first run.
    ///
    /// The template ships an initial catalog snapshot and an empty user zone;
    /// a missing template is fatal (`Error::BundleMissing`) because no usable
    /// store can be constructed without it.
    pub fn open(db_path: impl AsRef<Path>, template_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let template_path = template_path.as_ref();

        if !db_path.exists() {
            if !template_path.exists() {
                return Err(Error::BundleMissing(template_path.to_path_buf()));
            }
            if let Some(parent) = db_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(template_path, db_path)?;
            tracing::info!(path = %db_path.display(), "Seeded store from bundled template");
        }

        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.configure()?;
        store.ensure_schema()?;
        Ok(store)
    }

    /// Open an in-memory store with a fully created, empty schema (tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.configure()?;
        store.ensure_schema()?;
        Ok(store)
    }

    /// Configure `SQLite` for durability and concurrency.
    fn configure(&self) -> Result<()> {
        // WAL is rejected for in-memory databases; that's fine.
        self.conn.pragma_update(None, "journal_mode", "WAL").ok();
        self.conn.pragma_update(None, "synchronous", "NORMAL").ok();
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Create any missing tables. Safe on every startup.
    pub fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.conn)
    }

    /// Run `f` inside a single transaction.
    ///
    /// Commits when `f` returns Ok; any error rolls the whole transaction
    /// back. The closure receives a handle for raw statements, so callers
    /// (the sync engine in particular) own their own statement sequencing.
    pub fn with_transaction<T>(
        &mut self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Attach a second database file under `alias`.
    ///
    /// Used by the catalog merge to bulk-copy rows out of a downloaded
    /// payload with set-based `INSERT ... SELECT` statements. The attached
    /// database is only ever read.
    pub fn attach(&self, path: impl AsRef<Path>, alias: &str) -> Result<()> {
        debug_assert!(alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        let path = path.as_ref().to_string_lossy().to_string();
        self.conn
            .execute(&format!("ATTACH DATABASE ?1 AS {alias}"), [path])?;
        Ok(())
    }

    /// Detach a previously attached database.
    ///
    /// Must be sequenced after the merge transaction has committed or rolled
    /// back; detaching inside an open transaction fails with "database is
    /// locked" on some builds.
    pub fn detach(&self, alias: &str) -> Result<()> {
        debug_assert!(alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        self.conn.execute(&format!("DETACH DATABASE {alias}"), [])?;
        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
