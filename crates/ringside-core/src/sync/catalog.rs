//! Catalog sync orchestrator
//!
//! Replaces the catalog zone wholesale from a downloaded payload database.
//! The payload is attached as a second connection and copied table-by-table
//! with set-based statements inside one transaction, so the replacement is
//! atomic and its duration is bound by the engine, not by row marshaling.

use crate::api::CatalogSource;
use crate::db::card_repository::CARD_COLUMNS;
use crate::db::{schema, Store};
use crate::error::{Error, Result};
use crate::state::VersionStore;

const PAYLOAD_ALIAS: &str = "incoming";

/// Progress phase reported during `sync_database`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    CheckingManifest,
    Downloading,
    Merging,
    Done,
}

/// Result of `check_for_updates`. Pure report, no store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCheck {
    pub available: bool,
    pub current_version: i64,
    pub latest_version: Option<i64>,
}

/// Terminal state of a `sync_database` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The local catalog already matches (or exceeds) the published version.
    UpToDate,
    /// A newer catalog was merged in.
    Updated { version: i64, cards: i64 },
}

/// Orchestrator for versioned catalog replacement.
pub struct CatalogSync<S, V> {
    source: S,
    state: V,
}

impl<S: CatalogSource, V: VersionStore> CatalogSync<S, V> {
    pub const fn new(source: S, state: V) -> Self {
        Self { source, state }
    }

    /// The version state, for callers that need to read the marker.
    pub const fn state(&self) -> &V {
        &self.state
    }

    /// Compare the published catalog version against the local marker.
    pub async fn check_for_updates(&self) -> Result<UpdateCheck> {
        let current_version = self.state.catalog_version();
        let manifest = self.source.catalog_manifest().await?;
        Ok(UpdateCheck {
            available: manifest.version > current_version,
            current_version,
            latest_version: Some(manifest.version),
        })
    }

    /// Download and merge the published catalog if it is newer than the
    /// local marker.
    ///
    /// The marker only ever advances, and only after the merge transaction
    /// has committed; any failure leaves it untouched so a retry attempts
    /// the same version again.
    pub async fn sync_database(
        &mut self,
        store: &mut Store,
        mut progress: impl FnMut(SyncPhase, f32),
    ) -> Result<SyncOutcome> {
        progress(SyncPhase::CheckingManifest, 0.05);
        let manifest = self.source.catalog_manifest().await?;

        let current = self.state.catalog_version();
        if manifest.version <= current {
            tracing::info!(current, published = manifest.version, "Catalog already current");
            self.state
                .set_last_synced_at(chrono::Utc::now().timestamp_millis())?;
            progress(SyncPhase::Done, 1.0);
            return Ok(SyncOutcome::UpToDate);
        }

        tracing::info!(
            current,
            published = manifest.version,
            cards = manifest.card_count,
            "Catalog update available, downloading"
        );

        progress(SyncPhase::Downloading, 0.2);
        let payload = tempfile::NamedTempFile::new()?;
        let written = self
            .source
            .download_catalog(&manifest.filename, payload.path())
            .await?;
        if written != manifest.size_bytes {
            return Err(Error::DownloadIncomplete(format!(
                "expected {} bytes, got {written}",
                manifest.size_bytes
            )));
        }

        progress(SyncPhase::Merging, 0.6);
        store.attach(payload.path(), PAYLOAD_ALIAS)?;

        let merge_result = store.with_transaction(|tx| {
            // Dependents first, then cards; then copy back in reverse.
            for table in schema::CATALOG_TABLES {
                tx.execute(&format!("DELETE FROM {table}"), [])?;
            }
            tx.execute(
                &format!(
                    "INSERT INTO cards ({CARD_COLUMNS})
                     SELECT {CARD_COLUMNS} FROM {PAYLOAD_ALIAS}.cards"
                ),
                [],
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO card_related_finishes (card_uuid, finish_uuid)
                     SELECT card_uuid, finish_uuid FROM {PAYLOAD_ALIAS}.card_related_finishes"
                ),
                [],
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO card_related_cards (card_uuid, related_uuid)
                     SELECT card_uuid, related_uuid FROM {PAYLOAD_ALIAS}.card_related_cards"
                ),
                [],
            )?;
            let cards: i64 =
                tx.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
            Ok(cards)
        });

        // Detach must happen after the transaction has settled either way.
        match merge_result {
            Ok(cards) => {
                store.detach(PAYLOAD_ALIAS)?;
                self.state.set_catalog_version(manifest.version)?;
                self.state
                    .set_last_synced_at(chrono::Utc::now().timestamp_millis())?;
                tracing::info!(version = manifest.version, cards, "Catalog merge committed");
                progress(SyncPhase::Done, 1.0);
                Ok(SyncOutcome::Updated {
                    version: manifest.version,
                    cards,
                })
            }
            Err(e) => {
                if let Err(detach_err) = store.detach(PAYLOAD_ALIAS) {
                    tracing::warn!(error = %detach_err, "Failed to detach payload after rollback");
                }
                Err(Error::MergeFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;
    use rusqlite::Connection;

    use super::*;
    use crate::db::test_support::{insert_card, test_card};
    use crate::db::{schema, CardRepository, SqliteCardRepository};
    use crate::models::CatalogManifest;
    use crate::state::MemoryVersionStore;

    /// Serves a payload database file built by the test.
    struct FileCatalogSource {
        manifest: CatalogManifest,
        payload_path: PathBuf,
    }

    impl CatalogSource for FileCatalogSource {
        async fn catalog_manifest(&self) -> Result<CatalogManifest> {
            Ok(self.manifest.clone())
        }

        async fn download_catalog(&self, _filename: &str, dest: &Path) -> Result<u64> {
            let bytes = std::fs::read(&self.payload_path)?;
            std::fs::write(dest, &bytes)?;
            Ok(bytes.len() as u64)
        }
    }

    /// Build a payload database holding the given card uuids.
    fn build_payload(path: &Path, uuids: &[&str]) {
        let conn = Connection::open(path).unwrap();
        schema::ensure_schema(&conn).unwrap();
        for uuid in uuids {
            insert_card(&conn, &test_card(uuid, &format!("Card {uuid}"), "MainDeckCard"));
        }
        conn.execute(
            "INSERT INTO card_related_cards (card_uuid, related_uuid) VALUES (?, ?)",
            [uuids[0], uuids[uuids.len() - 1]],
        )
        .unwrap();
    }

    fn source_for(path: &Path, version: i64, card_count: i64) -> FileCatalogSource {
        let size_bytes = std::fs::metadata(path).unwrap().len();
        FileCatalogSource {
            manifest: CatalogManifest {
                version,
                generated: "2025-01-10T04:00:00Z".to_string(),
                filename: format!("cards_v{version}.db"),
                hash: "unused".to_string(),
                size_bytes,
                card_count,
                related_finishes_count: 0,
                related_cards_count: 1,
            },
            payload_path: path.to_path_buf(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_merges_newer_catalog_and_advances_marker() {
        let dir = tempfile::tempdir().unwrap();
        let payload_path = dir.path().join("payload.db");
        build_payload(&payload_path, &["n-1", "n-2", "n-3"]);

        let mut store = Store::open_in_memory().unwrap();
        insert_card(store.connection(), &test_card("old-1", "Old Card", "MainDeckCard"));

        let state = MemoryVersionStore { version: 3, last_synced_at: None };
        let mut sync = CatalogSync::new(source_for(&payload_path, 5, 3), state);

        let mut phases = Vec::new();
        let outcome = sync
            .sync_database(&mut store, |phase, _| phases.push(phase))
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Updated { version: 5, cards: 3 });
        assert_eq!(sync.state().catalog_version(), 5);
        assert!(sync.state().last_synced_at().is_some());
        assert_eq!(phases.last(), Some(&SyncPhase::Done));

        let repo = SqliteCardRepository::new(store.connection());
        assert_eq!(repo.count().unwrap(), 3);
        assert!(repo.get("old-1").unwrap().is_none());
        assert!(repo.get("n-2").unwrap().is_some());

        // Already current now.
        let check = sync.check_for_updates().await.unwrap();
        assert!(!check.available);
        assert_eq!(check.current_version, 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_is_noop_when_already_current() {
        let dir = tempfile::tempdir().unwrap();
        let payload_path = dir.path().join("payload.db");
        build_payload(&payload_path, &["n-1"]);

        let mut store = Store::open_in_memory().unwrap();
        insert_card(store.connection(), &test_card("keep-1", "Keeper", "MainDeckCard"));

        let state = MemoryVersionStore { version: 7, last_synced_at: None };
        let mut sync = CatalogSync::new(source_for(&payload_path, 5, 1), state);

        let outcome = sync.sync_database(&mut store, |_, _| {}).await.unwrap();
        assert_eq!(outcome, SyncOutcome::UpToDate);

        // Marker never decrements; existing rows untouched.
        assert_eq!(sync.state().catalog_version(), 7);
        let repo = SqliteCardRepository::new(store.connection());
        assert!(repo.get("keep-1").unwrap().is_some());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_preserves_user_zone_and_orphans_dropped_references() {
        let dir = tempfile::tempdir().unwrap();
        let payload_path = dir.path().join("payload.db");
        // Payload keeps n-1 but drops x-1.
        build_payload(&payload_path, &["n-1"]);

        let mut store = Store::open_in_memory().unwrap();
        insert_card(store.connection(), &test_card("x-1", "Dropped Card", "MainDeckCard"));
        store
            .connection()
            .execute_batch(
                "INSERT INTO folders (id, name, is_default, display_order, created_at)
                 VALUES ('owned', 'Owned', 1, 0, 0);
                 INSERT INTO folder_cards (folder_id, card_uuid, quantity, added_at)
                 VALUES ('owned', 'x-1', 2, 0);",
            )
            .unwrap();

        let state = MemoryVersionStore::default();
        let mut sync = CatalogSync::new(source_for(&payload_path, 1, 1), state);
        sync.sync_database(&mut store, |_, _| {}).await.unwrap();

        // Membership row survives byte-for-byte but no longer joins.
        let quantity: i64 = store
            .connection()
            .query_row(
                "SELECT quantity FROM folder_cards WHERE folder_id = 'owned' AND card_uuid = 'x-1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(quantity, 2);

        let joined: i64 = store
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM folder_cards fc
                 INNER JOIN cards c ON c.db_uuid = fc.card_uuid
                 WHERE fc.folder_id = 'owned'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(joined, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_merge_rolls_back_and_keeps_marker() {
        let dir = tempfile::tempdir().unwrap();
        let payload_path = dir.path().join("payload.db");

        // Payload has a cards table but no relationship tables, so the
        // relationship copy fails after the card copy succeeded.
        {
            let conn = Connection::open(&payload_path).unwrap();
            conn.execute_batch(
                "CREATE TABLE cards (db_uuid TEXT PRIMARY KEY, name TEXT NOT NULL,
                 card_type TEXT NOT NULL, rules_text TEXT, errata_text TEXT,
                 is_banned INTEGER NOT NULL DEFAULT 0, release_set TEXT, srg_url TEXT,
                 srgpc_url TEXT, comments TEXT, tags TEXT, power INTEGER, agility INTEGER,
                 strike INTEGER, submission INTEGER, grapple INTEGER, technique INTEGER,
                 division TEXT, gender TEXT, deck_card_number INTEGER, atk_type TEXT,
                 play_order TEXT, synced_at INTEGER NOT NULL DEFAULT 0);
                 INSERT INTO cards (db_uuid, name, card_type) VALUES ('bad-1', 'Bad', 'MainDeckCard');",
            )
            .unwrap();
        }

        let mut store = Store::open_in_memory().unwrap();
        insert_card(store.connection(), &test_card("orig-1", "Original", "MainDeckCard"));

        let state = MemoryVersionStore { version: 3, last_synced_at: None };
        let mut sync = CatalogSync::new(source_for(&payload_path, 5, 1), state);

        let err = sync.sync_database(&mut store, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, Error::MergeFailed(_)));

        // Full rollback: the pre-sync catalog is intact, marker untouched.
        let repo = SqliteCardRepository::new(store.connection());
        assert!(repo.get("orig-1").unwrap().is_some());
        assert!(repo.get("bad-1").unwrap().is_none());
        assert_eq!(sync.state().catalog_version(), 3);
        assert_eq!(sync.state().last_synced_at(), None);

        // The store stays usable; a corrected retry succeeds.
        let good_path = dir.path().join("good.db");
        build_payload(&good_path, &["n-1"]);
        let mut sync = CatalogSync::new(
            source_for(&good_path, 5, 1),
            MemoryVersionStore { version: 3, last_synced_at: None },
        );
        let outcome = sync.sync_database(&mut store, |_, _| {}).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated { version: 5, cards: 1 });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_short_download_aborts_before_merge() {
        let dir = tempfile::tempdir().unwrap();
        let payload_path = dir.path().join("payload.db");
        build_payload(&payload_path, &["n-1"]);

        let mut source = source_for(&payload_path, 5, 1);
        source.manifest.size_bytes += 100;

        let mut store = Store::open_in_memory().unwrap();
        insert_card(store.connection(), &test_card("orig-1", "Original", "MainDeckCard"));

        let mut sync = CatalogSync::new(source, MemoryVersionStore::default());
        let err = sync.sync_database(&mut store, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, Error::DownloadIncomplete(_)));

        let repo = SqliteCardRepository::new(store.connection());
        assert!(repo.get("orig-1").unwrap().is_some());
        assert_eq!(sync.state().catalog_version(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_check_for_updates_does_not_mutate() {
        let dir = tempfile::tempdir().unwrap();
        let payload_path = dir.path().join("payload.db");
        build_payload(&payload_path, &["n-1"]);

        let sync = CatalogSync::new(
            source_for(&payload_path, 5, 1),
            MemoryVersionStore { version: 3, last_synced_at: None },
        );

        for _ in 0..3 {
            let check = sync.check_for_updates().await.unwrap();
            assert!(check.available);
            assert_eq!(check.current_version, 3);
            assert_eq!(check.latest_version, Some(5));
        }
        assert_eq!(sync.state().catalog_version(), 3);
    }
}
