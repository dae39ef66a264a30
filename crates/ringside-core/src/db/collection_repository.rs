//! Collection folder storage (user zone)

use rusqlite::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{Card, Folder};

use super::card_repository::SqliteCardRepository;

/// Default folders created on first run.
const DEFAULT_FOLDERS: [(&str, &str, i64); 3] =
    [("owned", "Owned", 0), ("wanted", "Wanted", 1), ("trade", "Trade", 2)];

/// A folder membership joined against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub card: Card,
    pub quantity: i64,
    pub added_at: i64,
}

/// Trait for collection folder operations
pub trait CollectionRepository {
    /// All folders, default first by display order
    fn folders(&self) -> Result<Vec<Folder>>;

    /// Folder by id
    fn folder(&self, id: &str) -> Result<Option<Folder>>;

    /// Insert or replace a folder
    fn save_folder(&self, folder: &Folder) -> Result<()>;

    /// Delete a folder; memberships cascade
    fn delete_folder(&self, id: &str) -> Result<()>;

    /// Create the default folders if missing; never touches existing rows
    fn ensure_default_folders(&self) -> Result<()>;

    /// Add a card to a folder, replacing any existing quantity
    fn add_card(&self, folder_id: &str, card_uuid: &str, quantity: i64) -> Result<()>;

    /// Update the quantity of an existing membership
    fn set_quantity(&self, folder_id: &str, card_uuid: &str, quantity: i64) -> Result<()>;

    /// Remove a card from a folder
    fn remove_card(&self, folder_id: &str, card_uuid: &str) -> Result<()>;

    /// Quantity of a card in a folder, if present
    fn quantity(&self, folder_id: &str, card_uuid: &str) -> Result<Option<i64>>;

    /// Whether a folder holds a card
    fn contains(&self, folder_id: &str, card_uuid: &str) -> Result<bool>;

    /// Memberships joined against the catalog, ordered by card name.
    ///
    /// Rows whose card identifier was dropped by a catalog update simply stop
    /// appearing here; the membership row itself survives.
    fn cards_in_folder(&self, folder_id: &str) -> Result<Vec<FolderEntry>>;

    /// Membership count for a folder (orphaned rows included)
    fn card_count(&self, folder_id: &str) -> Result<i64>;
}

/// `SQLite` implementation of `CollectionRepository`
pub struct SqliteCollectionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCollectionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_folder(row: &Row<'_>) -> rusqlite::Result<Folder> {
        Ok(Folder {
            id: row.get(0)?,
            name: row.get(1)?,
            is_default: row.get::<_, i64>(2)? != 0,
            display_order: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn folders(&self) -> Result<Vec<Folder>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_default, display_order, created_at
             FROM folders
             ORDER BY display_order, created_at",
        )?;
        let folders = stmt
            .query_map([], Self::parse_folder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    fn folder(&self, id: &str) -> Result<Option<Folder>> {
        let result = self.conn.query_row(
            "SELECT id, name, is_default, display_order, created_at FROM folders WHERE id = ?",
            [id],
            Self::parse_folder,
        );

        match result {
            Ok(folder) => Ok(Some(folder)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_folder(&self, folder: &Folder) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO folders (id, name, is_default, display_order, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                folder.id,
                folder.name,
                i64::from(folder.is_default),
                folder.display_order,
                folder.created_at
            ],
        )?;
        Ok(())
    }

    fn delete_folder(&self, id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM folders WHERE id = ?", [id])?;
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn ensure_default_folders(&self) -> Result<()> {
        for (id, name, order) in DEFAULT_FOLDERS {
            if self.folder(id)?.is_none() {
                let now = chrono::Utc::now().timestamp_millis();
                self.conn.execute(
                    "INSERT INTO folders (id, name, is_default, display_order, created_at)
                     VALUES (?, ?, 1, ?, ?)",
                    params![id, name, order, now],
                )?;
                tracing::debug!(folder = name, "Created default folder");
            }
        }
        Ok(())
    }

    fn add_card(&self, folder_id: &str, card_uuid: &str, quantity: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT OR REPLACE INTO folder_cards (folder_id, card_uuid, quantity, added_at)
             VALUES (?, ?, ?, ?)",
            params![folder_id, card_uuid, quantity, now],
        )?;
        Ok(())
    }

    fn set_quantity(&self, folder_id: &str, card_uuid: &str, quantity: i64) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE folder_cards SET quantity = ? WHERE folder_id = ? AND card_uuid = ?",
            params![quantity, folder_id, card_uuid],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("{folder_id}/{card_uuid}")));
        }
        Ok(())
    }

    fn remove_card(&self, folder_id: &str, card_uuid: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM folder_cards WHERE folder_id = ? AND card_uuid = ?",
            params![folder_id, card_uuid],
        )?;
        Ok(())
    }

    fn quantity(&self, folder_id: &str, card_uuid: &str) -> Result<Option<i64>> {
        let result = self.conn.query_row(
            "SELECT quantity FROM folder_cards WHERE folder_id = ? AND card_uuid = ?",
            params![folder_id, card_uuid],
            |row| row.get(0),
        );

        match result {
            Ok(quantity) => Ok(Some(quantity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, folder_id: &str, card_uuid: &str) -> Result<bool> {
        Ok(self.quantity(folder_id, card_uuid)?.is_some())
    }

    fn cards_in_folder(&self, folder_id: &str) -> Result<Vec<FolderEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.db_uuid, c.name, c.card_type, c.rules_text, c.errata_text, c.is_banned,
                    c.release_set, c.srg_url, c.srgpc_url, c.comments, c.tags, c.power,
                    c.agility, c.strike, c.submission, c.grapple, c.technique, c.division,
                    c.gender, c.deck_card_number, c.atk_type, c.play_order, c.synced_at,
                    fc.quantity, fc.added_at
             FROM cards c
             INNER JOIN folder_cards fc ON c.db_uuid = fc.card_uuid
             WHERE fc.folder_id = ?
             ORDER BY c.name ASC",
        )?;

        let entries = stmt
            .query_map([folder_id], |row| {
                Ok(FolderEntry {
                    card: SqliteCardRepository::parse_card(row)?,
                    quantity: row.get(23)?,
                    added_at: row.get(24)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn card_count(&self, folder_id: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM folder_cards WHERE folder_id = ?",
            [folder_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::test_support::{insert_card, test_card};
    use crate::db::Store;

    fn setup() -> Store {
        let store = Store::open_in_memory().unwrap();
        let repo = SqliteCollectionRepository::new(store.connection());
        repo.ensure_default_folders().unwrap();
        insert_card(store.connection(), &test_card("a-1", "Alpha", "MainDeckCard"));
        insert_card(store.connection(), &test_card("b-1", "Beta", "MainDeckCard"));
        store
    }

    #[test]
    fn test_ensure_default_folders_idempotent() {
        let store = setup();
        let repo = SqliteCollectionRepository::new(store.connection());

        repo.ensure_default_folders().unwrap();
        let folders = repo.folders().unwrap();
        assert_eq!(folders.len(), 3);
        assert_eq!(folders[0].id, "owned");
        assert!(folders[0].is_default);
    }

    #[test]
    fn test_add_and_update_membership() {
        let store = setup();
        let repo = SqliteCollectionRepository::new(store.connection());

        repo.add_card("owned", "a-1", 2).unwrap();
        assert_eq!(repo.quantity("owned", "a-1").unwrap(), Some(2));
        assert!(repo.contains("owned", "a-1").unwrap());

        repo.set_quantity("owned", "a-1", 4).unwrap();
        assert_eq!(repo.quantity("owned", "a-1").unwrap(), Some(4));

        repo.remove_card("owned", "a-1").unwrap();
        assert!(!repo.contains("owned", "a-1").unwrap());
    }

    #[test]
    fn test_set_quantity_missing_row() {
        let store = setup();
        let repo = SqliteCollectionRepository::new(store.connection());

        let err = repo.set_quantity("owned", "nope", 1).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_cards_in_folder_ordered_by_name() {
        let store = setup();
        let repo = SqliteCollectionRepository::new(store.connection());

        repo.add_card("owned", "b-1", 1).unwrap();
        repo.add_card("owned", "a-1", 3).unwrap();

        let entries = repo.cards_in_folder("owned").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].card.name, "Alpha");
        assert_eq!(entries[0].quantity, 3);
    }

    #[test]
    fn test_orphaned_membership_survives_but_drops_from_join() {
        let store = setup();
        let repo = SqliteCollectionRepository::new(store.connection());

        repo.add_card("owned", "a-1", 1).unwrap();
        store
            .connection()
            .execute("DELETE FROM cards WHERE db_uuid = 'a-1'", [])
            .unwrap();

        assert!(repo.cards_in_folder("owned").unwrap().is_empty());
        assert_eq!(repo.card_count("owned").unwrap(), 1);
        assert!(repo.contains("owned", "a-1").unwrap());
    }

    #[test]
    fn test_delete_folder_cascades_memberships() {
        let store = setup();
        let repo = SqliteCollectionRepository::new(store.connection());

        repo.save_folder(&Folder::new("binder", "Binder", 5)).unwrap();
        repo.add_card("binder", "a-1", 1).unwrap();
        repo.delete_folder("binder").unwrap();

        let count: i64 = store
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM folder_cards WHERE folder_id = 'binder'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
