//! Deck storage (user zone)

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::models::{Deck, DeckCardWithDetails, DeckFolder, DeckSlotType, DeckWithCardCount};

use super::card_repository::SqliteCardRepository;

/// Default deck folders created on first run.
const DEFAULT_DECK_FOLDERS: [(&str, &str, i64); 4] = [
    ("singles", "Singles", 0),
    ("tornado", "Tornado", 1),
    ("trios", "Trios", 2),
    ("tag", "Tag", 3),
];

/// Main-deck slots are numbered 1 through 30.
pub const DECK_SLOT_MIN: i64 = 1;
pub const DECK_SLOT_MAX: i64 = 30;

/// Trait for deck storage operations
pub trait DeckRepository {
    /// All deck folders by display order
    fn deck_folders(&self) -> Result<Vec<DeckFolder>>;

    /// Deck folder by id
    fn deck_folder(&self, id: &str) -> Result<Option<DeckFolder>>;

    /// Insert or replace a deck folder
    fn save_deck_folder(&self, folder: &DeckFolder) -> Result<()>;

    /// Delete a non-default deck folder; decks and slots cascade
    fn delete_deck_folder(&self, id: &str) -> Result<()>;

    /// Create the default deck folders if missing
    fn ensure_default_deck_folders(&self) -> Result<()>;

    /// Decks in a folder, most recently modified first
    fn decks_in_folder(&self, folder_id: &str) -> Result<Vec<Deck>>;

    /// Decks in a folder with their populated slot counts
    fn decks_with_card_count(&self, folder_id: &str) -> Result<Vec<DeckWithCardCount>>;

    /// Deck by id
    fn deck(&self, id: &str) -> Result<Option<Deck>>;

    /// Insert or replace a deck
    fn save_deck(&self, deck: &Deck) -> Result<()>;

    /// Delete a deck and its slots
    fn delete_deck(&self, id: &str) -> Result<()>;

    /// Assign the entrance slot
    fn set_entrance(&self, deck_id: &str, card_uuid: &str) -> Result<()>;

    /// Assign the competitor slot
    fn set_competitor(&self, deck_id: &str, card_uuid: &str) -> Result<()>;

    /// Assign a main-deck slot; slot numbers outside 1-30 are rejected
    fn set_deck_card(&self, deck_id: &str, card_uuid: &str, slot_number: i64) -> Result<()>;

    /// Append a finish card past the current highest finish slot
    fn add_finish(&self, deck_id: &str, card_uuid: &str) -> Result<()>;

    /// Append an alternate card past the current highest alternate slot
    fn add_alternate(&self, deck_id: &str, card_uuid: &str) -> Result<()>;

    /// Remove a single slot assignment
    fn remove_card(&self, deck_id: &str, slot_type: DeckSlotType, slot_number: i64) -> Result<()>;

    /// Remove every slot assignment from a deck
    fn clear_deck(&self, deck_id: &str) -> Result<()>;

    /// Slots joined against the catalog, ordered by slot type then number
    fn cards_in_deck(&self, deck_id: &str) -> Result<Vec<DeckCardWithDetails>>;

    /// Populated slot count (orphaned rows included)
    fn card_count(&self, deck_id: &str) -> Result<i64>;
}

/// `SQLite` implementation of `DeckRepository`
pub struct SqliteDeckRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteDeckRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_deck_folder(row: &Row<'_>) -> rusqlite::Result<DeckFolder> {
        Ok(DeckFolder {
            id: row.get(0)?,
            name: row.get(1)?,
            is_default: row.get::<_, i64>(2)? != 0,
            display_order: row.get(3)?,
        })
    }

    fn parse_deck(row: &Row<'_>) -> rusqlite::Result<Deck> {
        let spectacle: String = row.get(3)?;
        Ok(Deck {
            id: row.get(0)?,
            folder_id: row.get(1)?,
            name: row.get(2)?,
            spectacle_type: spectacle.parse().unwrap_or_default(),
            created_at: row.get(4)?,
            modified_at: row.get(5)?,
        })
    }

    /// Every slot write refreshes the parent deck's modified timestamp.
    fn touch_deck(&self, deck_id: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "UPDATE decks SET modified_at = ? WHERE id = ?",
            params![now, deck_id],
        )?;
        Ok(())
    }

    /// Run `f` inside a savepoint so a slot write and its parent deck's
    /// timestamp update land together or not at all.
    fn with_slot_savepoint(&self, f: impl FnOnce() -> Result<()>) -> Result<()> {
        self.conn.execute_batch("SAVEPOINT slot_write")?;
        match f() {
            Ok(()) => {
                self.conn.execute_batch("RELEASE slot_write")?;
                Ok(())
            }
            Err(e) => {
                let _ = self
                    .conn
                    .execute_batch("ROLLBACK TO slot_write; RELEASE slot_write");
                Err(e)
            }
        }
    }

    fn set_slot(
        &self,
        deck_id: &str,
        card_uuid: &str,
        slot_type: DeckSlotType,
        slot_number: i64,
    ) -> Result<()> {
        self.with_slot_savepoint(|| {
            self.conn.execute(
                "INSERT OR REPLACE INTO deck_cards (deck_id, card_uuid, slot_type, slot_number)
                 VALUES (?, ?, ?, ?)",
                params![deck_id, card_uuid, slot_type.as_str(), slot_number],
            )?;
            self.touch_deck(deck_id)
        })
    }

    fn append_slot(&self, deck_id: &str, card_uuid: &str, slot_type: DeckSlotType) -> Result<()> {
        let max_slot: Option<i64> = self
            .conn
            .query_row(
                "SELECT MAX(slot_number) FROM deck_cards WHERE deck_id = ? AND slot_type = ?",
                params![deck_id, slot_type.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        self.set_slot(deck_id, card_uuid, slot_type, max_slot.unwrap_or(0) + 1)
    }
}

impl DeckRepository for SqliteDeckRepository<'_> {
    fn deck_folders(&self) -> Result<Vec<DeckFolder>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_default, display_order FROM deck_folders ORDER BY display_order",
        )?;
        let folders = stmt
            .query_map([], Self::parse_deck_folder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    fn deck_folder(&self, id: &str) -> Result<Option<DeckFolder>> {
        let result = self.conn.query_row(
            "SELECT id, name, is_default, display_order FROM deck_folders WHERE id = ?",
            [id],
            Self::parse_deck_folder,
        );

        match result {
            Ok(folder) => Ok(Some(folder)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_deck_folder(&self, folder: &DeckFolder) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO deck_folders (id, name, is_default, display_order)
             VALUES (?, ?, ?, ?)",
            params![
                folder.id,
                folder.name,
                i64::from(folder.is_default),
                folder.display_order
            ],
        )?;
        Ok(())
    }

    fn delete_deck_folder(&self, id: &str) -> Result<()> {
        if let Some(folder) = self.deck_folder(id)? {
            if folder.is_default {
                return Err(Error::DefaultFolderProtected);
            }
        }
        let rows = self
            .conn
            .execute("DELETE FROM deck_folders WHERE id = ?", [id])?;
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn ensure_default_deck_folders(&self) -> Result<()> {
        for (id, name, order) in DEFAULT_DECK_FOLDERS {
            if self.deck_folder(id)?.is_none() {
                self.conn.execute(
                    "INSERT INTO deck_folders (id, name, is_default, display_order)
                     VALUES (?, ?, 1, ?)",
                    params![id, name, order],
                )?;
                tracing::debug!(folder = name, "Created default deck folder");
            }
        }
        Ok(())
    }

    fn decks_in_folder(&self, folder_id: &str) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, folder_id, name, spectacle_type, created_at, modified_at
             FROM decks
             WHERE folder_id = ?
             ORDER BY modified_at DESC",
        )?;
        let decks = stmt
            .query_map([folder_id], Self::parse_deck)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(decks)
    }

    fn decks_with_card_count(&self, folder_id: &str) -> Result<Vec<DeckWithCardCount>> {
        self.decks_in_folder(folder_id)?
            .into_iter()
            .map(|deck| {
                let card_count = self.card_count(&deck.id)?;
                Ok(DeckWithCardCount { deck, card_count })
            })
            .collect()
    }

    fn deck(&self, id: &str) -> Result<Option<Deck>> {
        let result = self.conn.query_row(
            "SELECT id, folder_id, name, spectacle_type, created_at, modified_at
             FROM decks WHERE id = ?",
            [id],
            Self::parse_deck,
        );

        match result {
            Ok(deck) => Ok(Some(deck)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_deck(&self, deck: &Deck) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO decks
             (id, folder_id, name, spectacle_type, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                deck.id,
                deck.folder_id,
                deck.name,
                deck.spectacle_type.as_str(),
                deck.created_at,
                deck.modified_at
            ],
        )?;
        Ok(())
    }

    fn delete_deck(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM deck_cards WHERE deck_id = ?", [id])?;
        let rows = self.conn.execute("DELETE FROM decks WHERE id = ?", [id])?;
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_entrance(&self, deck_id: &str, card_uuid: &str) -> Result<()> {
        self.set_slot(deck_id, card_uuid, DeckSlotType::Entrance, 0)
    }

    fn set_competitor(&self, deck_id: &str, card_uuid: &str) -> Result<()> {
        self.set_slot(deck_id, card_uuid, DeckSlotType::Competitor, 0)
    }

    fn set_deck_card(&self, deck_id: &str, card_uuid: &str, slot_number: i64) -> Result<()> {
        if !(DECK_SLOT_MIN..=DECK_SLOT_MAX).contains(&slot_number) {
            return Err(Error::InvalidSlot(slot_number));
        }
        self.set_slot(deck_id, card_uuid, DeckSlotType::Deck, slot_number)
    }

    fn add_finish(&self, deck_id: &str, card_uuid: &str) -> Result<()> {
        self.append_slot(deck_id, card_uuid, DeckSlotType::Finish)
    }

    fn add_alternate(&self, deck_id: &str, card_uuid: &str) -> Result<()> {
        self.append_slot(deck_id, card_uuid, DeckSlotType::Alternate)
    }

    fn remove_card(&self, deck_id: &str, slot_type: DeckSlotType, slot_number: i64) -> Result<()> {
        self.with_slot_savepoint(|| {
            self.conn.execute(
                "DELETE FROM deck_cards WHERE deck_id = ? AND slot_type = ? AND slot_number = ?",
                params![deck_id, slot_type.as_str(), slot_number],
            )?;
            self.touch_deck(deck_id)
        })
    }

    fn clear_deck(&self, deck_id: &str) -> Result<()> {
        self.with_slot_savepoint(|| {
            self.conn
                .execute("DELETE FROM deck_cards WHERE deck_id = ?", [deck_id])?;
            self.touch_deck(deck_id)
        })
    }

    fn cards_in_deck(&self, deck_id: &str) -> Result<Vec<DeckCardWithDetails>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.db_uuid, c.name, c.card_type, c.rules_text, c.errata_text, c.is_banned,
                    c.release_set, c.srg_url, c.srgpc_url, c.comments, c.tags, c.power,
                    c.agility, c.strike, c.submission, c.grapple, c.technique, c.division,
                    c.gender, c.deck_card_number, c.atk_type, c.play_order, c.synced_at,
                    dc.slot_type, dc.slot_number
             FROM deck_cards dc
             INNER JOIN cards c ON c.db_uuid = dc.card_uuid
             WHERE dc.deck_id = ?
             ORDER BY dc.slot_type, dc.slot_number",
        )?;

        let entries = stmt
            .query_map([deck_id], |row| {
                let slot_type: String = row.get(23)?;
                Ok(DeckCardWithDetails {
                    card: SqliteCardRepository::parse_card(row)?,
                    slot_type: slot_type.parse().unwrap_or(DeckSlotType::Deck),
                    slot_number: row.get(24)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn card_count(&self, deck_id: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM deck_cards WHERE deck_id = ?",
            [deck_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
