//! Schema creation and upgrade

use rusqlite::Connection;

use crate::error::Result;

/// Create any missing tables and indexes.
///
/// Idempotent and safe on every startup: the bundled template ships only the
/// catalog zone, so the user-zone tables are created here on first open, and
/// older stores gain tables added in later releases without disturbing data.
///
/// User-zone card references (`folder_cards.card_uuid`, `deck_cards.card_uuid`)
/// deliberately carry no foreign key into `cards`: a catalog sync that drops an
/// identifier must orphan those rows, not cascade them away.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cards (
            db_uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            card_type TEXT NOT NULL,
            rules_text TEXT,
            errata_text TEXT,
            is_banned INTEGER NOT NULL DEFAULT 0,
            release_set TEXT,
            srg_url TEXT,
            srgpc_url TEXT,
            comments TEXT,
            tags TEXT,
            power INTEGER,
            agility INTEGER,
            strike INTEGER,
            submission INTEGER,
            grapple INTEGER,
            technique INTEGER,
            division TEXT,
            gender TEXT,
            deck_card_number INTEGER,
            atk_type TEXT,
            play_order TEXT,
            synced_at INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_cards_name ON cards(name);
        CREATE INDEX IF NOT EXISTS idx_cards_type ON cards(card_type);

        CREATE TABLE IF NOT EXISTS card_related_finishes (
            card_uuid TEXT NOT NULL,
            finish_uuid TEXT NOT NULL,
            PRIMARY KEY (card_uuid, finish_uuid)
        );

        CREATE TABLE IF NOT EXISTS card_related_cards (
            card_uuid TEXT NOT NULL,
            related_uuid TEXT NOT NULL,
            PRIMARY KEY (card_uuid, related_uuid)
        );

        CREATE TABLE IF NOT EXISTS folders (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS folder_cards (
            folder_id TEXT NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
            card_uuid TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            added_at INTEGER NOT NULL,
            PRIMARY KEY (folder_id, card_uuid)
        );
        CREATE INDEX IF NOT EXISTS idx_folder_cards_card ON folder_cards(card_uuid);

        CREATE TABLE IF NOT EXISTS deck_folders (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            is_default INTEGER NOT NULL DEFAULT 0,
            display_order INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS decks (
            id TEXT PRIMARY KEY,
            folder_id TEXT NOT NULL REFERENCES deck_folders(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            spectacle_type TEXT NOT NULL DEFAULT 'VALIANT',
            created_at INTEGER NOT NULL,
            modified_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_decks_folder ON decks(folder_id);

        CREATE TABLE IF NOT EXISTS deck_cards (
            deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
            card_uuid TEXT NOT NULL,
            slot_type TEXT NOT NULL,
            slot_number INTEGER NOT NULL,
            PRIMARY KEY (deck_id, slot_type, slot_number)
        );
        CREATE INDEX IF NOT EXISTS idx_deck_cards_deck ON deck_cards(deck_id);",
    )?;

    Ok(())
}

/// Table names of the catalog zone, in dependents-first deletion order.
pub const CATALOG_TABLES: [&str; 3] = ["card_related_finishes", "card_related_cards", "cards"];

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            != 0
    }

    #[test]
    fn test_ensure_schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        for table in [
            "cards",
            "card_related_finishes",
            "card_related_cards",
            "folders",
            "folder_cards",
            "deck_folders",
            "decks",
            "deck_cards",
        ] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_ensure_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO folders (id, name, is_default, display_order, created_at)
             VALUES ('owned', 'Owned', 1, 0, 0)",
            [],
        )
        .unwrap();

        ensure_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM folders", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_ensure_schema_adds_missing_user_tables() {
        // Simulates an older template that shipped only the catalog zone.
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE cards (db_uuid TEXT PRIMARY KEY, name TEXT NOT NULL,
             card_type TEXT NOT NULL, rules_text TEXT, errata_text TEXT,
             is_banned INTEGER NOT NULL DEFAULT 0, release_set TEXT, srg_url TEXT,
             srgpc_url TEXT, comments TEXT, tags TEXT, power INTEGER, agility INTEGER,
             strike INTEGER, submission INTEGER, grapple INTEGER, technique INTEGER,
             division TEXT, gender TEXT, deck_card_number INTEGER, atk_type TEXT,
             play_order TEXT, synced_at INTEGER NOT NULL DEFAULT 0)",
        )
        .unwrap();

        ensure_schema(&conn).unwrap();
        assert!(table_exists(&conn, "deck_cards"));
    }
}
