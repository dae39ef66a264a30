//! Catalog read access
//!
//! The catalog zone is read-only from the application's point of view; the
//! only writer is the sync engine's merge transaction.

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use crate::error::Result;
use crate::models::{Card, CardType};

/// Column list shared by every card select; order matches the table schema.
pub(crate) const CARD_COLUMNS: &str = "db_uuid, name, card_type, rules_text, errata_text, is_banned, \
     release_set, srg_url, srgpc_url, comments, tags, power, agility, strike, submission, \
     grapple, technique, division, gender, deck_card_number, atk_type, play_order, synced_at";

/// Independently optional, parameterized search predicates.
///
/// Every value is bound, never concatenated; the free-text term searches both
/// name and rules text with a wildcard LIKE.
#[derive(Debug, Clone, Default)]
pub struct CardQuery {
    pub text: Option<String>,
    pub card_type: Option<CardType>,
    pub atk_type: Option<String>,
    pub play_order: Option<String>,
    pub division: Option<String>,
    pub release_set: Option<String>,
    pub banned: Option<bool>,
}

impl CardQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub const fn card_type(mut self, card_type: CardType) -> Self {
        self.card_type = Some(card_type);
        self
    }

    #[must_use]
    pub fn division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    #[must_use]
    pub const fn banned(mut self, banned: bool) -> Self {
        self.banned = Some(banned);
        self
    }

    /// Build the WHERE clause fragments and their bound values.
    fn predicates(&self) -> (Vec<&'static str>, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            clauses.push("(name LIKE '%' || ? || '%' OR rules_text LIKE '%' || ? || '%')");
            params.push(Value::Text(text.to_string()));
            params.push(Value::Text(text.to_string()));
        }
        if let Some(card_type) = self.card_type {
            clauses.push("card_type = ?");
            params.push(Value::Text(card_type.as_str().to_string()));
        }
        if let Some(atk_type) = &self.atk_type {
            clauses.push("atk_type = ?");
            params.push(Value::Text(atk_type.clone()));
        }
        if let Some(play_order) = &self.play_order {
            clauses.push("play_order = ?");
            params.push(Value::Text(play_order.clone()));
        }
        if let Some(division) = &self.division {
            clauses.push("division = ?");
            params.push(Value::Text(division.clone()));
        }
        if let Some(release_set) = &self.release_set {
            clauses.push("release_set = ?");
            params.push(Value::Text(release_set.clone()));
        }
        if let Some(banned) = self.banned {
            clauses.push("is_banned = ?");
            params.push(Value::Integer(i64::from(banned)));
        }

        (clauses, params)
    }
}

/// Trait for catalog read operations
pub trait CardRepository {
    /// Point lookup by stable identifier
    fn get(&self, uuid: &str) -> Result<Option<Card>>;

    /// First card matching `name` exactly (case-insensitive)
    fn get_by_name(&self, name: &str) -> Result<Option<Card>>;

    /// Filtered search, ordered by name ascending, capped at `limit` rows
    fn search(&self, query: &CardQuery, limit: usize) -> Result<Vec<Card>>;

    /// Distinct card type discriminants present in the catalog
    fn card_types(&self) -> Result<Vec<String>>;

    /// Distinct competitor divisions present in the catalog
    fn divisions(&self) -> Result<Vec<String>>;

    /// Distinct release sets present in the catalog
    fn release_sets(&self) -> Result<Vec<String>>;

    /// Total catalog row count
    fn count(&self) -> Result<i64>;

    /// Snapshot timestamp of the newest row, if any
    fn last_synced_at(&self) -> Result<Option<i64>>;
}

/// `SQLite` implementation of `CardRepository`
pub struct SqliteCardRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCardRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a card from a database row laid out as `CARD_COLUMNS`.
    pub(crate) fn parse_card(row: &Row<'_>) -> rusqlite::Result<Card> {
        Ok(Card {
            uuid: row.get(0)?,
            name: row.get(1)?,
            card_type: row.get(2)?,
            rules_text: row.get(3)?,
            errata_text: row.get(4)?,
            is_banned: row.get::<_, i64>(5)? != 0,
            release_set: row.get(6)?,
            srg_url: row.get(7)?,
            srgpc_url: row.get(8)?,
            comments: row.get(9)?,
            tags: row.get(10)?,
            power: row.get(11)?,
            agility: row.get(12)?,
            strike: row.get(13)?,
            submission: row.get(14)?,
            grapple: row.get(15)?,
            technique: row.get(16)?,
            division: row.get(17)?,
            gender: row.get(18)?,
            deck_card_number: row.get(19)?,
            atk_type: row.get(20)?,
            play_order: row.get(21)?,
            synced_at: row.get(22)?,
        })
    }

    fn distinct_column(&self, column: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT {column} FROM cards WHERE {column} IS NOT NULL ORDER BY {column}"
        ))?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn get(&self, uuid: &str) -> Result<Option<Card>> {
        let result = self.conn.query_row(
            &format!("SELECT {CARD_COLUMNS} FROM cards WHERE db_uuid = ?"),
            [uuid],
            Self::parse_card,
        );

        match result {
            Ok(card) => Ok(Some(card)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_by_name(&self, name: &str) -> Result<Option<Card>> {
        let result = self.conn.query_row(
            &format!("SELECT {CARD_COLUMNS} FROM cards WHERE name LIKE ? ORDER BY name LIMIT 1"),
            [name],
            Self::parse_card,
        );

        match result {
            Ok(card) => Ok(Some(card)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn search(&self, query: &CardQuery, limit: usize) -> Result<Vec<Card>> {
        let (clauses, mut params) = query.predicates();

        let mut sql = format!("SELECT {CARD_COLUMNS} FROM cards");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY name ASC LIMIT ?");
        params.push(Value::Integer(limit as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params_from_iter(params), Self::parse_card)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    fn card_types(&self) -> Result<Vec<String>> {
        self.distinct_column("card_type")
    }

    fn divisions(&self) -> Result<Vec<String>> {
        self.distinct_column("division")
    }

    fn release_sets(&self) -> Result<Vec<String>> {
        self.distinct_column("release_set")
    }

    fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
        Ok(count)
    }

    fn last_synced_at(&self) -> Result<Option<i64>> {
        let value = self
            .conn
            .query_row("SELECT MAX(synced_at) FROM cards", [], |row| row.get(0))?;
        Ok(value)
    }
}
