//! Deck models (user zone)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Card;

/// Spectacle side a deck is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SpectacleType {
    Newman,
    #[default]
    Valiant,
}

impl SpectacleType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newman => "NEWMAN",
            Self::Valiant => "VALIANT",
        }
    }
}

impl fmt::Display for SpectacleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectacleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEWMAN" => Ok(Self::Newman),
            "VALIANT" => Ok(Self::Valiant),
            other => Err(format!("unknown spectacle type: {other}")),
        }
    }
}

/// Slot zone a card occupies within a deck.
///
/// `Deck` slots are numbered 1-30; `Entrance` and `Competitor` use slot 0;
/// `Finish` and `Alternate` append monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeckSlotType {
    Entrance,
    Competitor,
    Deck,
    Finish,
    Alternate,
}

impl DeckSlotType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entrance => "ENTRANCE",
            Self::Competitor => "COMPETITOR",
            Self::Deck => "DECK",
            Self::Finish => "FINISH",
            Self::Alternate => "ALTERNATE",
        }
    }
}

impl fmt::Display for DeckSlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeckSlotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRANCE" => Ok(Self::Entrance),
            "COMPETITOR" => Ok(Self::Competitor),
            "DECK" => Ok(Self::Deck),
            "FINISH" => Ok(Self::Finish),
            "ALTERNATE" => Ok(Self::Alternate),
            other => Err(format!("unknown deck slot type: {other}")),
        }
    }
}

/// A grouping folder for decks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckFolder {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub display_order: i64,
}

/// A user-built deck within a deck folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub folder_id: String,
    pub name: String,
    pub spectacle_type: SpectacleType,
    /// Unix millis
    pub created_at: i64,
    /// Unix millis, touched by every slot write
    pub modified_at: i64,
}

impl Deck {
    /// Create a new deck in the given folder.
    #[must_use]
    pub fn new(folder_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: Uuid::now_v7().to_string(),
            folder_id: folder_id.into(),
            name: name.into(),
            spectacle_type: SpectacleType::default(),
            created_at: now,
            modified_at: now,
        }
    }
}

/// A card assignment to a deck slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCard {
    pub deck_id: String,
    pub card_uuid: String,
    pub slot_type: DeckSlotType,
    pub slot_number: i64,
}

/// Deck summary with its populated slot count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckWithCardCount {
    pub deck: Deck,
    pub card_count: i64,
}

/// Deck slot joined against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckCardWithDetails {
    pub card: Card,
    pub slot_type: DeckSlotType,
    pub slot_number: i64,
}
