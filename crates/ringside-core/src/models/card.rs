//! Card catalog models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The seven card type discriminants published by the catalog.
///
/// `Card::card_type` stays a plain string so rows with discriminants added
/// server-side after this build still round-trip through the store; this enum
/// exists for filters and type-driven UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Entrance,
    SingleCompetitor,
    TornadoCompetitor,
    TrioCompetitor,
    MainDeck,
    Spectacle,
    CrowdMeter,
}

impl CardType {
    /// Wire/database representation of this card type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entrance => "EntranceCard",
            Self::SingleCompetitor => "SingleCompetitorCard",
            Self::TornadoCompetitor => "TornadoCompetitorCard",
            Self::TrioCompetitor => "TrioCompetitorCard",
            Self::MainDeck => "MainDeckCard",
            Self::Spectacle => "SpectacleCard",
            Self::CrowdMeter => "CrowdMeterCard",
        }
    }

    /// All known card types, in display order.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Entrance,
            Self::SingleCompetitor,
            Self::TornadoCompetitor,
            Self::TrioCompetitor,
            Self::MainDeck,
            Self::Spectacle,
            Self::CrowdMeter,
        ]
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EntranceCard" => Ok(Self::Entrance),
            "SingleCompetitorCard" => Ok(Self::SingleCompetitor),
            "TornadoCompetitorCard" => Ok(Self::TornadoCompetitor),
            "TrioCompetitorCard" => Ok(Self::TrioCompetitor),
            "MainDeckCard" => Ok(Self::MainDeck),
            "SpectacleCard" => Ok(Self::Spectacle),
            "CrowdMeterCard" => Ok(Self::CrowdMeter),
            other => Err(format!("unknown card type: {other}")),
        }
    }
}

/// A card from the published catalog.
///
/// Immutable from the sync engine's perspective except via full replacement.
/// `uuid` is stable across catalog versions, so user-zone rows keep pointing
/// at the same card after an update as long as the new catalog still carries
/// that identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Stable catalog identifier (`db_uuid` column)
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Card type discriminant, e.g. `MainDeckCard`
    pub card_type: String,
    pub rules_text: Option<String>,
    pub errata_text: Option<String>,
    pub is_banned: bool,
    pub release_set: Option<String>,
    pub srg_url: Option<String>,
    pub srgpc_url: Option<String>,
    pub comments: Option<String>,
    /// Comma-separated tag list as published
    pub tags: Option<String>,

    // Competitor-only stats
    pub power: Option<i64>,
    pub agility: Option<i64>,
    pub strike: Option<i64>,
    pub submission: Option<i64>,
    pub grapple: Option<i64>,
    pub technique: Option<i64>,
    pub division: Option<String>,
    pub gender: Option<String>,

    // Main-deck-only metadata
    pub deck_card_number: Option<i64>,
    pub atk_type: Option<String>,
    pub play_order: Option<String>,

    /// Unix millis of the catalog snapshot this row came from
    pub synced_at: i64,
}

impl Card {
    /// Parsed card type, if the discriminant is one of the known seven.
    #[must_use]
    pub fn kind(&self) -> Option<CardType> {
        self.card_type.parse().ok()
    }

    /// Whether this card is any competitor variant.
    #[must_use]
    pub fn is_competitor(&self) -> bool {
        self.card_type.contains("Competitor")
    }

    /// Whether this card goes into the 30-slot main deck.
    #[must_use]
    pub fn is_main_deck(&self) -> bool {
        self.card_type == CardType::MainDeck.as_str()
    }

    /// Tags split out of the comma-separated column.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Edge row linking a card to one of its finish variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRelatedFinish {
    pub card_uuid: String,
    pub finish_uuid: String,
}

/// Edge row linking a card to a related card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRelatedCard {
    pub card_uuid: String,
    pub related_uuid: String,
}
