//! Data models for Ringside

mod card;
mod deck;
mod folder;
mod manifest;

pub use card::{Card, CardRelatedCard, CardRelatedFinish, CardType};
pub use deck::{
    Deck, DeckCard, DeckCardWithDetails, DeckFolder, DeckSlotType, DeckWithCardCount, SpectacleType,
};
pub use folder::{Folder, FolderCard};
pub use manifest::{CatalogManifest, ImageEntry, ImageManifest};
