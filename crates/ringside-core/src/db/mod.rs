//! Local store: connection management, schema, and repositories

pub mod card_repository;
pub mod collection_repository;
pub mod deck_repository;
pub mod schema;
pub mod store;

#[cfg(test)]
pub mod test_support;

pub use card_repository::{CardQuery, CardRepository, SqliteCardRepository};
pub use collection_repository::{CollectionRepository, FolderEntry, SqliteCollectionRepository};
pub use deck_repository::{DeckRepository, SqliteDeckRepository, DECK_SLOT_MAX, DECK_SLOT_MIN};
pub use store::Store;
