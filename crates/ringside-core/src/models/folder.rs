//! Collection folder models (user zone)

use serde::{Deserialize, Serialize};

/// A collection folder owning card memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub display_order: i64,
    /// Unix millis
    pub created_at: i64,
}

impl Folder {
    /// Create a custom (non-default) folder.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, display_order: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default: false,
            display_order,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Membership row: a card held in a folder with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCard {
    pub folder_id: String,
    pub card_uuid: String,
    pub quantity: i64,
    /// Unix millis
    pub added_at: i64,
}
