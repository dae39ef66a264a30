//! ringside-core - Core library for Ringside
//!
//! This crate contains the card catalog models, the local store, and the
//! sync engine that keeps the catalog and image cache consistent with the
//! published dataset without ever touching user-created data.

pub mod api;
pub mod db;
pub mod error;
pub mod images;
pub mod models;
pub mod state;
pub mod sync;

pub use error::{Error, Result};
pub use models::{Card, CardType, Deck, Folder};
