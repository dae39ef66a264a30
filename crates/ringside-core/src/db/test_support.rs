//! Shared fixtures for repository tests

use rusqlite::{params, Connection};

use crate::models::Card;

/// Minimal card with the given identity; stats left NULL.
pub fn test_card(uuid: &str, name: &str, card_type: &str) -> Card {
    Card {
        uuid: uuid.to_string(),
        name: name.to_string(),
        card_type: card_type.to_string(),
        rules_text: None,
        errata_text: None,
        is_banned: false,
        release_set: None,
        srg_url: None,
        srgpc_url: None,
        comments: None,
        tags: None,
        power: None,
        agility: None,
        strike: None,
        submission: None,
        grapple: None,
        technique: None,
        division: None,
        gender: None,
        deck_card_number: None,
        atk_type: None,
        play_order: None,
        synced_at: 1,
    }
}

/// Insert a card directly, bypassing the sync engine.
pub fn insert_card(conn: &Connection, card: &Card) {
    conn.execute(
        "INSERT INTO cards (db_uuid, name, card_type, rules_text, errata_text, is_banned,
             release_set, srg_url, srgpc_url, comments, tags, power, agility, strike,
             submission, grapple, technique, division, gender, deck_card_number, atk_type,
             play_order, synced_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            card.uuid,
            card.name,
            card.card_type,
            card.rules_text,
            card.errata_text,
            i64::from(card.is_banned),
            card.release_set,
            card.srg_url,
            card.srgpc_url,
            card.comments,
            card.tags,
            card.power,
            card.agility,
            card.strike,
            card.submission,
            card.grapple,
            card.technique,
            card.division,
            card.gender,
            card.deck_card_number,
            card.atk_type,
            card.play_order,
            card.synced_at
        ],
    )
    .unwrap();
}
