use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use serde_json::Value;
use thiserror::Error;

use crate::model::{NewCard, NewDeck};
use crate::schema::{cards, decks};
use crate::store::{Store, StoreError, StoreEvent};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    MalformedInput(#[from] serde_json::Error),
    #[error("Invalid JSON structure. Expected {{ title, cards }}.")]
    InvalidSchema,
    #[error("No cards found in the deck.")]
    EmptyDeck,
    #[error("Each card must have 'front' and 'back' properties.")]
    InvalidCard,
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct ParsedDeck {
    title: String,
    cards: Vec<(String, String)>,
}

/// Import an externally supplied deck document.
///
/// Validates the whole document before anything is written: a rejected
/// document leaves the store untouched. Returns the new deck's id.
pub fn import_deck(store: &Store, document: &str) -> Result<i32, ImportError> {
    let parsed = match parse_document(document) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Rejected deck import: {}", e);
            return Err(e);
        }
    };

    let deck_id = match persist(store, &parsed) {
        Ok(deck_id) => deck_id,
        Err(e) => {
            log::error!("Failed to persist deck '{}': {}", parsed.title, e);
            return Err(e.into());
        }
    };

    store.notify(StoreEvent::DecksChanged);
    store.notify(StoreEvent::CardsChanged);

    log::info!(
        "Imported deck '{}' with {} cards",
        parsed.title,
        parsed.cards.len()
    );

    Ok(deck_id)
}

// Validation order matters: parse, then shape, then emptiness, then the
// individual cards. The first failure wins and aborts the whole import.
fn parse_document(document: &str) -> Result<ParsedDeck, ImportError> {
    let data: Value = serde_json::from_str(document)?;

    let title = match data.get("title").and_then(Value::as_str) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => return Err(ImportError::InvalidSchema),
    };

    let entries = data
        .get("cards")
        .and_then(Value::as_array)
        .ok_or(ImportError::InvalidSchema)?;

    if entries.is_empty() {
        return Err(ImportError::EmptyDeck);
    }

    let mut cards = Vec::with_capacity(entries.len());
    for entry in entries {
        let front = entry.get("front").and_then(Value::as_str).unwrap_or("");
        let back = entry.get("back").and_then(Value::as_str).unwrap_or("");

        if front.is_empty() || back.is_empty() {
            return Err(ImportError::InvalidCard);
        }

        cards.push((front.to_string(), back.to_string()));
    }

    Ok(ParsedDeck { title, cards })
}

fn persist(store: &Store, deck: &ParsedDeck) -> Result<i32, StoreError> {
    let mut conn = store.conn()?;

    // One transaction for the deck row and its cards, so a reader never
    // observes a deck without its cards.
    let deck_id = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(decks::table)
            .values(NewDeck {
                title: &deck.title,
                created_at: Utc::now().naive_utc(),
            })
            .execute(conn)?;

        let deck_id = diesel::select(diesel::dsl::sql::<Integer>("last_insert_rowid()"))
            .get_result::<i32>(conn)?;

        let rows: Vec<NewCard> = deck
            .cards
            .iter()
            .map(|(front, back)| NewCard {
                deck_id,
                front,
                back,
            })
            .collect();

        diesel::insert_into(cards::table).values(&rows).execute(conn)?;

        Ok(deck_id)
    })?;

    Ok(deck_id)
}
