use diesel::prelude::*;
use serde::Serialize;

use crate::model::Deck;
use crate::schema::{cards, decks};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize)]
pub struct DeckSummary {
    pub deck: Deck,
    pub card_count: i64,
}

/// List every deck with the number of cards it holds. Zero decks is a
/// valid result, not an error. Callers that want the list to stay
/// current hold a [`Store::subscribe`] receiver and re-run this on each
/// event.
pub fn list_decks(store: &Store) -> Result<Vec<DeckSummary>, StoreError> {
    let mut conn = store.conn()?;

    let all_decks = decks::table
        .select(Deck::as_select())
        .load::<Deck>(&mut conn)?;

    let mut summaries = Vec::with_capacity(all_decks.len());
    for deck in all_decks {
        let card_count = cards::table
            .filter(cards::deck_id.eq(deck.deck_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        summaries.push(DeckSummary { deck, card_count });
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::import_deck;

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashdeck.db");
        let store = Store::open(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_list_decks_empty_store() {
        let (_dir, store) = test_store();
        assert!(list_decks(&store).unwrap().is_empty());
    }

    #[test]
    fn test_card_counts_track_imports() {
        let (_dir, store) = test_store();

        let first = import_deck(
            &store,
            r#"{ "title": "Capitals", "cards": [
                {"front":"France","back":"Paris"},
                {"front":"Japan","back":"Tokyo"}
            ] }"#,
        )
        .unwrap();
        let second = import_deck(
            &store,
            r#"{ "title": "Numbers", "cards": [
                {"front":"one","back":"1"},
                {"front":"two","back":"2"},
                {"front":"three","back":"3"}
            ] }"#,
        )
        .unwrap();

        let summaries = list_decks(&store).unwrap();
        assert_eq!(summaries.len(), 2);

        let capitals = summaries
            .iter()
            .find(|s| s.deck.deck_id == first)
            .unwrap();
        assert_eq!(capitals.deck.title, "Capitals");
        assert_eq!(capitals.card_count, 2);

        let numbers = summaries
            .iter()
            .find(|s| s.deck.deck_id == second)
            .unwrap();
        assert_eq!(numbers.deck.title, "Numbers");
        assert_eq!(numbers.card_count, 3);
    }
}
