use diesel::prelude::*;
use rand::seq::SliceRandom;

use crate::model::{Card, Deck};
use crate::schema::{cards, decks};
use crate::store::{Store, StoreError};

/// Where a study session currently stands.
///
/// `Loading` is transient, not an error: the target deck or its cards
/// have not been fetched yet (or the deck id does not resolve yet).
/// `EmptyDeck` and `Complete` are terminal until a restart or retarget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    EmptyDeck,
    Active { position: usize, revealed: bool },
    Complete { total: usize },
}

/// One run through a shuffled ordering of a deck's cards.
///
/// The session reads a snapshot of the deck at load time and never
/// writes; each entry into `Active` draws a fresh uniform permutation.
pub struct StudySession {
    deck_id: i32,
    deck: Option<Deck>,
    cards: Vec<Card>,
    state: SessionState,
}

impl StudySession {
    /// Open a session on the given deck and perform the initial load.
    pub fn open(store: &Store, deck_id: i32) -> Result<StudySession, StoreError> {
        let mut session = StudySession {
            deck_id,
            deck: None,
            cards: Vec::new(),
            state: SessionState::Loading,
        };
        session.reload(store)?;
        Ok(session)
    }

    /// Fetch the deck and its cards, then shuffle into a fresh ordering.
    ///
    /// Stays in `Loading` while the deck row cannot be found. Reactive
    /// callers re-run this when the store reports a change.
    pub fn reload(&mut self, store: &Store) -> Result<(), StoreError> {
        let mut conn = store.conn()?;

        let deck = decks::table
            .filter(decks::deck_id.eq(self.deck_id))
            .select(Deck::as_select())
            .first::<Deck>(&mut conn)
            .optional()?;

        let deck = match deck {
            Some(deck) => deck,
            None => {
                self.state = SessionState::Loading;
                return Ok(());
            }
        };

        let mut fetched = cards::table
            .filter(cards::deck_id.eq(self.deck_id))
            .order(cards::card_id.asc())
            .select(Card::as_select())
            .load::<Card>(&mut conn)?;

        self.deck = Some(deck);

        if fetched.is_empty() {
            self.cards = fetched;
            self.state = SessionState::EmptyDeck;
            return Ok(());
        }

        // Fisher-Yates via rand; every ordering equiprobable
        fetched.shuffle(&mut rand::thread_rng());
        self.cards = fetched;
        self.state = SessionState::Active {
            position: 0,
            revealed: false,
        };

        Ok(())
    }

    /// Toggle the back face at the current position. Independent of
    /// advancing; a no-op outside `Active`.
    pub fn reveal(&mut self) {
        if let SessionState::Active { position, revealed } = self.state {
            self.state = SessionState::Active {
                position,
                revealed: !revealed,
            };
        }
    }

    /// Move to the next card, hiding the back face again. Advancing past
    /// the last card completes the session.
    pub fn advance(&mut self) {
        if let SessionState::Active { position, .. } = self.state {
            if position + 1 < self.cards.len() {
                self.state = SessionState::Active {
                    position: position + 1,
                    revealed: false,
                };
            } else {
                self.state = SessionState::Complete {
                    total: self.cards.len(),
                };
            }
        }
    }

    /// Study the same deck again: redraws the shuffle and starts over.
    pub fn restart(&mut self) {
        if let SessionState::Complete { .. } = self.state {
            self.cards.shuffle(&mut rand::thread_rng());
            self.state = SessionState::Active {
                position: 0,
                revealed: false,
            };
        }
    }

    /// Retarget the session to another deck. Drops the snapshot and all
    /// transient state so nothing leaks from the previous deck; call
    /// [`StudySession::reload`] afterwards.
    pub fn set_deck(&mut self, deck_id: i32) {
        self.deck_id = deck_id;
        self.deck = None;
        self.cards.clear();
        self.state = SessionState::Loading;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    /// The card at the current position while `Active`.
    pub fn current_card(&self) -> Option<&Card> {
        match self.state {
            SessionState::Active { position, .. } => self.cards.get(position),
            _ => None,
        }
    }

    /// 1-based position and total, for a "Card i of n" display.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self.state {
            SessionState::Active { position, .. } => Some((position + 1, self.cards.len())),
            _ => None,
        }
    }
}
