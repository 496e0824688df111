//! Core of a single-user flashcard study app: import decks from JSON
//! documents, list them with card counts, and run shuffled study
//! sessions, all against an embedded SQLite record store.
//!
//! The presentation layer is an external collaborator: it constructs a
//! [`Store`], calls [`import_deck`] and [`list_decks`], opens a
//! [`StudySession`] per deck, and re-reads on [`Store::subscribe`]
//! events. This crate exposes no CLI and no network surface.

pub mod catalog;
pub mod import;
pub mod model;
pub mod schema;
pub mod session;
pub mod store;

pub use catalog::{DeckSummary, list_decks};
pub use import::{ImportError, import_deck};
pub use model::{Card, Deck};
pub use session::{SessionState, StudySession};
pub use store::{Store, StoreError, StoreEvent};
