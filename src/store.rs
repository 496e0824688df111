use std::sync::{Mutex, mpsc};

use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use thiserror::Error;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

// Single fixed schema, bootstrapped on open. AUTOINCREMENT keeps rowids
// from ever being reused, so deck and card ids stay unique for the
// lifetime of the store file.
const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS decks (
        deck_id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
        card_id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_id INTEGER NOT NULL REFERENCES decks(deck_id),
        front TEXT NOT NULL,
        back TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_cards_deck_id ON cards(deck_id);
"#;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// A write against either collection, broadcast to subscribers so open
/// views can re-read without polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    DecksChanged,
    CardsChanged,
}

/// Handle to the embedded record store backing decks and cards.
///
/// Constructed explicitly and passed to the operations that need it;
/// there is no global instance.
pub struct Store {
    pool: DbPool,
    subscribers: Mutex<Vec<mpsc::Sender<StoreEvent>>>,
}

impl Store {
    /// Open (or create) the store at the given SQLite database path.
    pub fn open(database_path: &str) -> Result<Store, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_path);
        let pool = Pool::builder().build(manager)?;

        let mut conn = pool.get()?;
        conn.batch_execute(SCHEMA_SQL)?;

        Ok(Store {
            pool,
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn conn(&self) -> Result<DbConnection, StoreError> {
        Ok(self.pool.get()?)
    }

    /// Register a change observer. Each write broadcasts the affected
    /// collection to every live receiver.
    pub fn subscribe(&self) -> mpsc::Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    pub(crate) fn notify(&self, event: StoreEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_bootstraps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashdeck.db");

        // Open twice: the second open must tolerate the existing tables
        let store = Store::open(path.to_str().unwrap()).unwrap();
        drop(store);
        Store::open(path.to_str().unwrap()).unwrap();
    }

    #[test]
    fn test_subscribe_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashdeck.db");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        let rx = store.subscribe();
        store.notify(StoreEvent::DecksChanged);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::DecksChanged);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashdeck.db");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        drop(store.subscribe());
        store.notify(StoreEvent::CardsChanged);
        assert!(store.subscribers.lock().unwrap().is_empty());
    }
}
