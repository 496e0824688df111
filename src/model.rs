use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::schema::{cards, decks};

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = decks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Deck {
    pub deck_id: i32,
    pub title: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = cards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Card {
    pub card_id: i32,
    pub deck_id: i32,
    pub front: String,
    pub back: String,
}

#[derive(Insertable)]
#[diesel(table_name = decks)]
pub struct NewDeck<'a> {
    pub title: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = cards)]
pub struct NewCard<'a> {
    pub deck_id: i32,
    pub front: &'a str,
    pub back: &'a str,
}
