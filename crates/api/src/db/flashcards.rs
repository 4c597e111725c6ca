//! Flashcard query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Flashcards;

/// Column order every flashcard select returns.
const FLASHCARD_COLUMNS: [Flashcards; 7] = [
    Flashcards::Id,
    Flashcards::UserId,
    Flashcards::Front,
    Flashcards::Back,
    Flashcards::IsPublic,
    Flashcards::CreatedAt,
    Flashcards::UpdatedAt,
];

/// Insert a flashcard.
pub fn insert(
    id: &str,
    user_id: &str,
    front: &str,
    back: &str,
    is_public: bool,
    now: &str,
) -> Built {
    Query::insert()
        .into_table(Flashcards::Table)
        .columns(FLASHCARD_COLUMNS)
        .values_panic([
            id.into(),
            user_id.into(),
            front.into(),
            back.into(),
            is_public.into(),
            now.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Find a flashcard by id.
pub fn get_by_id(id: &str) -> Built {
    Query::select()
        .columns(FLASHCARD_COLUMNS)
        .from(Flashcards::Table)
        .and_where(Expr::col(Flashcards::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// All flashcards of one owner, oldest first.
pub fn list_by_user(user_id: &str) -> Built {
    Query::select()
        .columns(FLASHCARD_COLUMNS)
        .from(Flashcards::Table)
        .and_where(Expr::col(Flashcards::UserId).eq(user_id))
        .order_by(Flashcards::CreatedAt, Order::Asc)
        .order_by(Flashcards::Id, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Public flashcards, optionally excluding one owner's cards.
pub fn list_public(exclude_user_id: Option<&str>) -> Built {
    let mut query = Query::select();
    query
        .columns(FLASHCARD_COLUMNS)
        .from(Flashcards::Table)
        .and_where(Expr::col(Flashcards::IsPublic).eq(true));
    if let Some(user_id) = exclude_user_id {
        query.and_where(Expr::col(Flashcards::UserId).ne(user_id));
    }
    query
        .order_by(Flashcards::CreatedAt, Order::Asc)
        .order_by(Flashcards::Id, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Update a flashcard, but only if `user_id` owns it.
pub fn update_owned(
    id: &str,
    user_id: &str,
    front: &str,
    back: &str,
    is_public: bool,
    now: &str,
) -> Built {
    Query::update()
        .table(Flashcards::Table)
        .value(Flashcards::Front, front)
        .value(Flashcards::Back, back)
        .value(Flashcards::IsPublic, is_public)
        .value(Flashcards::UpdatedAt, now)
        .and_where(Expr::col(Flashcards::Id).eq(id))
        .and_where(Expr::col(Flashcards::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Delete a flashcard by id. Ownership is checked by the caller.
pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Flashcards::Table)
        .and_where(Expr::col(Flashcards::Id).eq(id))
        .build(SqliteQueryBuilder)
}
