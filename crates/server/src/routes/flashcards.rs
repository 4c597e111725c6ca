use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::{Connection, Row};

use flashme_api::db::flashcards;
use flashme_api::service::{self, stack_position};
use flashme_api::{
    Flashcard, FlashcardInput, FlashcardStack, FlashcardsResponse, ServiceError, StackQuery,
};

use crate::error::ApiErr;
use crate::session::{AuthAccount, MaybeAccount};
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

const NOT_FOUND: &str = "Flashcard not found.";

fn flashcard_from_row(row: &Row<'_>) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        user_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        is_public: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn find(conn: &Connection, id: &str) -> Result<Option<Flashcard>, ApiErr> {
    sq_query_opt(conn, flashcards::get_by_id(id), flashcard_from_row)
        .map_err(ApiErr::from_db("get flashcard"))
}

fn stack(cards: Vec<Flashcard>, index: Option<usize>) -> FlashcardStack {
    let position = stack_position(cards.len(), index.unwrap_or(0));
    FlashcardStack { cards, position }
}

/// GET /api/flashcards: own cards (empty when anonymous) and everybody else's public ones.
pub async fn list(
    State(db): State<Db>,
    MaybeAccount(account): MaybeAccount,
    Query(q): Query<StackQuery>,
) -> Result<Json<FlashcardsResponse>, ApiErr> {
    let owner_id = account.as_ref().map(|a| a.id.as_str());
    let conn = db.conn();

    let own = match owner_id {
        Some(id) => sq_query_map(&conn, flashcards::list_by_user(id), flashcard_from_row)
            .map_err(ApiErr::from_db("list own flashcards"))?,
        None => Vec::new(),
    };
    let public = sq_query_map(&conn, flashcards::list_public(owner_id), flashcard_from_row)
        .map_err(ApiErr::from_db("list public flashcards"))?;

    Ok(Json(FlashcardsResponse {
        own: stack(own, q.index),
        public: stack(public, q.public_index),
    }))
}

/// POST /api/flashcards
pub async fn create(
    State(db): State<Db>,
    AuthAccount(account): AuthAccount,
    Json(input): Json<FlashcardInput>,
) -> Result<(StatusCode, Json<Flashcard>), ApiErr> {
    let card = service::validate_flashcard(&input)?;
    let id = service::new_id();
    let now = chrono::Utc::now().to_rfc3339();

    let conn = db.conn();
    sq_execute(
        &conn,
        flashcards::insert(&id, &account.id, &card.front, &card.back, card.is_public, &now),
    )
    .map_err(ApiErr::from_db("insert flashcard"))?;

    let created = find(&conn, &id)?.ok_or_else(|| ApiErr::internal("internal server error"))?;
    tracing::info!(flashcard_id = %id, account_id = %account.id, "flashcard created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/flashcards/{id}: the owner's card, or anybody's public one.
pub async fn get(
    State(db): State<Db>,
    AuthAccount(account): AuthAccount,
    Path(id): Path<String>,
) -> Result<Json<Flashcard>, ApiErr> {
    let conn = db.conn();
    match find(&conn, &id)? {
        Some(card) if card.user_id == account.id || card.is_public => Ok(Json(card)),
        _ => Err(ApiErr::not_found(NOT_FOUND)),
    }
}

/// PUT /api/flashcards/{id}: only touches the caller's own row.
pub async fn update(
    State(db): State<Db>,
    AuthAccount(account): AuthAccount,
    Path(id): Path<String>,
    Json(input): Json<FlashcardInput>,
) -> Result<Json<Flashcard>, ApiErr> {
    let card = service::validate_flashcard(&input)?;
    let now = chrono::Utc::now().to_rfc3339();

    let conn = db.conn();
    let updated = sq_execute(
        &conn,
        flashcards::update_owned(&id, &account.id, &card.front, &card.back, card.is_public, &now),
    )
    .map_err(ApiErr::from_db("update flashcard"))?;
    if updated == 0 {
        return Err(ApiErr::not_found(
            "Flashcard not found. Did you maybe delete it?",
        ));
    }

    let card = find(&conn, &id)?.ok_or_else(|| ApiErr::not_found(NOT_FOUND))?;
    Ok(Json(card))
}

/// DELETE /api/flashcards/{id}
pub async fn delete(
    State(db): State<Db>,
    AuthAccount(account): AuthAccount,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiErr> {
    let conn = db.conn();
    let card = find(&conn, &id)?.ok_or_else(|| ApiErr::not_found(NOT_FOUND))?;
    if card.user_id != account.id {
        return Err(ServiceError::Forbidden("You can only delete your own flashcards.".into()).into());
    }

    sq_execute(&conn, flashcards::delete(&id)).map_err(ApiErr::from_db("delete flashcard"))?;
    tracing::info!(flashcard_id = %id, account_id = %account.id, "flashcard deleted");
    Ok(StatusCode::NO_CONTENT)
}
