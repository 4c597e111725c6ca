mod common;

use axum::http::StatusCode;
use reqwest::Method;
use serde_json::json;

use common::{TestApp, spawn_default};
use flashme_api::{ApiError, Flashcard, FlashcardsResponse, HealthResponse};

async fn create_card(app: &TestApp, cookie: &str, front: &str, is_public: bool) -> Flashcard {
    let resp = app
        .send_json(
            Method::POST,
            "/api/flashcards",
            Some(cookie),
            &json!({ "front": front, "back": format!("back of {front}"), "is_public": is_public }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn list(app: &TestApp, query: &str, cookie: Option<&str>) -> FlashcardsResponse {
    let resp = app.get(&format!("/api/flashcards{query}"), cookie).await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = spawn_default().await;
    let resp = app.get("/api/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: HealthResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "ok");
}

#[tokio::test]
async fn creating_requires_a_session() {
    let app = spawn_default().await;
    let resp = app
        .send_json(
            Method::POST,
            "/api/flashcards",
            None,
            &json!({ "front": "f", "back": "b" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn both_sides_are_required() {
    let app = spawn_default().await;
    let (_, cookie) = app.login_as("a@b.com");

    let resp = app
        .send_json(
            Method::POST,
            "/api/flashcards",
            Some(&cookie),
            &json!({ "front": "   ", "back": "b" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ApiError = resp.json().await.unwrap();
    assert_eq!(body.error, "Please provide a value for the front of your card.");

    let resp = app
        .send_json(
            Method::POST,
            "/api/flashcards",
            Some(&cookie),
            &json!({ "front": "f" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ApiError = resp.json().await.unwrap();
    assert_eq!(body.error, "Please provide a value for the back of your card.");
}

#[tokio::test]
async fn owner_can_create_read_update_and_delete() {
    let app = spawn_default().await;
    let (account, cookie) = app.login_as("a@b.com");

    let card = create_card(&app, &cookie, "# Ownership", false).await;
    assert_eq!(card.user_id, account.id);
    assert_eq!(card.front, "# Ownership");
    assert!(!card.is_public);

    let fetched: Flashcard = app
        .get(&format!("/api/flashcards/{}", card.id), Some(&cookie))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, card);

    let resp = app
        .send_json(
            Method::PUT,
            &format!("/api/flashcards/{}", card.id),
            Some(&cookie),
            &json!({ "front": "Borrowing", "back": "&T", "is_public": true }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Flashcard = resp.json().await.unwrap();
    assert_eq!(updated.front, "Borrowing");
    assert_eq!(updated.back, "&T");
    assert!(updated.is_public);
    assert_eq!(updated.created_at, card.created_at);

    let resp = app
        .client
        .delete(app.url(&format!("/api/flashcards/{}", card.id)))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .get(&format!("/api/flashcards/{}", card.id), Some(&cookie))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_accounts_cannot_touch_private_cards() {
    let app = spawn_default().await;
    let (_, owner) = app.login_as("owner@b.com");
    let (_, intruder) = app.login_as("intruder@b.com");
    let card = create_card(&app, &owner, "secret", false).await;
    let path = format!("/api/flashcards/{}", card.id);

    assert_eq!(
        app.get(&path, Some(&intruder)).await.status(),
        StatusCode::NOT_FOUND
    );

    let resp = app
        .send_json(
            Method::PUT,
            &path,
            Some(&intruder),
            &json!({ "front": "mine now", "back": "b" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ApiError = resp.json().await.unwrap();
    assert_eq!(body.error, "Flashcard not found. Did you maybe delete it?");

    let resp = app
        .client
        .delete(app.url(&path))
        .header("cookie", &intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let still_there: Flashcard = app.get(&path, Some(&owner)).await.json().await.unwrap();
    assert_eq!(still_there.front, "secret");
}

#[tokio::test]
async fn public_cards_are_readable_by_other_accounts() {
    let app = spawn_default().await;
    let (_, owner) = app.login_as("owner@b.com");
    let (_, reader) = app.login_as("reader@b.com");
    let card = create_card(&app, &owner, "shared", true).await;

    let resp = app
        .get(&format!("/api/flashcards/{}", card.id), Some(&reader))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.get(&format!("/api/flashcards/{}", card.id), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_splits_own_and_public_cards() {
    let app = spawn_default().await;
    let (alice_account, alice) = app.login_as("alice@b.com");
    let (_, bob) = app.login_as("bob@b.com");

    create_card(&app, &alice, "alice private", false).await;
    create_card(&app, &alice, "alice public", true).await;
    create_card(&app, &bob, "bob public", true).await;
    create_card(&app, &bob, "bob private", false).await;

    let listing = list(&app, "", Some(&alice)).await;
    let own: Vec<_> = listing.own.cards.iter().map(|c| c.front.as_str()).collect();
    let public: Vec<_> = listing.public.cards.iter().map(|c| c.front.as_str()).collect();
    assert_eq!(own, ["alice private", "alice public"]);
    assert_eq!(public, ["bob public"]);
    assert!(listing.own.cards.iter().all(|c| c.user_id == alice_account.id));

    let anonymous = list(&app, "", None).await;
    assert!(anonymous.own.cards.is_empty());
    assert!(anonymous.own.position.is_none());
    let public: Vec<_> = anonymous.public.cards.iter().map(|c| c.front.as_str()).collect();
    assert_eq!(public, ["alice public", "bob public"]);
}

#[tokio::test]
async fn stack_positions_wrap_around() {
    let app = spawn_default().await;
    let (_, cookie) = app.login_as("a@b.com");
    for front in ["one", "two", "three"] {
        create_card(&app, &cookie, front, false).await;
    }

    let first = list(&app, "", Some(&cookie)).await.own.position.unwrap();
    assert_eq!((first.index, first.prev, first.next, first.len), (0, 2, 1, 3));

    let last = list(&app, "?index=2", Some(&cookie)).await.own.position.unwrap();
    assert_eq!((last.index, last.prev, last.next), (2, 1, 0));

    let wrapped = list(&app, "?index=7", Some(&cookie)).await.own.position.unwrap();
    assert_eq!(wrapped.index, 1);

    let empty_public = list(&app, "?public_index=3", Some(&cookie)).await.public;
    assert!(empty_public.cards.is_empty());
    assert!(empty_public.position.is_none());
}
