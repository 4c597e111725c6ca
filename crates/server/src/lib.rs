//! Flash Me HTTP server: GitHub sign-in, cookie sessions, and flashcards.

pub mod accounts;
pub mod config;
pub mod error;
pub mod github;
pub mod routes;
pub mod session;
pub mod storage;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use config::AppConfig;
use github::GitHubClient;
use session::SessionManager;
use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    /// Built once at startup; holds the derived cookie keys.
    pub sessions: Arc<SessionManager>,
    pub github: GitHubClient,
}

impl AppState {
    pub fn new(db: Db, config: AppConfig) -> anyhow::Result<Self> {
        let sessions = SessionManager::new(&config.session)?;
        let github = GitHubClient::new(config.github.clone(), config.http_timeout)?;
        Ok(Self {
            db,
            config,
            sessions: Arc::new(sessions),
            github,
        })
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// The full router with session loading and request tracing.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/me", get(routes::auth::me))
        .route(
            "/flashcards",
            get(routes::flashcards::list).post(routes::flashcards::create),
        )
        .route(
            "/flashcards/{id}",
            get(routes::flashcards::get)
                .put(routes::flashcards::update)
                .delete(routes::flashcards::delete),
        );

    Router::new()
        .route("/auth/github/login", get(routes::auth::login))
        .route("/auth/github", get(routes::auth::callback))
        .route("/auth/logout", post(routes::auth::logout))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
