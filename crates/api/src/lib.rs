//! Shared API types, GitHub OAuth helpers, session crypto, and SQL builders for Flash Me.
//!
//! This crate is the single source of truth for request/response types and the
//! sign-in error taxonomy. Everything that touches the database or secrets lives
//! behind the `backend` feature.

use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod csrf;
#[cfg(feature = "backend")]
pub mod db;
pub mod deploy;
pub mod oauth;
pub mod service;

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A local account. Provisioned on first GitHub sign-in, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

// ─── Flashcards ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub id: String,
    pub user_id: String,
    pub front: String,
    pub back: String,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `POST /api/flashcards` and `PUT /api/flashcards/{id}`.
///
/// Sides are optional on the wire so that a missing side produces the
/// dedicated validation message instead of a generic deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlashcardInput {
    pub front: Option<String>,
    pub back: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Position inside a wrap-around flashcard stack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackPosition {
    pub index: usize,
    pub prev: usize,
    pub next: usize,
    pub len: usize,
}

/// One browsable stack of cards plus the current position (absent when empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardStack {
    pub cards: Vec<Flashcard>,
    pub position: Option<StackPosition>,
}

/// Query of `GET /api/flashcards`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StackQuery {
    pub index: Option<usize>,
    pub public_index: Option<usize>,
}

/// Response of `GET /api/flashcards`: the caller's own cards and everybody else's public ones.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlashcardsResponse {
    pub own: FlashcardStack,
    pub public: FlashcardStack,
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic error for flashcard and account operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Internal(m) => m,
        }
    }

    /// Build a closure that wraps a DB/IO error into `Internal`.
    pub fn from_db<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| Self::Internal(format!("{context}: {e}"))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

// ─── Sign-in errors ──────────────────────────────────────────────────────────

/// Everything that can abort a GitHub sign-in.
///
/// The payload strings are diagnostic detail for the server log only; the
/// browser sees [`AuthError::state`] and [`AuthError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization code required")]
    CodeRequired,
    #[error("GitHub verification failed: {0}")]
    VerifyError(String),
    #[error("no primary verified email on the GitHub account")]
    EmailRequired,
    #[error("no usable display name on the GitHub account")]
    NameRequired,
    #[error("internal error: {0}")]
    Internal(String),
    #[error("sign-in canceled at GitHub")]
    Canceled,
    #[error("OAuth state mismatch")]
    Mismatch,
}

impl AuthError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::CodeRequired | Self::NameRequired | Self::Mismatch => 400,
            Self::EmailRequired | Self::Canceled => 401,
            Self::VerifyError(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable discriminant.
    pub fn state(&self) -> &'static str {
        match self {
            Self::CodeRequired => "code_required",
            Self::VerifyError(_) => "verify_error",
            Self::EmailRequired => "email_required",
            Self::NameRequired => "name_required",
            Self::Internal(_) => "internal_error",
            Self::Canceled => "canceled",
            Self::Mismatch => "mismatch",
        }
    }

    /// Message shown to the browser. Internal failures and a missing name share
    /// the generic text so no detail leaks.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Canceled => {
                "It seems like you canceled the sign in with GitHub. \
                 You can try again or navigate back to the homepage."
            }
            Self::EmailRequired => {
                "We were not able to access your email address. Please make sure your GitHub \
                 account has a primary, verified email address and try again."
            }
            Self::CodeRequired => {
                "GitHub did not hand us an authorization code. Please try signing in again."
            }
            Self::VerifyError(_) => {
                "GitHub could not verify your sign in. Please try again in a moment."
            }
            Self::Mismatch => {
                "Your sign in request expired or did not originate from this browser. \
                 Please start the sign in again."
            }
            Self::Internal(_) | Self::NameRequired => {
                "Apologies, something went wrong while signing in with GitHub. \
                 We logged this error and will investigate the root cause."
            }
        }
    }
}

impl From<ServiceError> for AuthError {
    fn from(e: ServiceError) -> Self {
        Self::Internal(e.message().to_string())
    }
}

/// JSON body returned when sign-in aborts. Always offers a retry and an escape hatch.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthErrorResponse {
    pub state: String,
    pub error: String,
    pub retry_url: String,
    pub home_url: String,
}

/// Path that starts a new GitHub sign-in.
pub const SIGN_IN_PATH: &str = "/auth/github/login";

impl From<&AuthError> for AuthErrorResponse {
    fn from(e: &AuthError) -> Self {
        Self {
            state: e.state().to_string(),
            error: e.user_message().to_string(),
            retry_url: SIGN_IN_PATH.to_string(),
            home_url: "/".to_string(),
        }
    }
}

// ─── Error (legacy JSON shape) ──────────────────────────────────────────────

/// JSON error shape `{ "error": "..." }` returned by all non-auth error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}
