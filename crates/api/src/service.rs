//! Shared business logic as framework-agnostic pure functions.
//!
//! Route handlers stay thin adapters around these.

use crate::{FlashcardInput, ServiceError, StackPosition};

// ─── Accounts ───────────────────────────────────────────────────────────────

/// Canonical form of an email address: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate and normalize an email address. Returns the lowercased, trimmed email.
pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') || email.len() > 254 {
        return Err(ServiceError::BadRequest("invalid email address".into()));
    }
    Ok(email)
}

/// Display name for a new account: the profile name, or else the email local-part.
pub fn display_name(profile_name: Option<&str>, email: &str) -> Option<String> {
    profile_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| email.split('@').next().map(str::trim))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Generate a new opaque record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ─── Flashcards ─────────────────────────────────────────────────────────────

/// A flashcard body that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFlashcard {
    pub front: String,
    pub back: String,
    pub is_public: bool,
}

/// Both sides must carry text; whitespace-only counts as missing.
pub fn validate_flashcard(input: &FlashcardInput) -> Result<ValidFlashcard, ServiceError> {
    let front = input
        .front
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ServiceError::BadRequest("Please provide a value for the front of your card.".into())
        })?;
    let back = input
        .back
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ServiceError::BadRequest("Please provide a value for the back of your card.".into())
        })?;
    Ok(ValidFlashcard {
        front: front.to_string(),
        back: back.to_string(),
        is_public: input.is_public,
    })
}

/// Position inside a stack of `len` cards with wrap-around neighbours.
///
/// Returns `None` for an empty stack; out-of-range indices wrap.
pub fn stack_position(len: usize, index: usize) -> Option<StackPosition> {
    if len == 0 {
        return None;
    }
    let index = index % len;
    Some(StackPosition {
        index,
        prev: (index + len - 1) % len,
        next: (index + 1) % len,
        len,
    })
}
