//! Anti-forgery `state` for the GitHub authorize round trip.
//!
//! The token is generated before redirecting to GitHub, held by the browser,
//! echoed back by GitHub, and compared on return. Nothing is stored server-side.

use crate::{AuthError, ServiceError, crypto};

/// How long the browser keeps the pending state.
pub const STATE_TTL_MINUTES: i64 = 10;

/// Result of checking the callback parameters against the pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOutcome {
    Ok,
    /// The user declined at GitHub (`error=access_denied`).
    Canceled,
    /// Stored state missing or different, or any other provider error.
    Mismatch,
}

impl StateOutcome {
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Ok => Ok(()),
            Self::Canceled => Err(AuthError::Canceled),
            Self::Mismatch => Err(AuthError::Mismatch),
        }
    }
}

/// Produce a fresh opaque state token.
pub fn generate_state() -> Result<String, ServiceError> {
    crypto::generate_token()
}

/// Compare the returned state with the stored one.
///
/// The stored token is single-use: callers discard it whatever the outcome.
pub fn validate(
    returned_state: Option<&str>,
    stored_state: Option<&str>,
    provider_error: Option<&str>,
) -> StateOutcome {
    match provider_error.filter(|e| !e.is_empty()) {
        Some("access_denied") => return StateOutcome::Canceled,
        Some(_) => return StateOutcome::Mismatch,
        None => {}
    }
    match (returned_state, stored_state) {
        (Some(returned), Some(stored)) if !stored.is_empty() && returned == stored => {
            StateOutcome::Ok
        }
        _ => StateOutcome::Mismatch,
    }
}
