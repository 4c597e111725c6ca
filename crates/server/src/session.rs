//! Encrypted cookie sessions.
//!
//! The cookie carries the whole account as it was at sign-in, sealed with
//! [`SessionCodec`]. Reading a session always re-fetches the account, so a
//! deleted account logs its sessions out on their next request.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use flashme_api::crypto::{SESSION_MAX_AGE_SECS, SessionCodec};
use flashme_api::{Account, ServiceError};

use crate::accounts::AccountStore;
use crate::config::SessionConfig;
use crate::error::ApiErr;
use crate::storage::Db;

#[derive(Debug, Serialize, Deserialize)]
struct SessionPayload {
    account: Account,
    issued_at: i64,
}

/// What a request's session cookie turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    /// No cookie, or one that no configured secret opens.
    Anonymous,
    Authenticated(Account),
    /// Authentic cookie whose account no longer exists. The cookie must be destroyed.
    Invalidated,
}

pub struct SessionManager {
    codec: SessionCodec,
    cookie_name: String,
    secure: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            codec: SessionCodec::new(config.secrets.as_slice())?,
            cookie_name: config.cookie_name.clone(),
            secure: config.secure,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Number of secrets cookies are accepted under.
    pub fn secret_count(&self) -> usize {
        self.codec.secret_count()
    }

    /// Seal `account` into a fresh 30-day session cookie.
    pub fn issue(&self, account: &Account) -> Result<Cookie<'static>, ServiceError> {
        let sealed = self.codec.seal(&SessionPayload {
            account: account.clone(),
            issued_at: chrono::Utc::now().timestamp(),
        })?;
        Ok(Cookie::build((self.cookie_name.clone(), sealed))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::seconds(SESSION_MAX_AGE_SECS))
            .build())
    }

    pub fn read(
        &self,
        jar: &CookieJar,
        store: &impl AccountStore,
    ) -> Result<SessionLookup, ServiceError> {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Ok(SessionLookup::Anonymous);
        };
        let Some(payload) = self.codec.open::<SessionPayload>(cookie.value()) else {
            tracing::debug!("ignoring session cookie that no secret opens");
            return Ok(SessionLookup::Anonymous);
        };

        match store.find_by_id(&payload.account.id)? {
            Some(account) => Ok(SessionLookup::Authenticated(account)),
            None => {
                tracing::info!(
                    account_id = %payload.account.id,
                    "session refers to a deleted account"
                );
                Ok(SessionLookup::Invalidated)
            }
        }
    }

    /// Removal cookie for the session.
    pub fn destroy(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("cookie_name", &self.cookie_name)
            .field("secure", &self.secure)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Resolved session of the current request, stored in request extensions.
#[derive(Debug, Clone)]
struct CurrentAccount(Option<Account>);

/// Load the session once per request.
///
/// A stale session gets a removal cookie on the way out, unless the handler
/// already set a new session cookie itself.
pub async fn session_middleware(
    State(sessions): State<Arc<SessionManager>>,
    State(db): State<Db>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let lookup = match sessions.read(&jar, &db) {
        Ok(lookup) => lookup,
        Err(e) => return ApiErr::from(e).into_response(),
    };

    let stale = lookup == SessionLookup::Invalidated;
    let account = match lookup {
        SessionLookup::Authenticated(account) => Some(account),
        SessionLookup::Anonymous | SessionLookup::Invalidated => None,
    };
    request.extensions_mut().insert(CurrentAccount(account));

    let response = next.run(request).await;
    if stale && !sets_cookie(&response, sessions.cookie_name()) {
        return (CookieJar::new().add(sessions.destroy()), response).into_response();
    }
    response
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Signed-in account. Rejects with `401` when the request is anonymous.
#[derive(Debug, Clone)]
pub struct AuthAccount(pub Account);

impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current(parts)
            .map(AuthAccount)
            .ok_or_else(|| ApiErr::unauthorized("please sign in first"))
    }
}

/// Signed-in account if there is one.
#[derive(Debug, Clone)]
pub struct MaybeAccount(pub Option<Account>);

impl<S> FromRequestParts<S> for MaybeAccount
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAccount(current(parts)))
    }
}

fn current(parts: &Parts) -> Option<Account> {
    parts
        .extensions
        .get::<CurrentAccount>()
        .and_then(|current| current.0.clone())
}
