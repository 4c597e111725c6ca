use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use time::Duration;

use flashme_api::{Account, AuthError, csrf, oauth};

use crate::AppState;
use crate::accounts::{AccountStore, resolve_account};
use crate::config::AppConfig;
use crate::error::AuthFailure;
use crate::github::GitHubClient;
use crate::session::AuthAccount;

/// Browser-side slot for the pending OAuth `state`.
pub const STATE_COOKIE: &str = "__gh_state";

/// Path GitHub redirects back to. The state cookie is scoped to it.
const CALLBACK_PATH: &str = "/auth/github";

fn state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, state))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(CALLBACK_PATH)
        .max_age(Duration::minutes(csrf::STATE_TTL_MINUTES))
        .build()
}

fn clear_state_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(CALLBACK_PATH)
        .max_age(Duration::ZERO)
        .build()
}

// ---------------------------------------------------------------------------
// Sign-in flow
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SignIn {
    pub account: Account,
    pub is_new_account: bool,
}

/// Code → token → identity → account. The first failure aborts the flow.
pub async fn sign_in(
    github: &GitHubClient,
    store: &impl AccountStore,
    code: &str,
) -> Result<SignIn, AuthError> {
    let auth = github.exchange_code(code).await?;
    let identity = github.resolve_identity(&auth).await?;
    let (account, is_new_account) =
        resolve_account(store, &identity.email, &identity.display_name)?;
    Ok(SignIn {
        account,
        is_new_account,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /auth/github/login: remember a fresh `state` and send the browser to GitHub.
pub async fn login(
    State(config): State<AppConfig>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthFailure> {
    let state = csrf::generate_state().map_err(AuthError::from)?;
    let url = oauth::build_authorize_url(&config.github, &config.redirect_uri(), &state)?;
    Ok((
        jar.add(state_cookie(state, config.session.secure)),
        Redirect::temporary(&url),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /auth/github: GitHub's redirect back after the user decided.
///
/// The pending state is cleared on every outcome, including a malformed query.
pub async fn callback(
    State(app): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let secure = app.config.session.secure;
    let stored = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(clear_state_cookie(secure));

    let q = match query {
        Ok(Query(q)) => q,
        Err(rejection) => {
            tracing::warn!(
                had_stored_state = stored.is_some(),
                "GitHub callback query unreadable: {}",
                rejection.body_text()
            );
            return (jar, AuthFailure(AuthError::Mismatch)).into_response();
        }
    };

    let outcome = csrf::validate(q.state.as_deref(), stored.as_deref(), q.error.as_deref());
    if let Err(e) = outcome.into_result() {
        tracing::warn!(
            state = e.state(),
            provider_error = q.error.as_deref().unwrap_or(""),
            provider_detail = q.error_description.as_deref().unwrap_or(""),
            had_stored_state = stored.is_some(),
            "GitHub callback rejected"
        );
        return (jar, AuthFailure(e)).into_response();
    }

    let code = q.code.as_deref().unwrap_or_default();
    let signed_in = match sign_in(&app.github, &app.db, code).await {
        Ok(signed_in) => signed_in,
        Err(e) => {
            tracing::error!(state = e.state(), status = e.status_code(), "sign-in failed: {e}");
            return (jar, AuthFailure(e)).into_response();
        }
    };

    let cookie = match app.sessions.issue(&signed_in.account) {
        Ok(cookie) => cookie,
        Err(e) => {
            let e = AuthError::from(e);
            tracing::error!(state = e.state(), "cannot issue session: {e}");
            return (jar, AuthFailure(e)).into_response();
        }
    };

    tracing::info!(
        account_id = %signed_in.account.id,
        is_new_account = signed_in.is_new_account,
        "signed in with GitHub"
    );
    (jar.add(cookie), Redirect::to("/")).into_response()
}

/// POST /auth/logout
pub async fn logout(State(app): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.add(app.sessions.destroy()), Redirect::to("/"))
}

/// GET /api/me
pub async fn me(AuthAccount(account): AuthAccount) -> Json<Account> {
    Json(account)
}
