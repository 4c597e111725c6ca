//! GitHub OAuth2 support.
//!
//! This module contains only types, URL builders, and JSON parsing.
//! No HTTP calls or DB access; those live in the server crate.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::AuthError;
use crate::service;

/// User-Agent sent on every GitHub API call (GitHub rejects requests without one).
pub const USER_AGENT: &str = "Particular.Cloud";

/// `user:email` is needed because the public profile email is often empty.
pub const SCOPES: &str = "read:user user:email";

// ── Provider Configuration ──────────────────────────────────────────────────

/// GitHub OAuth app configuration plus the endpoints it talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubOAuthConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub user_url: String,
    pub emails_url: String,

    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub scopes: String,
    pub user_agent: String,
}

/// Create the config for github.com. Only needs client credentials.
pub fn github_preset(client_id: String, client_secret: String) -> GitHubOAuthConfig {
    github_preset_with_hosts(
        "https://github.com",
        "https://api.github.com",
        client_id,
        client_secret,
    )
}

/// Create a config for a GitHub-compatible host pair.
///
/// `web_base` serves the browser-facing authorize page and the token endpoint,
/// `api_base` serves `/user` and `/user/emails`.
pub fn github_preset_with_hosts(
    web_base: &str,
    api_base: &str,
    client_id: String,
    client_secret: String,
) -> GitHubOAuthConfig {
    let web = web_base.trim_end_matches('/');
    let api = api_base.trim_end_matches('/');
    GitHubOAuthConfig {
        authorize_url: format!("{web}/login/oauth/authorize"),
        token_url: format!("{web}/login/oauth/access_token"),
        user_url: format!("{api}/user"),
        emails_url: format!("{api}/user/emails"),
        client_id,
        client_secret,
        scopes: SCOPES.into(),
        user_agent: USER_AGENT.into(),
    }
}

// ── URL Builders (pure functions, no HTTP) ──────────────────────────────────

/// Build the authorize URL the browser is redirected to.
pub fn build_authorize_url(
    config: &GitHubOAuthConfig,
    redirect_uri: &str,
    state: &str,
) -> Result<String, AuthError> {
    let mut url = parse_endpoint(&config.authorize_url)?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &config.scopes)
        .append_pair("state", state);
    Ok(url.into())
}

/// Build the token exchange URL. GitHub takes the credentials as query parameters.
pub fn build_token_url(config: &GitHubOAuthConfig, code: &str) -> Result<String, AuthError> {
    let mut url = parse_endpoint(&config.token_url)?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("client_secret", &config.client_secret)
        .append_pair("code", code);
    Ok(url.into())
}

fn parse_endpoint(raw: &str) -> Result<Url, AuthError> {
    Url::parse(raw).map_err(|e| AuthError::Internal(format!("invalid endpoint '{raw}': {e}")))
}

// ── Token response ──────────────────────────────────────────────────────────

/// Parse `access_token` from a token endpoint response.
///
/// Supports both JSON (`{"access_token":"..."}`) and query-string style
/// (`access_token=...&scope=...`) payloads. A body without a usable token is a
/// verification failure; the provider's `error`/`error_description` end up in
/// the error detail.
pub fn parse_access_token_response(raw: &str) -> Result<String, AuthError> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(AuthError::VerifyError("empty token response body".into()));
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(token) = json
            .get("access_token")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return Ok(token.to_string());
        }

        let err = json.get("error").and_then(|v| v.as_str());
        let err_desc = json.get("error_description").and_then(|v| v.as_str());
        return Err(AuthError::VerifyError(describe(
            err.map(str::to_string),
            err_desc.map(str::to_string),
        )));
    }

    let mut access_token: Option<String> = None;
    let mut error: Option<String> = None;
    let mut error_description: Option<String> = None;

    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        if value.trim().is_empty() {
            continue;
        }
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    match access_token {
        Some(token) => Ok(token),
        None => Err(AuthError::VerifyError(describe(error, error_description))),
    }
}

fn describe(error: Option<String>, description: Option<String>) -> String {
    match (error, description) {
        (Some(e), Some(d)) if !d.is_empty() => format!("{e}: {d}"),
        (Some(e), _) => e,
        (None, Some(d)) if !d.is_empty() => d,
        _ => "no access_token field in response".to_string(),
    }
}

// ── User API payloads ───────────────────────────────────────────────────────

/// Subset of `GET /user` we consume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubUser {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Only the publicly visible email; often `null` even with `user:email` scope.
    #[serde(default)]
    pub email: Option<String>,
}

impl GitHubUser {
    /// The public profile email, if it is non-blank.
    pub fn public_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// One entry of `GET /user/emails`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Pick the entry that is both primary and verified.
pub fn primary_verified_email(emails: &[GitHubEmail]) -> Option<&str> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email.as_str())
        .filter(|e| !e.trim().is_empty())
}

/// Normalized identity handed to the account resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub display_name: String,
}

/// Normalize the chosen email and derive a display name.
pub fn build_identity(profile_name: Option<&str>, raw_email: &str) -> Result<Identity, AuthError> {
    let email = service::validate_email(raw_email).map_err(|_| AuthError::EmailRequired)?;
    let display_name =
        service::display_name(profile_name, &email).ok_or(AuthError::NameRequired)?;
    Ok(Identity {
        email,
        display_name,
    })
}
