//! Outbound GitHub calls: code → token exchange and identity lookup.
//!
//! Each call is a single round trip with no retries. Every failure is logged
//! here, at its origin, and converted into an [`AuthError`].

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

use flashme_api::AuthError;
use flashme_api::oauth::{self, GitHubEmail, GitHubOAuthConfig, GitHubUser, Identity};

/// Headers that authenticate follow-up API calls as the signed-in GitHub user.
#[derive(Clone)]
pub struct AuthHeaders(HeaderMap);

impl AuthHeaders {
    fn new(access_token: &str, user_agent: &str) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        let authorization = HeaderValue::from_str(&format!("token {access_token}"))
            .map_err(|e| AuthError::Internal(format!("access token not header-safe: {e}")))?;
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| AuthError::Internal(format!("invalid user agent: {e}")))?;
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(USER_AGENT, user_agent);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self(headers))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.0
    }
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthHeaders(<redacted>)")
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubOAuthConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubOAuthConfig, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<AuthHeaders, AuthError> {
        if code.trim().is_empty() {
            tracing::error!("code required for GitHub token exchange");
            return Err(AuthError::CodeRequired);
        }

        let url = oauth::build_token_url(&self.config, code)?;
        let response = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                // The URL carries the client secret; never log it.
                tracing::error!("token exchange request failed: {}", e.without_url());
                AuthError::Internal("token exchange request failed".into())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("token exchange body read failed: {}", e.without_url());
            AuthError::Internal("token exchange body read failed".into())
        })?;

        if status != StatusCode::OK {
            tracing::error!(%status, "GitHub token endpoint rejected the exchange");
            return Err(AuthError::VerifyError(format!("token endpoint status {status}")));
        }

        let access_token = oauth::parse_access_token_response(&body).inspect_err(|e| {
            tracing::error!(%status, "GitHub token response unusable: {e}");
        })?;

        AuthHeaders::new(&access_token, &self.config.user_agent)
    }

    /// Fetch profile (and, if the public email is empty, the email list) and
    /// derive a normalized identity.
    pub async fn resolve_identity(&self, auth: &AuthHeaders) -> Result<Identity, AuthError> {
        let Some(profile) = self
            .get_json::<GitHubUser>(&self.config.user_url, auth, "user")
            .await?
        else {
            tracing::error!("GitHub user endpoint returned an empty body");
            return Err(AuthError::VerifyError("user endpoint returned nothing".into()));
        };

        let email = match profile.public_email() {
            Some(email) => email.to_string(),
            None => {
                let emails = self
                    .get_json::<Vec<GitHubEmail>>(&self.config.emails_url, auth, "emails")
                    .await?
                    .unwrap_or_default();
                match oauth::primary_verified_email(&emails) {
                    Some(email) => email.to_string(),
                    None => {
                        tracing::error!(
                            candidates = emails.len(),
                            "no primary verified email in GitHub emails response"
                        );
                        return Err(AuthError::EmailRequired);
                    }
                }
            }
        };

        oauth::build_identity(profile.name.as_deref(), &email).inspect_err(|e| {
            tracing::error!(login = ?profile.login, "cannot build identity: {e}");
        })
    }

    /// GET a JSON document; `Ok(None)` when the body is empty or `null`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        auth: &AuthHeaders,
        what: &str,
    ) -> Result<Option<T>, AuthError> {
        let response = self
            .http
            .get(url)
            .headers(auth.headers().clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("GitHub {what} request failed: {e}");
                AuthError::Internal(format!("GitHub {what} request failed"))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!(%status, "GitHub {what} endpoint failed");
            return Err(AuthError::VerifyError(format!("{what} endpoint status {status}")));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("GitHub {what} body read failed: {e}");
            AuthError::Internal(format!("GitHub {what} body read failed"))
        })?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }

        serde_json::from_str(trimmed).map(Some).map_err(|e| {
            tracing::error!("GitHub {what} body unparseable: {e}");
            AuthError::Internal(format!("GitHub {what} body unparseable"))
        })
    }
}
