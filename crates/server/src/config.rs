//! Server configuration loaded from environment variables.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::time::Duration;

use flashme_api::deploy;
use flashme_api::oauth::{self, GitHubOAuthConfig};

/// Default cookie carrying the encrypted session.
pub const DEFAULT_SESSION_COOKIE: &str = "__session";

/// Number of rotating session secrets the deployment must provide.
pub const SESSION_SECRET_COUNT: usize = 4;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct AppConfig {
    /// Public base URL of this deployment, e.g. `https://flash.me`.
    pub host: String,
    pub github: GitHubOAuthConfig,
    pub session: SessionConfig,
    /// Upper bound for every outbound GitHub call.
    pub http_timeout: Duration,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Primary secret first; all are accepted when reading.
    pub secrets: Vec<String>,
    pub secure: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secrets", &self.secrets.len())
            .field("secure", &self.secure)
            .finish()
    }
}

impl AppConfig {
    /// Callback URL registered with the GitHub OAuth app.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/github", self.host.trim_end_matches('/'))
    }

    pub fn from_env() -> Result<Self> {
        let host = required("HOST")?;
        let client_id = required("GITHUB_CLIENT_ID")?;
        let client_secret = required("GITHUB_CLIENT_SECRET")?;

        let github = match (optional("GITHUB_URL"), optional("GITHUB_API_URL")) {
            (None, None) => oauth::github_preset(client_id, client_secret),
            (web, api) => {
                let web = web.unwrap_or_else(|| "https://github.com".into());
                let api = api.unwrap_or_else(|| "https://api.github.com".into());
                tracing::info!("GitHub endpoints overridden: web={web} api={api}");
                oauth::github_preset_with_hosts(&web, &api, client_id, client_secret)
            }
        };

        let secrets = (1..=SESSION_SECRET_COUNT)
            .map(|i| required(&format!("SESSION_COOKIE_SECRET_{i}")))
            .collect::<Result<Vec<_>>>()?;

        let secure = deploy::secure_cookies(
            optional(deploy::ENV_DEPLOYMENT).as_deref(),
            optional(deploy::ENV_SECURE_COOKIES).as_deref(),
        );
        if !secure {
            tracing::warn!("session cookies are not marked Secure (non-production deployment)");
        }

        let http_timeout = match optional("FLASHME_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("FLASHME_HTTP_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            host,
            github,
            session: SessionConfig {
                cookie_name: optional("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.into()),
                secrets,
                secure,
            },
            http_timeout: Duration::from_secs(http_timeout),
        })
    }
}

/// Data directory for the SQLite file.
pub fn data_dir() -> PathBuf {
    optional("FLASHME_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Listen port.
pub fn port() -> String {
    optional("PORT").unwrap_or_else(|| "3000".into())
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn required(name: &str) -> Result<String> {
    match optional(name) {
        Some(v) => Ok(v),
        None => bail!("{name} must be set"),
    }
}
