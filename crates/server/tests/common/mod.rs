//! Shared harness: the real router on an ephemeral port, talking to an
//! in-process fake of the three GitHub endpoints it uses.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use flashme_api::Account;
use flashme_api::oauth;
use flashme_server::accounts::AccountStore;
use flashme_server::config::{AppConfig, DEFAULT_SESSION_COOKIE, SessionConfig};
use flashme_server::storage::{self, Db};
use flashme_server::{AppState, app};

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const VALID_CODE: &str = "valid123";
pub const ACCESS_TOKEN: &str = "gho_test";
pub const STATE_COOKIE: &str = "__gh_state";
pub const SESSION_SECRETS: [&str; 4] = ["secret-one", "secret-two", "secret-three", "secret-four"];

// ---------------------------------------------------------------------------
// Fake GitHub
// ---------------------------------------------------------------------------

/// What the fake GitHub answers.
#[derive(Clone)]
pub struct GitHubBehavior {
    pub token_status: StatusCode,
    pub profile: Value,
    pub profile_status: StatusCode,
    pub emails: Value,
    pub emails_status: StatusCode,
}

impl Default for GitHubBehavior {
    fn default() -> Self {
        Self {
            token_status: StatusCode::OK,
            profile: json!({ "login": "octocat", "name": "Octo Cat", "email": null }),
            profile_status: StatusCode::OK,
            emails: json!([
                { "email": "secondary@b.com", "primary": false, "verified": true },
                { "email": "a@b.com", "primary": true, "verified": true }
            ]),
            emails_status: StatusCode::OK,
        }
    }
}

#[derive(Clone)]
struct FakeState {
    behavior: GitHubBehavior,
    token_calls: Arc<AtomicUsize>,
    email_calls: Arc<AtomicUsize>,
}

pub struct FakeGitHub {
    pub base_url: String,
    token_calls: Arc<AtomicUsize>,
    email_calls: Arc<AtomicUsize>,
}

impl FakeGitHub {
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn email_calls(&self) -> usize {
        self.email_calls.load(Ordering::SeqCst)
    }
}

async fn fake_token(
    State(s): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    s.token_calls.fetch_add(1, Ordering::SeqCst);
    if s.behavior.token_status != StatusCode::OK {
        return (
            s.behavior.token_status,
            Json(json!({ "error": "service_unavailable" })),
        )
            .into_response();
    }
    let authentic = params.get("client_id").map(String::as_str) == Some(CLIENT_ID)
        && params.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET);
    if authentic && params.get("code").map(String::as_str) == Some(VALID_CODE) {
        Json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "bearer",
            "scope": "read:user,user:email"
        }))
        .into_response()
    } else {
        // GitHub reports a bad code with 200 and an error body.
        Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        }))
        .into_response()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    let token = headers.get("authorization").and_then(|v| v.to_str().ok());
    let agent = headers.get("user-agent").and_then(|v| v.to_str().ok());
    token == Some(format!("token {ACCESS_TOKEN}").as_str()) && agent == Some(oauth::USER_AGENT)
}

async fn fake_user(State(s): State<FakeState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (s.behavior.profile_status, Json(s.behavior.profile.clone())).into_response()
}

async fn fake_emails(State(s): State<FakeState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    s.email_calls.fetch_add(1, Ordering::SeqCst);
    (s.behavior.emails_status, Json(s.behavior.emails.clone())).into_response()
}

pub async fn spawn_github(behavior: GitHubBehavior) -> FakeGitHub {
    let state = FakeState {
        behavior,
        token_calls: Arc::new(AtomicUsize::new(0)),
        email_calls: Arc::new(AtomicUsize::new(0)),
    };
    let token_calls = state.token_calls.clone();
    let email_calls = state.email_calls.clone();

    let router = Router::new()
        .route("/login/oauth/access_token", post(fake_token))
        .route("/user", get(fake_user))
        .route("/user/emails", get(fake_emails))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    FakeGitHub {
        base_url: format!("http://{addr}"),
        token_calls,
        email_calls,
    }
}

/// A "GitHub" whose port refuses connections.
pub fn unreachable_github() -> FakeGitHub {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    FakeGitHub {
        base_url: format!("http://{addr}"),
        token_calls: Arc::new(AtomicUsize::new(0)),
        email_calls: Arc::new(AtomicUsize::new(0)),
    }
}

// ---------------------------------------------------------------------------
// App under test
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
    pub github: FakeGitHub,
}

pub async fn spawn_app(github: FakeGitHub) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let config = AppConfig {
        host: base_url.clone(),
        github: oauth::github_preset_with_hosts(
            &github.base_url,
            &github.base_url,
            CLIENT_ID.into(),
            CLIENT_SECRET.into(),
        ),
        session: SessionConfig {
            cookie_name: DEFAULT_SESSION_COOKIE.into(),
            secrets: SESSION_SECRETS.iter().map(|s| s.to_string()).collect(),
            secure: false,
        },
        http_timeout: Duration::from_secs(5),
    };
    let state = AppState::new(storage::open_in_memory().unwrap(), config).unwrap();

    let router = app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        base_url,
        client,
        state,
        github,
    }
}

pub async fn spawn_default() -> TestApp {
    spawn_app(spawn_github(GitHubBehavior::default()).await).await
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn db(&self) -> &Db {
        &self.state.db
    }

    /// Start a sign-in and return `(state, state cookie header)`.
    pub async fn begin_sign_in(&self) -> (String, String) {
        let resp = self.client.get(self.url("/auth/github/login")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

        let location = location(&resp);
        let url = url::Url::parse(&location).unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let cookie = cookie_pair(&resp, STATE_COOKIE).unwrap();
        (state, cookie)
    }

    /// Hit the callback with the given query and `Cookie` header.
    pub async fn callback(&self, query: &[(&str, &str)], cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url("/auth/github")).query(query);
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        req.send().await.unwrap()
    }

    /// Full browser round trip with `code`; returns the callback response.
    pub async fn sign_in_with_code(&self, code: &str) -> reqwest::Response {
        let (state, cookie) = self.begin_sign_in().await;
        self.callback(&[("code", code), ("state", state.as_str())], Some(&cookie))
            .await
    }

    /// Sign in through GitHub and return the session `Cookie` header.
    pub async fn sign_in(&self) -> String {
        let resp = self.sign_in_with_code(VALID_CODE).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        cookie_pair(&resp, DEFAULT_SESSION_COOKIE).unwrap()
    }

    /// Provision an account directly and mint a session for it.
    pub fn login_as(&self, email: &str) -> (Account, String) {
        let account = self.state.db.create(email, email.split('@').next().unwrap()).unwrap();
        let cookie = self.state.sessions.issue(&account).unwrap();
        (account, format!("{}={}", cookie.name(), cookie.value()))
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        req.send().await.unwrap()
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        cookie: Option<&str>,
        body: &Value,
    ) -> reqwest::Response {
        let mut req = self.client.request(method, self.url(path)).json(body);
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        req.send().await.unwrap()
    }

    pub fn account_count(&self) -> i64 {
        self.state
            .db
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap()
    }
}

// ---------------------------------------------------------------------------
// Header helpers
// ---------------------------------------------------------------------------

pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// Raw `Set-Cookie` header for `name`, if the response sets it.
pub fn set_cookie(resp: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}

/// `name=value` part of the `Set-Cookie` header for `name`, ready to send back.
pub fn cookie_pair(resp: &reqwest::Response, name: &str) -> Option<String> {
    set_cookie(resp, name).and_then(|raw| raw.split(';').next().map(|p| p.trim().to_string()))
}

pub fn is_removal(set_cookie: &str) -> bool {
    set_cookie.contains("Max-Age=0")
}
