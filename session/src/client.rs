//! Session Client. The only code that talks to the Account Service.
//!
//! ARCHITECTURE
//! ============
//! [`AccountService`] is the seam the store depends on, so tests drive the
//! store with a scripted mock. [`HttpAccountService`] is the production
//! implementation: a `reqwest` client with a cookie store, which plays the role
//! of the browser's credential-bearing `fetch`.
//!
//! ERROR HANDLING
//! ==============
//! Each call resolves exactly once: no retries, no backoff. `401` on the
//! session check and on logout are expected states, not errors.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::account::RawAccount;
use crate::config::SessionConfig;
use crate::error::ApiError;

pub const SESSION_ENDPOINT: &str = "/auth/session";
pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout";

// =============================================================================
// ACCOUNT SERVICE TRAIT
// =============================================================================

/// The three session-mutating operations of the Account Service.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// `GET /auth/session`. `Ok(None)` means "no active session".
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for any non-2xx status other than `401`, for
    /// network failures, and for malformed bodies.
    async fn fetch_session(&self) -> Result<Option<RawAccount>, ApiError>;

    /// `POST /auth/login` with `{ email, password }`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Upstream`] carrying the service's status and message
    /// when the credentials are rejected.
    async fn login(&self, email: &str, password: &str) -> Result<RawAccount, ApiError>;

    /// `POST /auth/logout`. Succeeds when there was no session to end.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for network failures and non-2xx statuses other than `401`.
    async fn logout(&self) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

pub struct HttpAccountService {
    http: reqwest::Client,
    base_url: String,
    cookie_url: Url,
    jar: Arc<Jar>,
}

impl HttpAccountService {
    /// Build a client for `config.api_base_url`, seeding the cookie store with
    /// `config.session_cookie` when present.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the base URL does not parse or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &SessionConfig) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.trim_end_matches('/').to_owned();
        let cookie_url = Url::parse(&base_url).map_err(|e| ApiError::ClientBuild(format!("{base_url}: {e}")))?;

        let jar = Arc::new(Jar::default());
        if let Some(seed) = &config.session_cookie {
            for pair in seed.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
                jar.add_cookie_str(pair, &cookie_url);
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self { http, base_url, cookie_url, jar })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current `Cookie` header value the client would send, if any.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.cookie_url)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
    }

    fn endpoint(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }
}

#[async_trait::async_trait]
impl AccountService for HttpAccountService {
    async fn fetch_session(&self) -> Result<Option<RawAccount>, ApiError> {
        let response = self
            .http
            .get(self.endpoint(SESSION_ENDPOINT))
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!("account service reports no active session");
            return Ok(None);
        }

        let body = response.text().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }
        parse_session_body(&body)
    }

    async fn login(&self, email: &str, password: &str) -> Result<RawAccount, ApiError> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let response = self
            .http
            .post(self.endpoint(LOGIN_ENDPOINT))
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }
        parse_login_body(&body)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.endpoint(LOGOUT_ENDPOINT))
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let body = response.text().await.map_err(network_error)?;
        Err(upstream_error(status.as_u16(), &body))
    }
}

// =============================================================================
// WIRE TYPES + PARSING
// =============================================================================

#[derive(Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    user: Option<RawAccount>,
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn network_error(error: reqwest::Error) -> ApiError {
    ApiError::Network(error.to_string())
}

/// `{ "user": RawAccount | null }`; an empty body also means no session.
fn parse_session_body(body: &str) -> Result<Option<RawAccount>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: UserEnvelope = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(envelope.user)
}

fn parse_login_body(body: &str) -> Result<RawAccount, ApiError> {
    let envelope: UserEnvelope = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    envelope
        .user
        .ok_or_else(|| ApiError::Decode("login response missing user".into()))
}

/// Build an upstream error, pulling the message from `message`, then `error`,
/// then the raw body, then the status reason phrase.
fn upstream_error(status: u16, body: &str) -> ApiError {
    let from_json = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|json| {
        ["message", "error"]
            .iter()
            .find_map(|key| json.get(*key).and_then(serde_json::Value::as_str).map(str::to_owned))
    });

    let message = from_json
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_owned()).filter(|m| !m.is_empty() && !m.starts_with('{')))
        .or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| format!("request failed: {status}"));

    ApiError::Upstream { status, message }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
