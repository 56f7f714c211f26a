//! Session and route-guard configuration parsed from environment variables.
//!
//! Every `from_env` has a `from_lookup` twin that takes the variable source
//! as a closure, so tests can feed a map instead of mutating process env.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_ACCOUNT_API_URL: &str = "http://127.0.0.1:4000/api";
pub const DEFAULT_REVALIDATE_SECS: u64 = 600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &["/dashboard"];
pub const DEFAULT_SESSION_COOKIE_NAMES: &[&str] = &["sid", "session", "session_token", "connect.sid", "token"];
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["/_next/", "/static/", "/assets/", "/favicon.ico", "/robots.txt"];
/// Asset types served without a cookie check. Data formats (`json`, `xml`,
/// `txt`) are absent so `/dashboard/orders.json` stays guarded.
pub const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "ico", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "woff", "woff2", "ttf", "otf",
    "eot",
];

// =============================================================================
// SESSION CONFIG
// =============================================================================

/// Settings for the Session Client and the revalidation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the Account Service; endpoint paths are appended to it.
    pub api_base_url: String,
    /// Period of the background session refresh.
    pub revalidate_interval: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Pre-existing `Cookie` header value (e.g. `sid=abc`) to seed the cookie store with.
    pub session_cookie: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_ACCOUNT_API_URL.to_owned(),
            revalidate_interval: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            session_cookie: None,
        }
    }
}

impl SessionConfig {
    /// Build from process environment.
    ///
    /// Optional:
    /// - `ACCOUNT_API_URL`: default `http://127.0.0.1:4000/api`
    /// - `SESSION_REVALIDATE_SECS`: default 600, must be non-zero
    /// - `SESSION_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SESSION_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STOREFRONT_SESSION_COOKIE`: cookie pairs to send before any login
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the base URL is not http(s) or a duration is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("ACCOUNT_API_URL")
            .map(|raw| raw.trim().trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_ACCOUNT_API_URL.to_owned());
        if api_base_url.is_empty() {
            return Err(ConfigError::Empty { key: "ACCOUNT_API_URL" });
        }
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid { key: "ACCOUNT_API_URL", value: api_base_url });
        }

        Ok(Self {
            api_base_url,
            revalidate_interval: non_zero_secs(&lookup, "SESSION_REVALIDATE_SECS", DEFAULT_REVALIDATE_SECS)?,
            request_timeout: non_zero_secs(&lookup, "SESSION_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_timeout: non_zero_secs(&lookup, "SESSION_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            session_cookie: lookup("STOREFRONT_SESSION_COOKIE")
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty()),
        })
    }
}

// =============================================================================
// ROUTE GUARD CONFIG
// =============================================================================

/// Static configuration for the transport-level route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuardConfig {
    /// Path prefixes that require a session cookie, in match order.
    pub protected_prefixes: Vec<String>,
    /// Cookie names whose presence counts as "has a session".
    pub session_cookie_names: Vec<String>,
    /// Static-asset and framework-internal prefixes that are never guarded.
    pub excluded_prefixes: Vec<String>,
    /// Lowercase file extensions (no dot) that are never guarded.
    pub static_extensions: Vec<String>,
    /// Login entry point used as the redirect target.
    pub login_path: String,
}

impl Default for RouteGuardConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: owned(DEFAULT_PROTECTED_PREFIXES),
            session_cookie_names: owned(DEFAULT_SESSION_COOKIE_NAMES),
            excluded_prefixes: owned(DEFAULT_EXCLUDED_PREFIXES),
            static_extensions: owned(DEFAULT_STATIC_EXTENSIONS),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
        }
    }
}

impl RouteGuardConfig {
    /// Build from process environment.
    ///
    /// Optional (comma-separated lists):
    /// - `PROTECTED_PREFIXES`: default `/dashboard`
    /// - `SESSION_COOKIE_NAMES`: default `sid,session,session_token,connect.sid,token`
    /// - `ROUTE_GUARD_EXCLUDED`: default `/_next/,/static/,/assets/,/favicon.ico,/robots.txt`
    /// - `ROUTE_GUARD_STATIC_EXTENSIONS`: default `css,js,mjs,ico,png,...`; empty disables
    /// - `LOGIN_PATH`: default `/auth/login`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a prefix or the login path is not absolute,
    /// or if the cookie-name list is explicitly empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`RouteGuardConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let protected_prefixes = lookup("PROTECTED_PREFIXES")
            .map(|raw| parse_list(&raw))
            .unwrap_or(defaults.protected_prefixes);
        require_absolute("PROTECTED_PREFIXES", &protected_prefixes)?;

        let session_cookie_names = lookup("SESSION_COOKIE_NAMES")
            .map(|raw| parse_list(&raw))
            .unwrap_or(defaults.session_cookie_names);
        if session_cookie_names.is_empty() {
            return Err(ConfigError::Empty { key: "SESSION_COOKIE_NAMES" });
        }

        let excluded_prefixes = lookup("ROUTE_GUARD_EXCLUDED")
            .map(|raw| parse_list(&raw))
            .unwrap_or(defaults.excluded_prefixes);
        require_absolute("ROUTE_GUARD_EXCLUDED", &excluded_prefixes)?;

        let static_extensions = lookup("ROUTE_GUARD_STATIC_EXTENSIONS")
            .map(|raw| parse_extensions(&raw))
            .unwrap_or(defaults.static_extensions);

        let login_path = lookup("LOGIN_PATH")
            .map(|raw| raw.trim().to_owned())
            .unwrap_or(defaults.login_path);
        if !login_path.starts_with('/') {
            return Err(ConfigError::Invalid { key: "LOGIN_PATH", value: login_path });
        }

        Ok(Self {
            protected_prefixes,
            session_cookie_names,
            excluded_prefixes,
            static_extensions,
            login_path,
        })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `.PNG, svg` becomes `["png", "svg"]`.
fn parse_extensions(raw: &str) -> Vec<String> {
    parse_list(raw)
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn require_absolute(key: &'static str, prefixes: &[String]) -> Result<(), ConfigError> {
    match prefixes.iter().find(|prefix| !prefix.starts_with('/')) {
        Some(bad) => Err(ConfigError::Invalid { key, value: bad.clone() }),
        None => Ok(()),
    }
}

/// Parse a seconds value, falling back to `default` when unset or unparseable.
pub(crate) fn env_parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn non_zero_secs<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = env_parse(lookup, key, default);
    if secs == 0 {
        return Err(ConfigError::Invalid { key, value: secs.to_string() });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
