//! Route Guard: a request-time check for protected paths.
//!
//! Runs before any page rendering. It inspects only the request path and the
//! cookie names, never validates the session with the Account Service, and
//! leaves the authoritative check to the Session Store on the rendered page.

use crate::config::RouteGuardConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Let the request through unchanged.
    Continue,
    /// Temporary redirect to this location.
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    config: RouteGuardConfig,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(RouteGuardConfig::default())
    }
}

impl RouteGuard {
    #[must_use]
    pub fn new(config: RouteGuardConfig) -> Self {
        Self { config }
    }

    /// Decide what to do with a request for `path` carrying `cookies` as
    /// `(name, value)` pairs.
    pub fn decide<'a, I>(&self, path: &str, cookies: I) -> RouteDecision
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if self.is_excluded(path) || !self.is_protected(path) {
            return RouteDecision::Continue;
        }
        if self.has_session_cookie(cookies) {
            return RouteDecision::Continue;
        }
        RouteDecision::Redirect(self.login_redirect(path))
    }

    /// Static assets (by configured extension) and framework internals.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.config.excluded_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return true;
        }
        let last = path.rsplit('/').next().unwrap_or_default();
        last.rsplit_once('.').is_some_and(|(stem, ext)| {
            !stem.is_empty() && self.config.static_extensions.iter().any(|known| known.eq_ignore_ascii_case(ext))
        })
    }

    /// `/dashboard` protects `/dashboard` and `/dashboard/...` but not `/dashboards`.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.config.protected_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            if prefix.is_empty() {
                return true;
            }
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// A recognized cookie with a non-empty value.
    fn has_session_cookie<'a, I>(&self, cookies: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        cookies.into_iter().any(|(name, value)| {
            !value.trim().is_empty() && self.config.session_cookie_names.iter().any(|known| known == name)
        })
    }

    /// Login location carrying the original path as `next`.
    #[must_use]
    pub fn login_redirect(&self, path: &str) -> String {
        format!("{}?next={}", self.config.login_path, encode_next(path))
    }
}

/// Escape only what would break the query string; slashes stay readable.
fn encode_next(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '+' => out.push_str("%2B"),
            '#' => out.push_str("%23"),
            ' ' => out.push_str("%20"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
