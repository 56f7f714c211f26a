//! Access Guards: pure decisions over a [`Session`].
//!
//! A guard never renders. It returns a [`Decision`] and the presentation layer
//! picks what to show: protected content on `Pass`, a neutral loading
//! indicator on `Pending`, and on `Denied` either the call-site fallback or a
//! built-in message derived from the [`DenialReason`].

use std::fmt;

use crate::config::DEFAULT_LOGIN_PATH;
use crate::store::Session;

/// Why a guard refused access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// Nobody is signed in; the view should offer a way to log in.
    LoginRequired { login_path: String },
    /// A role-gated view was reached without a session.
    AuthenticationRequired,
    /// Signed in, but the role is not on the allow list.
    InsufficientPermissions { role: Option<String>, allowed: Vec<String> },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginRequired { login_path } => write!(f, "Login required. Sign in at {login_path} to continue."),
            Self::AuthenticationRequired => write!(f, "Authentication required."),
            Self::InsufficientPermissions { role, .. } => write!(
                f,
                "Insufficient permissions: your current role is '{}'.",
                role.as_deref().unwrap_or("none")
            ),
        }
    }
}

/// A refusal plus the call site's fallback, if it supplied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial<F> {
    pub reason: DenialReason,
    pub fallback: Option<F>,
}

impl<F> Denial<F> {
    /// The call-site fallback, or `default` applied to the reason.
    pub fn fallback_or_else(self, default: impl FnOnce(&DenialReason) -> F) -> F {
        match self.fallback {
            Some(fallback) => fallback,
            None => default(&self.reason),
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<F = ()> {
    /// Render the protected content.
    Pass,
    /// Session not resolved yet; render a neutral loading state.
    Pending,
    Denied(Denial<F>),
}

impl<F> Decision<F> {
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The denial reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            Self::Denied(denial) => Some(&denial.reason),
            Self::Pass | Self::Pending => None,
        }
    }

    fn denied(reason: DenialReason, fallback: Option<F>) -> Self {
        Self::Denied(Denial { reason, fallback })
    }
}

// =============================================================================
// ROLE ALLOW LIST
// =============================================================================

/// Ordered, case-insensitively de-duplicated set of permitted roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAllowList {
    roles: Vec<String>,
}

impl RoleAllowList {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for role in roles {
            let role = role.as_ref().trim();
            if role.is_empty() || out.iter().any(|seen| seen.eq_ignore_ascii_case(role)) {
                continue;
            }
            out.push(role.to_owned());
        }
        Self { roles: out }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.roles
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    #[must_use]
    pub fn permits(&self, role: &str) -> bool {
        self.roles.iter().any(|allowed| allowed.eq_ignore_ascii_case(role.trim()))
    }
}

// =============================================================================
// GUARDS
// =============================================================================

/// "Authenticated or redirect to login."
#[derive(Debug, Clone)]
pub struct AuthGuard<F = ()> {
    login_path: String,
    fallback: Option<F>,
}

impl<F> Default for AuthGuard<F> {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PATH)
    }
}

impl<F> AuthGuard<F> {
    /// `F` is the call site's fallback type; it is fixed here even when no
    /// fallback is supplied, so a denial can always be rendered as `F`.
    #[must_use]
    pub fn new(login_path: impl Into<String>) -> Self {
        Self { login_path: login_path.into(), fallback: None }
    }

    /// Replace the built-in "login required" denial with `fallback`.
    #[must_use]
    pub fn with_fallback(mut self, fallback: F) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl<F: Clone> AuthGuard<F> {
    #[must_use]
    pub fn decide(&self, session: &Session) -> Decision<F> {
        if session.is_pending() {
            return Decision::Pending;
        }
        if session.is_authenticated() {
            return Decision::Pass;
        }
        Decision::denied(
            DenialReason::LoginRequired { login_path: self.login_path.clone() },
            self.fallback.clone(),
        )
    }
}

/// "Role permitted or fallback."
#[derive(Debug, Clone)]
pub struct RoleGuard<F = ()> {
    allow: RoleAllowList,
    fallback: Option<F>,
}

impl<F> RoleGuard<F> {
    #[must_use]
    pub fn new(allow: RoleAllowList) -> Self {
        Self { allow, fallback: None }
    }

    /// Replace both built-in denials with `fallback`.
    #[must_use]
    pub fn with_fallback(mut self, fallback: F) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl<F: Clone> RoleGuard<F> {
    #[must_use]
    pub fn decide(&self, session: &Session) -> Decision<F> {
        if session.is_pending() {
            return Decision::Pending;
        }
        let Some(user) = session.user() else {
            return Decision::denied(DenialReason::AuthenticationRequired, self.fallback.clone());
        };
        if session.has_role(self.allow.as_slice()) {
            return Decision::Pass;
        }
        Decision::denied(
            DenialReason::InsufficientPermissions {
                role: user.role.clone(),
                allowed: self.allow.as_slice().to_vec(),
            },
            self.fallback.clone(),
        )
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
