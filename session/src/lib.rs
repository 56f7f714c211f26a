//! Session and access layer for the storefront dashboards.
//!
//! This crate owns the client-side view of "who is signed in": it talks to the
//! remote Account Service, keeps the current [`Session`] in a [`SessionStore`],
//! revalidates it on a timer and on focus, and answers access questions through
//! the guards in [`guard`] and [`route`].
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` is the only code that performs network I/O. `store` is the only
//! code that mutates session state. `guard` and `route` are pure decisions and
//! never see transport errors.

pub mod account;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod route;
pub mod store;

pub use account::{AccountRecord, RawAccount};
pub use client::{AccountService, HttpAccountService};
pub use config::{RouteGuardConfig, SessionConfig};
pub use context::{FocusSignal, SessionContext};
pub use error::{ApiError, ConfigError};
pub use guard::{AuthGuard, Decision, Denial, DenialReason, RoleAllowList, RoleGuard};
pub use route::{RouteDecision, RouteGuard};
pub use store::{Session, SessionStatus, SessionStore};
