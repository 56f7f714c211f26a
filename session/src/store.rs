//! Session Store: the single authoritative holder of [`Session`].
//!
//! DESIGN
//! ======
//! Every operation (`login`, `logout`, `refresh`) takes a ticket from a
//! monotonically increasing sequence before it awaits the network, flips the
//! published state to `Loading`, and on completion commits its result only if
//! its ticket is still the latest one issued. A slow response from an older
//! request can therefore never overwrite what a newer request wrote.
//!
//! The last committed (non-loading) session is kept aside so a failed login
//! can put back exactly what was there before the attempt. An operation whose
//! future is dropped before it finishes puts it back the same way, provided no
//! newer operation has started since.
//!
//! Published state lives in a `watch` channel: readers take cheap snapshots or
//! subscribe to transitions. All writes go through the ledger mutex, so
//! "check ticket, then publish" is atomic.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::account::{AccountRecord, RawAccount};
use crate::client::AccountService;
use crate::error::ApiError;

// =============================================================================
// SESSION
// =============================================================================

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Constructed, no session check issued yet.
    #[default]
    Uninitialized,
    /// An operation is in flight; no authorization decision should be made.
    Loading,
    Authenticated,
    Anonymous,
}

/// Client-local belief about who is signed in.
///
/// Constructors enforce `status == Authenticated` iff `user` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    status: SessionStatus,
    user: Option<AccountRecord>,
}

impl Session {
    #[must_use]
    pub fn uninitialized() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn loading() -> Self {
        Self { status: SessionStatus::Loading, user: None }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { status: SessionStatus::Anonymous, user: None }
    }

    #[must_use]
    pub fn authenticated(user: AccountRecord) -> Self {
        Self { status: SessionStatus::Authenticated, user: Some(user) }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn user(&self) -> Option<&AccountRecord> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// True until the first session check resolves, and while any operation is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.status, SessionStatus::Uninitialized | SessionStatus::Loading)
    }

    /// True iff a user is present and their role equals any candidate, ignoring case.
    #[must_use]
    pub fn has_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| roles.iter().any(|role| user.role_is(role.as_ref())))
    }
}

// =============================================================================
// STORE
// =============================================================================

struct Ledger {
    /// Ticket of the most recently started operation.
    issued: u64,
    /// Last committed session, never `Loading`.
    settled: Session,
}

pub struct SessionStore {
    service: Arc<dyn AccountService>,
    state: watch::Sender<Session>,
    ledger: Mutex<Ledger>,
}

impl SessionStore {
    #[must_use]
    pub fn new(service: Arc<dyn AccountService>) -> Self {
        let (state, _) = watch::channel(Session::uninitialized());
        Self {
            service,
            state,
            ledger: Mutex::new(Ledger { issued: 0, settled: Session::uninitialized() }),
        }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<AccountRecord> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status() == SessionStatus::Loading
    }

    /// Case-insensitive role check; false when nobody is signed in.
    #[must_use]
    pub fn has_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.state.borrow().has_role(roles)
    }

    /// Sign in. On failure the previously committed session is restored
    /// unchanged and the upstream error is returned for display.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the Account Service, or a decode error if
    /// the returned account cannot be normalized.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccountRecord, ApiError> {
        let flight = self.begin();
        let result = self
            .service
            .login(email, password)
            .await
            .and_then(RawAccount::into_record);

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "login succeeded");
                flight.commit(Session::authenticated(user.clone()));
                Ok(user)
            }
            Err(error) => {
                warn!(%error, status = ?error.status(), "login failed");
                let restored = restore(flight.prior.clone());
                flight.commit(restored);
                Err(error)
            }
        }
    }

    /// Sign out. Local state is always cleared, whatever the service says.
    pub async fn logout(&self) {
        let flight = self.begin();
        if let Err(error) = self.service.logout().await {
            warn!(%error, "logout request failed; clearing local session anyway");
        }
        info!("logged out");
        flight.commit(Session::anonymous());
    }

    /// Re-check the session with the Account Service.
    ///
    /// Any failure collapses the session to `Anonymous`; a stale session is
    /// never kept. A `401` is the normal "signed out" answer and is not an error.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] for non-401 failures after the state has been
    /// cleared, so callers may display it.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let flight = self.begin();
        let result = match self.service.fetch_session().await {
            Ok(Some(raw)) => raw.into_record().map(Some),
            Ok(None) => Ok(None),
            Err(error) => Err(error),
        };

        match result {
            Ok(Some(user)) => {
                debug!(user_id = %user.id, "session refreshed");
                flight.commit(Session::authenticated(user));
                Ok(())
            }
            Ok(None) => {
                debug!("no active session");
                flight.commit(Session::anonymous());
                Ok(())
            }
            Err(error) => {
                warn!(%error, "session refresh failed; treating as signed out");
                flight.commit(Session::anonymous());
                Err(error)
            }
        }
    }

    /// Issue a ticket and publish `Loading`. The returned [`InFlight`] must be
    /// committed; dropping it uncommitted puts the settled session back.
    fn begin(&self) -> InFlight<'_> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.issued += 1;
        self.state.send_replace(Session::loading());
        InFlight { store: self, ticket: ledger.issued, prior: ledger.settled.clone(), finished: false }
    }

    /// Publish `next` if `ticket` is still the latest. Returns whether it was applied.
    fn commit(&self, ticket: u64, next: Session) -> bool {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        if ledger.issued != ticket {
            debug!(ticket, latest = ledger.issued, "discarding stale session result");
            return false;
        }
        ledger.settled = next.clone();
        self.state.send_replace(next);
        true
    }
}

/// One started operation. Holds its ticket and the session settled when it began.
struct InFlight<'a> {
    store: &'a SessionStore,
    ticket: u64,
    prior: Session,
    finished: bool,
}

impl InFlight<'_> {
    fn commit(mut self, next: Session) {
        self.finished = true;
        self.store.commit(self.ticket, next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let prior = std::mem::take(&mut self.prior);
        if self.store.commit(self.ticket, prior) {
            debug!(ticket = self.ticket, "session operation cancelled; settled session restored");
        }
    }
}

/// A failed login issued before any session check resolved restores to `Anonymous`.
fn restore(prior: Session) -> Session {
    if prior.status() == SessionStatus::Uninitialized { Session::anonymous() } else { prior }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "store_helpers_test.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
