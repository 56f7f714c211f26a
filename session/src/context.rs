//! Session context: owns a store plus its revalidation task for one client lifetime.
//!
//! SYSTEM CONTEXT
//! ==============
//! Created once at application-root scope and handed to consumers by
//! reference. Starting the context issues the initial session check and sets
//! up the two revalidation triggers; dropping or shutting it down cancels
//! them, so remounting never leaks a timer.
//!
//! DESIGN
//! ======
//! One spawned task selects over an interval ticker and a focus signal. The
//! ticker's first tick fires immediately and doubles as the initial check.
//! Focus signals coalesce: several focus events during one refresh produce a
//! single follow-up refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::AccountService;
use crate::store::SessionStore;

/// Handle used by the host environment to report "the app regained focus".
#[derive(Clone, Default)]
pub struct FocusSignal {
    notify: Arc<Notify>,
}

impl FocusSignal {
    /// Request an immediate session refresh.
    pub fn focus_regained(&self) {
        self.notify.notify_one();
    }

    async fn regained(&self) {
        self.notify.notified().await;
    }
}

/// Shortest revalidation period; a zero interval would spin the ticker.
const MIN_REVALIDATE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Timer,
    Focus,
}

pub struct SessionContext {
    store: Arc<SessionStore>,
    focus: FocusSignal,
    revalidation: Option<JoinHandle<()>>,
}

impl SessionContext {
    /// Start a context around an existing store. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(store: Arc<SessionStore>, revalidate_interval: Duration) -> Self {
        let focus = FocusSignal::default();
        if revalidate_interval < MIN_REVALIDATE_INTERVAL {
            warn!(requested = ?revalidate_interval, "revalidation interval too short; clamping");
        }
        let revalidate_interval = revalidate_interval.max(MIN_REVALIDATE_INTERVAL);
        info!(interval_secs = revalidate_interval.as_secs(), "session revalidation configured");
        let revalidation = spawn_revalidation_task(Arc::clone(&store), revalidate_interval, focus.clone());
        Self { store, focus, revalidation: Some(revalidation) }
    }

    /// Build a store over `service` and start a context around it.
    #[must_use]
    pub fn with_service(service: Arc<dyn AccountService>, revalidate_interval: Duration) -> Self {
        Self::start(Arc::new(SessionStore::new(service)), revalidate_interval)
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn focus_signal(&self) -> FocusSignal {
        self.focus.clone()
    }

    /// Cancel revalidation and wait for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.revalidation.take() {
            task.abort();
            match task.await {
                Err(error) if error.is_panic() => warn!(%error, "session revalidation task panicked"),
                _ => debug!("session revalidation stopped"),
            }
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        if let Some(task) = self.revalidation.take() {
            task.abort();
        }
    }
}

fn spawn_revalidation_task(store: Arc<SessionStore>, interval: Duration, focus: FocusSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => Trigger::Timer,
                () = focus.regained() => Trigger::Focus,
            };
            debug!(?trigger, "revalidating session");
            if let Err(error) = store.refresh().await {
                warn!(%error, ?trigger, "session revalidation failed");
            }
        }
    })
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
