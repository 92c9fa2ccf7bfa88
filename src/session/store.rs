use futures::stream::{BoxStream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::model::Session;
use super::state::AuthOperationState;

/// Point-in-time view of the store.
///
/// `version` increases by one on every mutation, so observers can tell two
/// equal-looking snapshots apart and detect missed updates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub operation: AuthOperationState,
    pub version: u64,
}

impl SessionSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }
}

/// Single source of truth for who is signed in and how the last operation went.
///
/// Both fields live in one `watch` value, replaced under the channel's lock,
/// so readers never see a session from one update paired with an operation
/// state from another. Writers are limited to this crate: the orchestrator
/// and the identity listener's owner task.
#[derive(Debug)]
pub struct SessionStateStore {
    tx: watch::Sender<SessionSnapshot>,
}

impl Default for SessionStateStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStateStore {
    /// Create a store seeded with whatever session the identity service
    /// already knows about.
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot {
            session: initial,
            operation: AuthOperationState::Idle,
            version: 0,
        });
        Self { tx }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().session.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.tx.borrow().session.is_some()
    }

    pub fn operation_state(&self) -> AuthOperationState {
        self.tx.borrow().operation.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    /// Subscribe to snapshot changes via a [`watch::Receiver`].
    ///
    /// Callers can `.changed().await` or `.wait_for(..)` on the receiver.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Stream of snapshots, starting with the current one.
    ///
    /// Intermediate snapshots may be skipped when the consumer falls behind;
    /// the latest one is always delivered.
    pub fn observe(&self) -> BoxStream<'static, SessionSnapshot> {
        WatchStream::new(self.tx.subscribe()).boxed()
    }

    /// Swap in `session` unless the store already holds an equal one.
    ///
    /// Compare and write happen under the channel's lock, so an orchestrator
    /// commit cannot land in between. Returns whether the store changed.
    pub(crate) fn replace_session_if_changed(&self, session: Option<Session>) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.session == session {
                return false;
            }
            log_transition(snapshot.session.as_ref(), session.as_ref());
            snapshot.session = session;
            snapshot.version += 1;
            true
        })
    }

    pub(crate) fn set_operation_state(&self, operation: AuthOperationState) {
        self.tx.send_modify(|snapshot| {
            snapshot.operation = operation;
            snapshot.version += 1;
        });
    }

    /// Drop a stale `Failed` back to `Idle`; any other state is left alone.
    pub(crate) fn clear_failure(&self) {
        self.tx.send_if_modified(|snapshot| {
            if !matches!(snapshot.operation, AuthOperationState::Failed(_)) {
                return false;
            }
            snapshot.operation = AuthOperationState::Idle;
            snapshot.version += 1;
            true
        });
    }

    /// Replace session and operation state as one update.
    pub(crate) fn commit(&self, session: Option<Session>, operation: AuthOperationState) {
        self.tx.send_modify(|snapshot| {
            log_transition(snapshot.session.as_ref(), session.as_ref());
            snapshot.session = session;
            snapshot.operation = operation;
            snapshot.version += 1;
        });
    }
}

fn log_transition(previous: Option<&Session>, next: Option<&Session>) {
    match (previous, next) {
        (None, Some(next)) => tracing::info!(subject = %next.subject(), "session established"),
        (Some(previous), None) => {
            tracing::info!(subject = %previous.subject(), "session cleared")
        }
        (Some(previous), Some(next)) if previous.subject() != next.subject() => tracing::info!(
            from = %previous.subject(),
            to = %next.subject(),
            "session replaced"
        ),
        _ => {}
    }
}
