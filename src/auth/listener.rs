//! Identity-change subscription.
//!
//! The identity service calls back from whatever context it likes. The
//! callback installed here only forwards into a channel; a single owner task
//! drains the channel and is the only listener-side writer of the store.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::identity::{ChangeCallback, IdentityService, ListenerHandle, Principal};
use crate::session::{Session, SessionStateStore};

/// Subscribes the session store to identity-change notifications.
#[derive(Clone)]
pub struct IdentityListener {
    identity: Arc<dyn IdentityService>,
}

impl IdentityListener {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self { identity }
    }

    /// Register with the identity service and start the owner task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, store: Arc<SessionStateStore>) -> ListenerSubscription {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Option<Principal>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let pump = tokio::spawn(run_owner(store, event_rx, shutdown_rx));

        let callback: ChangeCallback = Arc::new(move |principal| {
            if event_tx.send(principal).is_err() {
                tracing::debug!("identity change arrived after listener shut down");
            }
        });
        let handle = self.identity.add_change_listener(callback);
        tracing::debug!(?handle, "subscribed to identity changes");

        ListenerSubscription {
            handle,
            identity: self.identity.clone(),
            shutdown: Some(shutdown_tx),
            pump: Some(pump),
        }
    }
}

/// Live registration with the identity service.
///
/// Release it with [`unsubscribe`](Self::unsubscribe); consuming `self`
/// guarantees it happens at most once.
pub struct ListenerSubscription {
    handle: ListenerHandle,
    identity: Arc<dyn IdentityService>,
    shutdown: Option<oneshot::Sender<()>>,
    pump: Option<JoinHandle<()>>,
}

impl ListenerSubscription {
    pub fn handle(&self) -> ListenerHandle {
        self.handle
    }

    /// Remove the callback from the identity service and stop the owner task.
    pub async fn unsubscribe(mut self) {
        self.identity.remove_change_listener(self.handle);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(pump) = self.pump.take() {
            if let Err(err) = pump.await {
                tracing::warn!(error = %err, "identity listener task failed");
            }
        }
        tracing::debug!(handle = ?self.handle, "unsubscribed from identity changes");
    }

    /// Give up the subscription without removing the callback; the owner
    /// task stops once this value is gone. Used when the caller reports the
    /// missed shutdown itself.
    pub(crate) fn abandon(mut self) {
        self.pump.take();
    }
}

impl Drop for ListenerSubscription {
    fn drop(&mut self) {
        if self.pump.is_some() {
            tracing::warn!(
                handle = ?self.handle,
                "listener subscription dropped without unsubscribe; callback stays registered"
            );
        }
    }
}

async fn run_owner(
    store: Arc<SessionStateStore>,
    mut events: mpsc::UnboundedReceiver<Option<Principal>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(principal) => apply(&store, principal),
                None => break,
            },
            _ = &mut shutdown => break,
        }
    }
}

fn apply(store: &SessionStateStore, principal: Option<Principal>) {
    store.replace_session_if_changed(principal.map(Session::from));
}
