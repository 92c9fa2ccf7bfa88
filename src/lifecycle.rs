//! Start-up and shutdown of the session core.

use std::sync::Arc;

use crate::auth::{
    IdentityListener, IdentityService, ListenerSubscription, NonceGenerator, SignInOrchestrator,
};
use crate::auth::platform::{AppleSignInUi, GoogleSignInUi};
use crate::config::AuthConfig;
use crate::session::{Session, SessionStateStore};

/// Collaborators the core is built from. No ambient globals.
pub struct CoreDependencies {
    pub identity: Arc<dyn IdentityService>,
    pub config: Arc<AuthConfig>,
    pub google_ui: Arc<dyn GoogleSignInUi>,
    pub apple_ui: Arc<dyn AppleSignInUi>,
}

/// Store + listener + orchestrator, wired together.
///
/// [`SessionCore::start`] subscribes to identity changes;
/// [`SessionCore::shutdown`] releases that subscription. Shutdown consumes
/// the core, so the subscription is released exactly once.
pub struct SessionCore {
    store: Arc<SessionStateStore>,
    orchestrator: SignInOrchestrator,
    subscription: Option<ListenerSubscription>,
}

impl SessionCore {
    /// Build the core and subscribe to identity changes.
    ///
    /// The store is seeded with the identity service's current principal.
    /// Must be called from within a Tokio runtime.
    pub fn start(deps: CoreDependencies) -> Self {
        let initial = deps.identity.current_principal().map(Session::from);
        let store = Arc::new(SessionStateStore::new(initial));

        let subscription = IdentityListener::new(deps.identity.clone()).subscribe(store.clone());
        let orchestrator = SignInOrchestrator::new(
            store.clone(),
            deps.identity,
            deps.config.clone(),
            deps.google_ui,
            deps.apple_ui,
            NonceGenerator::new(deps.config.nonce_length),
        );
        tracing::debug!(logged_in = store.is_logged_in(), "session core started");

        Self {
            store,
            orchestrator,
            subscription: Some(subscription),
        }
    }

    pub fn store(&self) -> &Arc<SessionStateStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &SignInOrchestrator {
        &self.orchestrator
    }

    /// Unsubscribe from identity changes and tear down.
    pub async fn shutdown(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
        }
        tracing::debug!("session core shut down");
    }
}

impl Drop for SessionCore {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            tracing::warn!(
                handle = ?subscription.handle(),
                "session core dropped without shutdown; identity callback stays registered"
            );
            subscription.abandon();
        }
    }
}
