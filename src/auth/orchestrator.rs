//! Public sign-in API for the UI.

use std::future::Future;
use std::sync::Arc;

use super::error::{AuthError, AuthErrorKind};
use super::exchange::{AppleAttempt, AppleExchange, GoogleExchange, PasswordExchange};
use super::identity::IdentityService;
use super::nonce::NonceGenerator;
use super::platform::{
    AppleAuthorization, AppleSignInUi, GoogleSignInUi, PlatformError, PresentingSurface,
};
use crate::config::AppConfiguration;
use crate::session::{AuthFailure, AuthOperationState, Session, SessionStateStore};

/// Coordinates the credential exchangers and the session store.
///
/// Every operation moves the store's operation state to `InFlight`, runs one
/// exchanger, then records either the new session with `Succeeded` or a
/// `Failed` reason. Failures never touch the current session and never
/// propagate past this type; the returned state mirrors what was stored.
///
/// Overlapping operations are not serialized: each writes its own outcome
/// when it finishes, so the last one to complete wins.
///
/// # Example
///
/// ```ignore
/// let state = orchestrator.sign_in("a@x.com", "pw1").await;
/// if let Some(message) = state.error_message() {
///     show_error(message);
/// }
/// ```
pub struct SignInOrchestrator {
    store: Arc<SessionStateStore>,
    identity: Arc<dyn IdentityService>,
    password: PasswordExchange,
    google: GoogleExchange,
    apple: AppleExchange,
}

impl SignInOrchestrator {
    pub fn new(
        store: Arc<SessionStateStore>,
        identity: Arc<dyn IdentityService>,
        config: Arc<dyn AppConfiguration>,
        google_ui: Arc<dyn GoogleSignInUi>,
        apple_ui: Arc<dyn AppleSignInUi>,
        nonces: NonceGenerator,
    ) -> Self {
        Self {
            password: PasswordExchange::new(identity.clone()),
            google: GoogleExchange::new(identity.clone(), config, google_ui),
            apple: AppleExchange::new(identity.clone(), apple_ui, nonces),
            store,
            identity,
        }
    }

    pub fn store(&self) -> &Arc<SessionStateStore> {
        &self.store
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthOperationState {
        self.run("sign_in", self.password.sign_in(email, password))
            .await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthOperationState {
        self.run("sign_up", self.password.sign_up(email, password))
            .await
    }

    pub async fn sign_in_with_google(&self, surface: &PresentingSurface) -> AuthOperationState {
        self.run("sign_in_with_google", self.google.exchange(surface))
            .await
    }

    /// Full Apple flow: fresh nonce, sheet, exchange.
    pub async fn sign_in_with_apple(&self) -> AuthOperationState {
        self.run("sign_in_with_apple", self.apple.exchange()).await
    }

    /// First half of an Apple flow driven by the UI's own sheet.
    ///
    /// Moves the store to `InFlight` until the attempt is completed. The
    /// returned attempt carries the request to present. A failure here
    /// (no secure random source) is recorded in the store like any other.
    pub fn begin_apple_sign_in(&self) -> Result<AppleAttempt, AuthFailure> {
        self.store.set_operation_state(AuthOperationState::InFlight);
        self.apple.begin().map_err(|err| {
            let failure = AuthFailure::from(&err);
            tracing::warn!(error = %err, "could not start Apple sign-in");
            self.store
                .set_operation_state(AuthOperationState::Failed(failure.clone()));
            failure
        })
    }

    /// Second half of an Apple flow; consumes the attempt.
    pub async fn complete_apple_sign_in(
        &self,
        attempt: AppleAttempt,
        outcome: Result<AppleAuthorization, PlatformError>,
    ) -> AuthOperationState {
        self.run("sign_in_with_apple", self.apple.complete(attempt, outcome))
            .await
    }

    /// Sign out at the identity service, then clear the local session.
    ///
    /// With no local session this only clears a leftover failure and always
    /// reports `Idle`.
    ///
    /// If the service reports an error, the local session is cleared only when
    /// the service confirms it no longer has a principal; otherwise the
    /// previous session is kept and the error recorded.
    pub async fn sign_out(&self) -> AuthOperationState {
        match self.identity.sign_out().await {
            Ok(()) => {
                if self.store.is_logged_in() {
                    self.store.commit(None, AuthOperationState::Idle);
                } else {
                    self.store.clear_failure();
                }
                AuthOperationState::Idle
            }
            Err(err) => {
                let state = AuthOperationState::Failed(AuthFailure::from(&err));
                if self.identity.current_principal().is_none() {
                    tracing::warn!(error = %err, "sign-out reported an error; provider has no session");
                    self.store.commit(None, state.clone());
                } else {
                    tracing::warn!(error = %err, "sign-out failed; keeping current session");
                    self.store.set_operation_state(state.clone());
                }
                state
            }
        }
    }

    async fn run<F>(&self, operation: &'static str, exchange: F) -> AuthOperationState
    where
        F: Future<Output = Result<Session, AuthError>>,
    {
        self.store.set_operation_state(AuthOperationState::InFlight);
        tracing::debug!(operation, "auth operation started");

        match exchange.await {
            Ok(session) => {
                tracing::debug!(operation, subject = %session.subject(), "auth operation succeeded");
                self.store
                    .commit(Some(session), AuthOperationState::Succeeded);
                AuthOperationState::Succeeded
            }
            Err(err) => {
                if err.kind() == AuthErrorKind::UserCancelled {
                    tracing::debug!(operation, "auth operation cancelled by user");
                } else {
                    tracing::warn!(operation, kind = %err.kind(), error = %err, "auth operation failed");
                }
                let state = AuthOperationState::Failed(AuthFailure::from(&err));
                self.store.set_operation_state(state.clone());
                state
            }
        }
    }
}
