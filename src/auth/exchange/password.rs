use std::sync::Arc;

use crate::auth::error::AuthError;
use crate::auth::identity::{IdentityService, Principal};
use crate::session::Session;

/// Email + password sign-in and sign-up.
///
/// After the round trip succeeds, the principal is re-read from the identity
/// service rather than taken from the response, so a provider that hands back
/// a stale cached principal cannot leak it into the session.
#[derive(Clone)]
pub struct PasswordExchange {
    identity: Arc<dyn IdentityService>,
}

impl PasswordExchange {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self { identity }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.identity.sign_in_with_password(email, password).await?;
        self.canonical_session("sign-in")
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.identity.create_user(email, password).await?;
        self.canonical_session("sign-up")
    }

    fn canonical_session(&self, operation: &str) -> Result<Session, AuthError> {
        let principal: Principal = self.identity.current_principal().ok_or_else(|| {
            tracing::warn!(operation, "identity service reported success but has no principal");
            AuthError::AuthenticationFailed(format!("{operation} did not produce a signed-in user"))
        })?;
        Ok(Session::from(principal))
    }
}
