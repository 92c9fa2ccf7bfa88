//! Interface to the external identity service.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credential::Credential;
use super::error::AuthError;

/// A principal as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Identity-change callback. Invoked by the identity service on its own
/// schedule with the new principal, or `None` when the session ended.
pub type ChangeCallback = Arc<dyn Fn(Option<Principal>) + Send + Sync>;

/// Registration token returned by [`IdentityService::add_change_listener`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(Uuid);

impl ListenerHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerHandle({})", self.0)
    }
}

/// Remote identity provider the core signs in against.
///
/// Passed explicitly into the orchestrator and listener; there is no global
/// client.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError>;

    async fn create_user(&self, email: &str, password: &str) -> Result<Principal, AuthError>;

    async fn exchange_credential(&self, credential: Credential) -> Result<Principal, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The principal the service currently considers signed in.
    fn current_principal(&self) -> Option<Principal>;

    fn add_change_listener(&self, callback: ChangeCallback) -> ListenerHandle;

    /// Removing an unknown or already-removed handle is a no-op.
    fn remove_change_listener(&self, handle: ListenerHandle);
}
