//! Convenience re-exports.

pub use crate::auth::{
    AppleAttempt, AuthError, AuthErrorKind, Credential, IdentityService, Nonce, NonceGenerator,
    Principal, SignInOrchestrator,
};
pub use crate::config::{AppConfiguration, AuthConfig};
pub use crate::error::{ResalesError, Result};
pub use crate::lifecycle::{CoreDependencies, SessionCore};
pub use crate::session::{AuthFailure, AuthOperationState, Session, SessionSnapshot, SessionStateStore};
