//! Sign-in protocols, identity-service plumbing, and the orchestrator.

pub mod credential;
pub mod error;
pub mod exchange;
pub mod http;
pub mod identity;
pub mod listener;
pub mod nonce;
pub mod orchestrator;
pub mod platform;

pub use credential::{Credential, ProviderKind};
pub use error::{AuthError, AuthErrorKind};
pub use exchange::{AppleAttempt, AppleExchange, GoogleExchange, PasswordExchange};
pub use identity::{ChangeCallback, IdentityService, ListenerHandle, Principal};
pub use listener::{IdentityListener, ListenerSubscription};
pub use nonce::{Nonce, NonceGenerator};
pub use orchestrator::SignInOrchestrator;
