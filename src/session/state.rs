use crate::auth::{AuthError, AuthErrorKind};

/// Progress of the most recent orchestrator operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthOperationState {
    /// Nothing has run yet, or the last sign-out completed.
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(AuthFailure),
}

impl AuthOperationState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    pub fn failure(&self) -> Option<&AuthFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Message suitable for display, if the last operation failed visibly.
    pub fn error_message(&self) -> Option<&str> {
        self.failure()
            .filter(|failure| !failure.is_silent())
            .map(AuthFailure::message)
    }
}

/// Why an operation failed. The message is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    kind: AuthErrorKind,
    message: String,
}

impl AuthFailure {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            default_message(kind).to_string()
        } else {
            message
        };
        Self { kind, message }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Cancellation is reported, but UIs should not show it as an error.
    pub fn is_silent(&self) -> bool {
        self.kind == AuthErrorKind::UserCancelled
    }
}

impl From<&AuthError> for AuthFailure {
    fn from(error: &AuthError) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

impl From<AuthError> for AuthFailure {
    fn from(error: AuthError) -> Self {
        Self::from(&error)
    }
}

fn default_message(kind: AuthErrorKind) -> &'static str {
    match kind {
        AuthErrorKind::ConfigurationMissing => "Sign-in is not configured",
        AuthErrorKind::MissingCredentialField => "Sign-in failed",
        AuthErrorKind::UserCancelled => "Sign-in was cancelled",
        AuthErrorKind::PresentationFailed => "Could not show sign-in",
        AuthErrorKind::NetworkFailure => "Network error",
        AuthErrorKind::BadResponse => "Unexpected response from the server",
        AuthErrorKind::AuthenticationFailed => "Invalid email or password",
        AuthErrorKind::NonceMismatch => "Sign-in failed",
        AuthErrorKind::RandomSourceUnavailable => "Secure random source unavailable",
    }
}
