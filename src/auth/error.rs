use strum::{Display, EnumString};
use thiserror::Error;

use crate::error::{ErrorCategory, RecoverySuggestion};

/// Normalized sign-in errors across credential protocols.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),
    #[error("Sign-in response was missing {0}")]
    MissingCredentialField(String),
    #[error("Sign-in was cancelled")]
    UserCancelled,
    #[error("Could not present sign-in: {0}")]
    PresentationFailed(String),
    #[error("Network error: {0}")]
    NetworkFailure(String),
    #[error("Identity service returned status {status}: {message}")]
    BadResponse { status: u16, message: String },
    #[error("Invalid credentials: {0}")]
    AuthenticationFailed(String),
    #[error("Sign-in response does not belong to this attempt")]
    NonceMismatch,
    #[error("Secure random source unavailable: {0}")]
    RandomSourceUnavailable(String),
}

/// Payload-free discriminant of [`AuthError`], suitable for matching in UI code
/// and for storage inside [`AuthFailure`](crate::session::AuthFailure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AuthErrorKind {
    ConfigurationMissing,
    MissingCredentialField,
    UserCancelled,
    PresentationFailed,
    NetworkFailure,
    BadResponse,
    AuthenticationFailed,
    NonceMismatch,
    RandomSourceUnavailable,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::ConfigurationMissing(_) => AuthErrorKind::ConfigurationMissing,
            Self::MissingCredentialField(_) => AuthErrorKind::MissingCredentialField,
            Self::UserCancelled => AuthErrorKind::UserCancelled,
            Self::PresentationFailed(_) => AuthErrorKind::PresentationFailed,
            Self::NetworkFailure(_) => AuthErrorKind::NetworkFailure,
            Self::BadResponse { .. } => AuthErrorKind::BadResponse,
            Self::AuthenticationFailed(_) => AuthErrorKind::AuthenticationFailed,
            Self::NonceMismatch => AuthErrorKind::NonceMismatch,
            Self::RandomSourceUnavailable(_) => AuthErrorKind::RandomSourceUnavailable,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationMissing(_) => ErrorCategory::Configuration,
            Self::MissingCredentialField(_)
            | Self::AuthenticationFailed(_)
            | Self::NonceMismatch => ErrorCategory::Credentials,
            Self::UserCancelled | Self::PresentationFailed(_) => ErrorCategory::Cancelled,
            Self::NetworkFailure(_) => ErrorCategory::Network,
            Self::BadResponse { .. } => ErrorCategory::Server,
            Self::RandomSourceUnavailable(_) => ErrorCategory::Environment,
        }
    }

    /// Whether re-attempting the flow can succeed without outside changes.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Environment
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::ConfigurationMissing(_) => RecoverySuggestion::CheckConfiguration,
            Self::AuthenticationFailed(_) => RecoverySuggestion::CheckCredentials,
            Self::MissingCredentialField(_)
            | Self::UserCancelled
            | Self::PresentationFailed(_)
            | Self::NonceMismatch => RecoverySuggestion::RestartFlow,
            Self::NetworkFailure(_) | Self::BadResponse { .. } => RecoverySuggestion::Retry,
            Self::RandomSourceUnavailable(_) => RecoverySuggestion::ContactSupport,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::NetworkFailure(error.to_string())
    }
}

impl From<getrandom::Error> for AuthError {
    fn from(error: getrandom::Error) -> Self {
        Self::RandomSourceUnavailable(error.to_string())
    }
}
