//! Interfaces to the platform sign-in sheets (Google, Apple).
//!
//! The host application implements these against the OS; the core only sees
//! the values they return.

use async_trait::async_trait;
use strum::{AsRefStr, Display};
use thiserror::Error;

use super::error::AuthError;

/// Failure reported by a platform sign-in sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("user dismissed the sign-in sheet")]
    UserCancelled,
    #[error("presentation failed: {0}")]
    PresentationFailed(String),
}

impl From<PlatformError> for AuthError {
    fn from(error: PlatformError) -> Self {
        match error {
            PlatformError::UserCancelled => AuthError::UserCancelled,
            PlatformError::PresentationFailed(reason) => AuthError::PresentationFailed(reason),
        }
    }
}

/// Opaque identifier of the UI surface a sheet is presented over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresentingSurface(pub String);

/// Configuration handed to the Google sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleSignInConfig {
    pub client_id: String,
}

/// What the Google sheet returns. The identity token is optional because the
/// SDK may omit it.
#[derive(Debug, Clone, Default)]
pub struct GoogleSignInResult {
    pub id_token: Option<String>,
    pub access_token: String,
}

#[async_trait]
pub trait GoogleSignInUi: Send + Sync {
    async fn present(
        &self,
        surface: &PresentingSurface,
        config: &GoogleSignInConfig,
    ) -> Result<GoogleSignInResult, PlatformError>;
}

/// Scopes that may be requested from Sign in with Apple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AppleScope {
    Email,
    FullName,
}

/// Parameters of one Sign in with Apple request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleSignInRequest {
    /// SHA-256 hex digest of the attempt's raw nonce.
    pub nonce_digest: String,
    pub scopes: Vec<AppleScope>,
}

/// What the Apple sheet returns.
#[derive(Debug, Clone, Default)]
pub struct AppleAuthorization {
    pub identity_token: Option<String>,
}

#[async_trait]
pub trait AppleSignInUi: Send + Sync {
    async fn present(
        &self,
        request: &AppleSignInRequest,
    ) -> Result<AppleAuthorization, PlatformError>;
}
