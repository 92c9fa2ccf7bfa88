//! Error types for the session core.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::AuthError;

/// Crate-level error for configuration loading and core set-up.
///
/// Sign-in failures never surface as this type: the orchestrator records them
/// in [`AuthOperationState::Failed`](crate::session::AuthOperationState::Failed).
#[derive(Error, Debug)]
pub enum ResalesError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl ResalesError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::Toml(_) => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::Environment,
            Self::Auth(err) => err.category(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ResalesError>;
