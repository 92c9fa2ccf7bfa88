//! Error classification shared by the auth and configuration layers.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Credentials,
    Cancelled,
    Network,
    Server,
    Environment,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Fix configuration before trying again.
    CheckConfiguration,
    /// Ask the user to re-enter or re-confirm their credentials.
    CheckCredentials,
    /// Start the sign-in flow again.
    RestartFlow,
    /// Retry; the failure was transient.
    Retry,
    /// Nothing the user can do.
    ContactSupport,
}
