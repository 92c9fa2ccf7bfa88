use std::fmt;

use strum::{AsRefStr, Display};

/// Sign-in protocol a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum ProviderKind {
    #[strum(serialize = "password")]
    Password,
    #[strum(serialize = "google.com")]
    Google,
    #[strum(serialize = "apple.com")]
    Apple,
}

/// Provider-specific proof of identity, exchanged once for a session.
///
/// Not `Clone` and never persisted; the identity exchange call takes it by value.
pub enum Credential {
    Password {
        email: String,
        password: String,
    },
    Google {
        id_token: String,
        access_token: String,
    },
    Apple {
        identity_token: String,
        /// The raw nonce whose digest was attached to the Apple request.
        nonce: String,
    },
}

impl Credential {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Password { .. } => ProviderKind::Password,
            Self::Google { .. } => ProviderKind::Google,
            Self::Apple { .. } => ProviderKind::Apple,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Self::Google { .. } => f
                .debug_struct("Google")
                .field("id_token", &"<redacted>")
                .field("access_token", &"<redacted>")
                .finish(),
            Self::Apple { .. } => f
                .debug_struct("Apple")
                .field("identity_token", &"<redacted>")
                .field("nonce", &"<redacted>")
                .finish(),
        }
    }
}
