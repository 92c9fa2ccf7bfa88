use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::identity::Principal;

/// The authenticated identity currently recognized by the client.
///
/// Immutable: a change of identity replaces the whole value. Equality
/// compares identity only; `established_at` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    subject: String,
    email: Option<String>,
    display_name: Option<String>,
    established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        subject: impl Into<String>,
        email: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            email,
            display_name,
            established_at: Utc::now(),
        }
    }

    /// Opaque subject identifier assigned by the identity service.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// When this client first saw the session.
    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.email == other.email
            && self.display_name == other.display_name
    }
}

impl Eq for Session {}

impl From<&Principal> for Session {
    fn from(principal: &Principal) -> Self {
        Self::new(
            principal.uid.clone(),
            principal.email.clone(),
            principal.display_name.clone(),
        )
    }
}

impl From<Principal> for Session {
    fn from(principal: Principal) -> Self {
        Self::new(principal.uid, principal.email, principal.display_name)
    }
}
