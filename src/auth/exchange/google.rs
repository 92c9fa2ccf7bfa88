use std::sync::Arc;

use crate::auth::credential::Credential;
use crate::auth::error::AuthError;
use crate::auth::identity::IdentityService;
use crate::auth::platform::{GoogleSignInConfig, GoogleSignInUi, PresentingSurface};
use crate::config::AppConfiguration;
use crate::session::Session;

/// Google sign-in: platform sheet, then provider credential exchange.
#[derive(Clone)]
pub struct GoogleExchange {
    identity: Arc<dyn IdentityService>,
    config: Arc<dyn AppConfiguration>,
    ui: Arc<dyn GoogleSignInUi>,
}

impl GoogleExchange {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        config: Arc<dyn AppConfiguration>,
        ui: Arc<dyn GoogleSignInUi>,
    ) -> Self {
        Self {
            identity,
            config,
            ui,
        }
    }

    /// Run the flow end to end.
    ///
    /// The client identifier is checked before the sheet is shown, so a
    /// misconfigured app never reaches the network.
    pub async fn exchange(&self, surface: &PresentingSurface) -> Result<Session, AuthError> {
        let client_id = self.config.client_identifier().ok_or_else(|| {
            AuthError::ConfigurationMissing("Google client identifier".to_string())
        })?;

        let result = self
            .ui
            .present(surface, &GoogleSignInConfig { client_id })
            .await?;

        let id_token = result
            .id_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::MissingCredentialField("Google ID token".to_string()))?;

        let principal = self
            .identity
            .exchange_credential(Credential::Google {
                id_token,
                access_token: result.access_token,
            })
            .await?;
        Ok(Session::from(principal))
    }
}
