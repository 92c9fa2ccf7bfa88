use std::sync::Arc;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;

use crate::auth::credential::Credential;
use crate::auth::error::AuthError;
use crate::auth::identity::IdentityService;
use crate::auth::nonce::{Nonce, NonceGenerator};
use crate::auth::platform::{
    AppleAuthorization, AppleScope, AppleSignInRequest, AppleSignInUi, PlatformError,
};
use crate::session::Session;

/// One Sign in with Apple attempt.
///
/// Owns the nonce generated for this attempt. Consumed by
/// [`AppleExchange::complete`]; dropping it abandons the attempt and the nonce
/// goes with it.
#[derive(Debug)]
pub struct AppleAttempt {
    nonce: Nonce,
    request: AppleSignInRequest,
}

impl AppleAttempt {
    /// The request to hand to the Apple sheet.
    pub fn request(&self) -> &AppleSignInRequest {
        &self.request
    }

    pub fn nonce_digest(&self) -> &str {
        self.nonce.digest()
    }
}

/// Sign in with Apple (OpenID Connect with a replay-protection nonce).
#[derive(Clone)]
pub struct AppleExchange {
    identity: Arc<dyn IdentityService>,
    ui: Arc<dyn AppleSignInUi>,
    nonces: NonceGenerator,
}

impl AppleExchange {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        ui: Arc<dyn AppleSignInUi>,
        nonces: NonceGenerator,
    ) -> Self {
        Self {
            identity,
            ui,
            nonces,
        }
    }

    /// Start an attempt with a fresh nonce; requests the email scope.
    pub fn begin(&self) -> Result<AppleAttempt, AuthError> {
        let nonce = self.nonces.issue()?;
        let request = AppleSignInRequest {
            nonce_digest: nonce.digest().to_string(),
            scopes: vec![AppleScope::Email],
        };
        Ok(AppleAttempt { nonce, request })
    }

    /// Finish `attempt` with whatever the Apple sheet produced.
    pub async fn complete(
        &self,
        attempt: AppleAttempt,
        outcome: Result<AppleAuthorization, PlatformError>,
    ) -> Result<Session, AuthError> {
        let authorization = outcome?;
        let identity_token = authorization
            .identity_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::MissingCredentialField("Apple identity token".to_string()))?;

        verify_nonce_binding(&identity_token, attempt.nonce.raw())?;

        let AppleAttempt { nonce, .. } = attempt;
        let principal = self
            .identity
            .exchange_credential(Credential::Apple {
                identity_token,
                nonce: nonce.raw().to_string(),
            })
            .await?;
        Ok(Session::from(principal))
    }

    /// Begin, present the sheet, complete.
    pub async fn exchange(&self) -> Result<Session, AuthError> {
        let attempt = self.begin()?;
        let outcome = self.ui.present(attempt.request()).await;
        self.complete(attempt, outcome).await
    }
}

#[derive(Deserialize)]
struct NonceClaim {
    nonce: Option<String>,
}

/// Check that `identity_token` was issued for the digest of `raw_nonce`.
///
/// Tokens that are not JWTs, or carry no `nonce` claim, pass: the identity
/// service performs the authoritative check during the exchange.
pub fn verify_nonce_binding(identity_token: &str, raw_nonce: &str) -> Result<(), AuthError> {
    if raw_nonce.is_empty() {
        return Err(AuthError::MissingCredentialField("nonce".to_string()));
    }
    let Some(claimed) = nonce_claim(identity_token) else {
        return Ok(());
    };
    if claimed == NonceGenerator::digest(raw_nonce) {
        Ok(())
    } else {
        tracing::warn!("Apple identity token nonce does not match this attempt");
        Err(AuthError::NonceMismatch)
    }
}

fn nonce_claim(identity_token: &str) -> Option<String> {
    let mut parts = identity_token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .ok()?;
    serde_json::from_slice::<NonceClaim>(&bytes).ok()?.nonce
}
