//! REST client for an Identity-Toolkit style identity service.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::credential::Credential;
use super::error::AuthError;
use super::identity::{ChangeCallback, IdentityService, ListenerHandle, Principal};
use crate::config::{AuthConfig, DEFAULT_IDENTITY_BASE_URL, DEFAULT_REQUEST_URI};

/// Error codes that mean "these credentials or this session are no good",
/// as opposed to a malformed request or a server problem.
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "INVALID_PASSWORD",
    "EMAIL_NOT_FOUND",
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_EMAIL",
    "USER_DISABLED",
    "USER_NOT_FOUND",
    "INVALID_IDP_RESPONSE",
    "INVALID_ID_TOKEN",
    "TOKEN_EXPIRED",
    "CREDENTIAL_TOO_OLD_LOGIN_AGAIN",
];

/// Identity service over HTTPS.
///
/// Keeps the signed-in principal in memory only and notifies registered
/// listeners whenever it changes.
///
/// # Example
/// ```no_run
/// use resales_auth::auth::http::HttpIdentityService;
///
/// let identity = HttpIdentityService::new()
///     .with_api_key("web-api-key")
///     .with_base_url("http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1");
/// ```
pub struct HttpIdentityService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    request_uri: String,
    state: Mutex<ServiceState>,
}

#[derive(Default)]
struct ServiceState {
    current: Option<SignedInUser>,
    listeners: HashMap<ListenerHandle, ChangeCallback>,
}

struct SignedInUser {
    principal: Principal,
    id_token: String,
}

impl Default for HttpIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpIdentityService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            api_key: None,
            request_uri: DEFAULT_REQUEST_URI.to_string(),
            state: Mutex::new(ServiceState::default()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let mut service = Self::new().with_base_url(config.identity_base_url.clone());
        service.api_key = config.identity_api_key();
        service.request_uri = config.request_uri.clone();
        service
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Re-validate the cached session with the service.
    ///
    /// Returns the refreshed principal, or `None` if there is no session or
    /// the service no longer accepts it, in which case the cached session is
    /// dropped and listeners are told. Transport failures leave the session
    /// as it was.
    pub async fn verify_session(&self) -> Result<Option<Principal>, AuthError> {
        let Some(id_token) = self.lock().current.as_ref().map(|user| user.id_token.clone()) else {
            return Ok(None);
        };

        let lookup: Result<LookupResponse, AuthError> =
            self.post("lookup", &json!({ "idToken": id_token })).await;

        match lookup {
            Ok(response) => {
                let Some(user) = response.users.into_iter().next() else {
                    self.drop_session_if_current(&id_token);
                    return Ok(None);
                };
                let principal = Principal {
                    uid: user.local_id,
                    email: user.email,
                    display_name: user.display_name,
                };
                let refreshed = {
                    let mut state = self.lock();
                    match state.current.as_mut() {
                        Some(current) if current.id_token == id_token => {
                            let changed = current.principal != principal;
                            current.principal = principal.clone();
                            Some(changed)
                        }
                        _ => None,
                    }
                };
                match refreshed {
                    // Signed out or replaced while the lookup was in flight.
                    None => Ok(self.current_principal()),
                    Some(changed) => {
                        if changed {
                            self.notify(Some(principal.clone()));
                        }
                        Ok(Some(principal))
                    }
                }
            }
            Err(AuthError::AuthenticationFailed(reason)) => {
                tracing::info!(%reason, "identity service rejected cached session");
                self.drop_session_if_current(&id_token);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn sign_in_with(&self, endpoint: &str, body: serde_json::Value) -> Result<Principal, AuthError> {
        let response: TokenResponse = self.post(endpoint, &body).await?;
        let principal = Principal {
            uid: response.local_id,
            email: response.email,
            display_name: response.display_name,
        };
        self.lock().current = Some(SignedInUser {
            principal: principal.clone(),
            id_token: response.id_token,
        });
        self.notify(Some(principal.clone()));
        Ok(principal)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, AuthError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AuthError::ConfigurationMissing("identity API key".to_string()))?;

        let url = format!("{}/accounts:{endpoint}", self.base_url);
        tracing::debug!(endpoint, "identity service request");
        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(map_error_response(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|err| AuthError::BadResponse {
            status: status.as_u16(),
            message: format!("could not decode {endpoint} response: {err}"),
        })
    }

    fn drop_session_if_current(&self, id_token: &str) {
        let cleared = {
            let mut state = self.lock();
            let is_current = state
                .current
                .as_ref()
                .is_some_and(|current| current.id_token == id_token);
            if is_current {
                state.current = None;
            }
            is_current
        };
        if cleared {
            self.notify(None);
        }
    }

    /// Invoke every listener outside the lock.
    fn notify(&self, principal: Option<Principal>) {
        let callbacks: Vec<ChangeCallback> = self.lock().listeners.values().cloned().collect();
        for callback in callbacks {
            callback(principal.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn idp_body(&self, post_body: String) -> serde_json::Value {
        json!({
            "postBody": post_body,
            "requestUri": self.request_uri,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        })
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        self.sign_in_with(
            "signInWithPassword",
            json!({ "email": email, "password": password, "returnSecureToken": true }),
        )
        .await
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        self.sign_in_with(
            "signUp",
            json!({ "email": email, "password": password, "returnSecureToken": true }),
        )
        .await
    }

    async fn exchange_credential(&self, credential: Credential) -> Result<Principal, AuthError> {
        let provider = credential.provider();
        match credential {
            Credential::Password { email, password } => {
                self.sign_in_with_password(&email, &password).await
            }
            Credential::Google {
                id_token,
                access_token,
            } => {
                let post_body = form_encode(&[
                    ("id_token", id_token.as_str()),
                    ("access_token", access_token.as_str()),
                    ("providerId", provider.as_ref()),
                ]);
                self.sign_in_with("signInWithIdp", self.idp_body(post_body))
                    .await
            }
            Credential::Apple {
                identity_token,
                nonce,
            } => {
                let post_body = form_encode(&[
                    ("id_token", identity_token.as_str()),
                    ("providerId", provider.as_ref()),
                    ("nonce", nonce.as_str()),
                ]);
                self.sign_in_with("signInWithIdp", self.idp_body(post_body))
                    .await
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.lock().current.take();
        if previous.is_some() {
            self.notify(None);
        }
        Ok(())
    }

    fn current_principal(&self) -> Option<Principal> {
        self.lock()
            .current
            .as_ref()
            .map(|user| user.principal.clone())
    }

    /// The new listener is called once right away with the current principal.
    fn add_change_listener(&self, callback: ChangeCallback) -> ListenerHandle {
        let handle = ListenerHandle::new();
        let current = {
            let mut state = self.lock();
            state.listeners.insert(handle, callback.clone());
            state.current.as_ref().map(|user| user.principal.clone())
        };
        callback(current);
        handle
    }

    fn remove_change_listener(&self, handle: ListenerHandle) {
        self.lock().listeners.remove(&handle);
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn map_error_response(status: u16, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    // "WEAK_PASSWORD : Password should be at least 6 characters"
    let code = message
        .split(|c: char| c == ':' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    if CREDENTIAL_ERROR_CODES.contains(&code) {
        AuthError::AuthenticationFailed(message)
    } else {
        AuthError::BadResponse { status, message }
    }
}

fn form_encode(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoded(key), urlencoded(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencoded(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}
