#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use resales_auth::auth::platform::{
    AppleAuthorization, AppleSignInRequest, AppleSignInUi, GoogleSignInConfig, GoogleSignInResult,
    GoogleSignInUi, PlatformError, PresentingSurface,
};
use resales_auth::auth::{
    AuthError, ChangeCallback, Credential, IdentityService, ListenerHandle, NonceGenerator,
    Principal, SignInOrchestrator,
};
use resales_auth::config::AuthConfig;
use resales_auth::lifecycle::{CoreDependencies, SessionCore};
use resales_auth::session::SessionStateStore;

/// Unsigned JWT whose payload carries `nonce = digest`.
pub fn jwt_with_nonce(subject: &str, digest: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": subject, "nonce": digest }).to_string());
    format!("{header}.{payload}.signature")
}

#[derive(Deserialize)]
struct Claims {
    sub: String,
    nonce: Option<String>,
}

fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[derive(Default)]
struct FakeState {
    /// email -> (uid, password)
    accounts: HashMap<String, (String, String)>,
    current: Option<Principal>,
    listeners: HashMap<ListenerHandle, ChangeCallback>,
    delays: HashMap<String, Duration>,
    sign_out_error: Option<AuthError>,
    clear_principal_on_sign_out_error: bool,
    forget_principal_after_sign_in: bool,
}

/// In-memory identity service with knobs for failure injection.
#[derive(Default)]
pub struct FakeIdentityService {
    state: Mutex<FakeState>,
    next_uid: AtomicUsize,
    exchange_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    removed_listeners: AtomicUsize,
}

impl FakeIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        let uid = self.allocate_uid();
        self.lock()
            .accounts
            .insert(email.to_string(), (uid, password.to_string()));
        self
    }

    /// Start with `email` already signed in at the provider.
    pub fn signed_in_as(self, email: &str) -> Self {
        let principal = {
            let state = self.lock();
            let (uid, _) = state.accounts.get(email).expect("seed account first");
            Principal {
                uid: uid.clone(),
                email: Some(email.to_string()),
                display_name: None,
            }
        };
        self.lock().current = Some(principal);
        self
    }

    /// Make password calls for `email` take `delay` before answering.
    pub fn delay_for(&self, email: &str, delay: Duration) {
        self.lock().delays.insert(email.to_string(), delay);
    }

    pub fn fail_sign_out(&self, error: AuthError, provider_clears_session: bool) {
        let mut state = self.lock();
        state.sign_out_error = Some(error);
        state.clear_principal_on_sign_out_error = provider_clears_session;
    }

    /// Report success from password calls but lose the principal.
    pub fn forget_principal_after_sign_in(&self) {
        self.lock().forget_principal_after_sign_in = true;
    }

    /// Change the session from outside the app and notify listeners from a
    /// foreign OS thread, the way a vendor SDK would.
    pub fn push_external_change(&self, principal: Option<Principal>) {
        let callbacks: Vec<ChangeCallback> = {
            let mut state = self.lock();
            state.current = principal.clone();
            state.listeners.values().cloned().collect()
        };
        std::thread::spawn(move || {
            for callback in callbacks {
                callback(principal.clone());
            }
        })
        .join()
        .expect("notifier thread panicked");
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn removed_listeners(&self) -> usize {
        self.removed_listeners.load(Ordering::SeqCst)
    }

    fn allocate_uid(&self) -> String {
        format!("uid-{}", self.next_uid.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake identity lock poisoned")
    }

    fn establish(&self, principal: Principal) -> Principal {
        let callbacks: Vec<ChangeCallback> = {
            let mut state = self.lock();
            state.current = if state.forget_principal_after_sign_in {
                None
            } else {
                Some(principal.clone())
            };
            state.listeners.values().cloned().collect()
        };
        for callback in callbacks {
            callback(Some(principal.clone()));
        }
        principal
    }

    async fn delay(&self, email: &str) {
        let delay = self.lock().delays.get(email).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl IdentityService for FakeIdentityService {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        self.delay(email).await;
        let uid = {
            let state = self.lock();
            match state.accounts.get(email) {
                Some((uid, expected)) if expected == password => uid.clone(),
                _ => {
                    return Err(AuthError::AuthenticationFailed(
                        "INVALID_LOGIN_CREDENTIALS".to_string(),
                    ))
                }
            }
        };
        Ok(self.establish(Principal {
            uid,
            email: Some(email.to_string()),
            display_name: None,
        }))
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        self.delay(email).await;
        let uid = self.allocate_uid();
        {
            let mut state = self.lock();
            if state.accounts.contains_key(email) {
                return Err(AuthError::BadResponse {
                    status: 400,
                    message: "EMAIL_EXISTS".to_string(),
                });
            }
            state
                .accounts
                .insert(email.to_string(), (uid.clone(), password.to_string()));
        }
        Ok(self.establish(Principal {
            uid,
            email: Some(email.to_string()),
            display_name: None,
        }))
    }

    async fn exchange_credential(&self, credential: Credential) -> Result<Principal, AuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        match credential {
            Credential::Password { email, password } => {
                self.sign_in_with_password(&email, &password).await
            }
            Credential::Google { id_token, .. } => Ok(self.establish(Principal {
                uid: format!("google:{id_token}"),
                email: Some(format!("{id_token}@gmail.com")),
                display_name: Some("Google User".to_string()),
            })),
            Credential::Apple {
                identity_token,
                nonce,
            } => {
                let claims = decode_claims(&identity_token).ok_or_else(|| {
                    AuthError::AuthenticationFailed("INVALID_IDP_RESPONSE".to_string())
                })?;
                if claims.nonce.as_deref() != Some(NonceGenerator::digest(&nonce).as_str()) {
                    return Err(AuthError::AuthenticationFailed(
                        "INVALID_IDP_RESPONSE : nonce mismatch".to_string(),
                    ));
                }
                Ok(self.establish(Principal {
                    uid: format!("apple:{}", claims.sub),
                    email: Some(format!("{}@privaterelay.appleid.com", claims.sub)),
                    display_name: None,
                }))
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(err) = state.sign_out_error.clone() {
            if state.clear_principal_on_sign_out_error {
                state.current = None;
            }
            return Err(err);
        }
        state.current = None;
        Ok(())
    }

    fn current_principal(&self) -> Option<Principal> {
        self.lock().current.clone()
    }

    fn add_change_listener(&self, callback: ChangeCallback) -> ListenerHandle {
        let handle = ListenerHandle::new();
        self.lock().listeners.insert(handle, callback);
        handle
    }

    fn remove_change_listener(&self, handle: ListenerHandle) {
        if self.lock().listeners.remove(&handle).is_some() {
            self.removed_listeners.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Google sheet that replays queued results.
#[derive(Default)]
pub struct ScriptedGoogleUi {
    results: Mutex<VecDeque<Result<GoogleSignInResult, PlatformError>>>,
    presented: Mutex<Vec<GoogleSignInConfig>>,
}

impl ScriptedGoogleUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, result: Result<GoogleSignInResult, PlatformError>) {
        self.results.lock().expect("lock").push_back(result);
    }

    pub fn presented(&self) -> Vec<GoogleSignInConfig> {
        self.presented.lock().expect("lock").clone()
    }
}

#[async_trait]
impl GoogleSignInUi for ScriptedGoogleUi {
    async fn present(
        &self,
        _surface: &PresentingSurface,
        config: &GoogleSignInConfig,
    ) -> Result<GoogleSignInResult, PlatformError> {
        self.presented.lock().expect("lock").push(config.clone());
        self.results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or(Err(PlatformError::PresentationFailed(
                "no scripted result".to_string(),
            )))
    }
}

/// How the scripted Apple sheet answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppleBehavior {
    /// Return a token bound to the request's nonce digest.
    Authorize,
    Cancel,
    OmitToken,
}

pub struct ScriptedAppleUi {
    behavior: Mutex<AppleBehavior>,
    requests: Mutex<Vec<AppleSignInRequest>>,
}

impl ScriptedAppleUi {
    pub fn new(behavior: AppleBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: AppleBehavior) {
        *self.behavior.lock().expect("lock") = behavior;
    }

    pub fn requests(&self) -> Vec<AppleSignInRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Default for ScriptedAppleUi {
    fn default() -> Self {
        Self::new(AppleBehavior::Authorize)
    }
}

#[async_trait]
impl AppleSignInUi for ScriptedAppleUi {
    async fn present(
        &self,
        request: &AppleSignInRequest,
    ) -> Result<AppleAuthorization, PlatformError> {
        self.requests.lock().expect("lock").push(request.clone());
        let behavior = *self.behavior.lock().expect("lock");
        match behavior {
            AppleBehavior::Authorize => Ok(AppleAuthorization {
                identity_token: Some(jwt_with_nonce("apple-sub", &request.nonce_digest)),
            }),
            AppleBehavior::Cancel => Err(PlatformError::UserCancelled),
            AppleBehavior::OmitToken => Ok(AppleAuthorization {
                identity_token: None,
            }),
        }
    }
}

pub struct Harness {
    pub identity: Arc<FakeIdentityService>,
    pub google: Arc<ScriptedGoogleUi>,
    pub apple: Arc<ScriptedAppleUi>,
    pub config: Arc<AuthConfig>,
}

impl Harness {
    pub fn new(identity: FakeIdentityService) -> Self {
        Self {
            identity: Arc::new(identity),
            google: Arc::new(ScriptedGoogleUi::new()),
            apple: Arc::new(ScriptedAppleUi::default()),
            config: Arc::new(AuthConfig::default().with_google_client_id("client-123")),
        }
    }

    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Orchestrator over a bare store, without a listener.
    pub fn orchestrator(&self) -> SignInOrchestrator {
        let initial = self
            .identity
            .current_principal()
            .map(resales_auth::session::Session::from);
        SignInOrchestrator::new(
            Arc::new(SessionStateStore::new(initial)),
            self.identity.clone(),
            self.config.clone(),
            self.google.clone(),
            self.apple.clone(),
            NonceGenerator::new(self.config.nonce_length),
        )
    }

    pub fn start_core(&self) -> SessionCore {
        SessionCore::start(CoreDependencies {
            identity: self.identity.clone(),
            config: self.config.clone(),
            google_ui: self.google.clone(),
            apple_ui: self.apple.clone(),
        })
    }
}
