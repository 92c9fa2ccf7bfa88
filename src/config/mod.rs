//! Configuration system (layered: code > env > config file > defaults).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::nonce::DEFAULT_NONCE_LENGTH;
use crate::error::{ResalesError, Result};

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_REQUEST_URI: &str = "http://localhost";

const CONFIG_FILE_NAME: &str = "auth.toml";

/// App configuration as seen by the sign-in flows.
pub trait AppConfiguration: Send + Sync {
    /// OAuth client identifier for the Google sheet. Blank counts as absent.
    fn client_identifier(&self) -> Option<String>;
}

/// Settings for the session core.
///
/// Resolution order, highest first:
/// 1. Values set in code (`with_*`)
/// 2. `RESALES_*` environment variables (a `.env` file is honored)
/// 3. The TOML config file
/// 4. Built-in defaults
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub google_client_id: Option<String>,
    pub identity_api_key: Option<String>,
    pub identity_base_url: String,
    pub nonce_length: usize,
    pub request_uri: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("google_client_id", &self.google_client_id)
            .field(
                "identity_api_key",
                &self.identity_api_key.as_ref().map(|_| ".."),
            )
            .field("identity_base_url", &self.identity_base_url)
            .field("nonce_length", &self.nonce_length)
            .field("request_uri", &self.request_uri)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            identity_api_key: None,
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            nonce_length: DEFAULT_NONCE_LENGTH,
            request_uri: DEFAULT_REQUEST_URI.to_string(),
        }
    }
}

impl AppConfiguration for AuthConfig {
    fn client_identifier(&self) -> Option<String> {
        non_blank(self.google_client_id.as_deref())
    }
}

impl AuthConfig {
    /// Default config file path (`<config dir>/auth.toml`).
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "ReSales", "resales")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(".resales").join(CONFIG_FILE_NAME))
    }

    /// Load the default config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::load_from_path(Self::default_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, ignoring any config file.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file. A missing file yields the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no auth config file; using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(ResalesError::Io(err)),
        };
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `RESALES_*` variables resolved through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("RESALES_GOOGLE_CLIENT_ID") {
            self.google_client_id = Some(value);
        }
        if let Some(value) = lookup("RESALES_IDENTITY_API_KEY") {
            self.identity_api_key = Some(value);
        }
        if let Some(value) = lookup("RESALES_IDENTITY_BASE_URL") {
            self.identity_base_url = value;
        }
        if let Some(value) = lookup("RESALES_NONCE_LENGTH") {
            self.nonce_length = value.trim().parse().map_err(|_| {
                ResalesError::Configuration(format!(
                    "RESALES_NONCE_LENGTH must be a positive integer, got {value:?}"
                ))
            })?;
        }
        Ok(())
    }

    pub fn with_google_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.google_client_id = Some(client_id.into());
        self
    }

    pub fn with_identity_api_key(mut self, key: impl Into<String>) -> Self {
        self.identity_api_key = Some(key.into());
        self
    }

    pub fn with_identity_base_url(mut self, url: impl Into<String>) -> Self {
        self.identity_base_url = url.into();
        self
    }

    pub fn with_nonce_length(mut self, length: usize) -> Self {
        self.nonce_length = length;
        self
    }

    pub fn identity_api_key(&self) -> Option<String> {
        non_blank(self.identity_api_key.as_deref())
    }

    pub fn validate(&self) -> Result<()> {
        if self.nonce_length == 0 {
            return Err(ResalesError::Configuration(
                "nonce_length must be greater than zero".to_string(),
            ));
        }
        if self.identity_base_url.trim().is_empty() {
            return Err(ResalesError::Configuration(
                "identity_base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
