//! One-time values binding an OpenID Connect response to its request.

use std::fmt;

use sha2::{Digest, Sha256};

use super::error::AuthError;

/// 64 symbols, so a 6-bit mask maps random bytes onto it without bias.
const NONCE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// A raw nonce plus its SHA-256 digest.
///
/// The raw value goes back to the identity service together with the identity
/// token; the digest goes into the platform sign-in request. Deliberately not
/// `Clone`: a nonce belongs to exactly one attempt.
pub struct Nonce {
    raw: String,
    digest: String,
}

impl Nonce {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Whether `raw` hashes to this nonce's digest.
    pub fn matches(&self, raw: &str) -> bool {
        NonceGenerator::digest(raw) == self.digest
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nonce")
            .field("raw", &"<redacted>")
            .field("digest", &self.digest)
            .finish()
    }
}

/// Produces nonces from the operating system's secure random source.
#[derive(Debug, Clone, Copy)]
pub struct NonceGenerator {
    length: usize,
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_LENGTH)
    }
}

impl NonceGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate a fresh raw/digest pair.
    pub fn issue(&self) -> Result<Nonce, AuthError> {
        let raw = Self::generate(self.length)?;
        let digest = Self::digest(&raw);
        tracing::trace!(digest = %digest, "issued nonce");
        Ok(Nonce { raw, digest })
    }

    /// Random string of `length` characters drawn from [`NONCE_ALPHABET`].
    ///
    /// Fails only when the OS random source is unavailable, which callers
    /// should treat as fatal.
    pub fn generate(length: usize) -> Result<String, AuthError> {
        if length == 0 {
            return Err(AuthError::ConfigurationMissing(
                "non-zero nonce length".to_string(),
            ));
        }
        let mut bytes = vec![0u8; length];
        getrandom::getrandom(&mut bytes)?;
        Ok(bytes
            .iter()
            .map(|byte| NONCE_ALPHABET[(byte & 0x3f) as usize] as char)
            .collect())
    }

    /// Lowercase hex SHA-256 of the UTF-8 bytes of `raw`.
    pub fn digest(raw: &str) -> String {
        hex::encode(Sha256::digest(raw.as_bytes()))
    }
}
