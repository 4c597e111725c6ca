//! Cryptographic helpers for authentication.
//!
//! - Random opaque tokens (OAuth `state`)
//! - Session cookie sealing: ChaCha20-Poly1305 under keys derived from the
//!   configured cookie secrets with HMAC-SHA256
//!
//! Uses pure Rust crates only.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use hmac::{Hmac, Mac};
use serde::{Serialize, de::DeserializeOwned};
use sha2::Sha256;

use crate::ServiceError;

const NONCE_LEN: usize = 12;

/// Domain separator for cookie key derivation. Changing it invalidates every session.
const SESSION_KEY_CONTEXT: &[u8] = b"flashme/session-cookie/v1";

/// Session lifetime: 30 days in seconds.
pub const SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 3600;

/// Generate a secure random token. Returns hex-encoded (64 chars).
pub fn generate_token() -> Result<String, ServiceError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;
    Ok(hex::encode(bytes))
}

// ── Session cookie codec ────────────────────────────────────────────────────

/// Seals values into opaque cookie strings and opens them again.
///
/// The first secret seals; every secret is tried when opening, so secrets can
/// be rotated by prepending a new one without logging anybody out. The AEAD
/// tag doubles as the signature: a cookie that opens was produced by us.
pub struct SessionCodec {
    ciphers: Vec<ChaCha20Poly1305>,
}

impl SessionCodec {
    /// Build a codec from an ordered list of secrets (primary first).
    pub fn new<S: AsRef<str>>(secrets: &[S]) -> Result<Self, ServiceError> {
        if secrets.is_empty() {
            return Err(ServiceError::Internal(
                "at least one session secret is required".into(),
            ));
        }
        let ciphers = secrets
            .iter()
            .map(|secret| derive_cipher(secret.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ciphers })
    }

    /// Number of secrets accepted when opening.
    pub fn secret_count(&self) -> usize {
        self.ciphers.len()
    }

    /// Serialize and encrypt `value` under the primary secret.
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<String, ServiceError> {
        let plaintext = serde_json::to_vec(value)
            .map_err(|e| ServiceError::Internal(format!("session encode: {e}")))?;

        let mut nonce = [0u8; NONCE_LEN];
        getrandom::getrandom(&mut nonce)
            .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;

        let ciphertext = self.ciphers[0]
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| ServiceError::Internal("session encryption failed".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Decrypt and deserialize a sealed value. `None` if no secret authenticates it.
    pub fn open<T: DeserializeOwned>(&self, sealed: &str) -> Option<T> {
        let bytes = URL_SAFE_NO_PAD.decode(sealed.trim()).ok()?;
        if bytes.len() <= NONCE_LEN {
            return None;
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .ciphers
            .iter()
            .find_map(|cipher| cipher.decrypt(Nonce::from_slice(nonce), ciphertext).ok())?;
        serde_json::from_slice(&plaintext).ok()
    }
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("secrets", &self.ciphers.len())
            .finish()
    }
}

// ── Internal ────────────────────────────────────────────────────────────────

fn derive_cipher(secret: &str) -> Result<ChaCha20Poly1305, ServiceError> {
    if secret.is_empty() {
        return Err(ServiceError::Internal("session secret must not be empty".into()));
    }
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::Internal(format!("session key derivation: {e}")))?;
    mac.update(SESSION_KEY_CONTEXT);
    let key = mac.finalize().into_bytes();
    Ok(ChaCha20Poly1305::new(Key::from_slice(&key)))
}
