//! Admin tokens
//!
//! A token is the expiry timestamp of a session, encrypted under the admin
//! password. Only the holder of the current password can mint one, and
//! changing the password invalidates every outstanding token because
//! validation derives the key from the new secret.
//!
//! # Wire Format
//!
//! Base64 (standard alphabet) of:
//! - 16-byte Argon2id salt
//! - 12-byte ChaCha20-Poly1305 nonce
//! - ciphertext of the decimal expiry (ms) plus the 16-byte tag

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Size of the key-derivation salt
const SALT_SIZE: usize = 16;

/// Size of the nonce for ChaCha20-Poly1305
const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag
const TAG_SIZE: usize = 16;

/// Argon2id memory cost for token keys (KiB)
const KDF_MEMORY_KIB: u32 = 8 * 1024;

/// Argon2id passes for token keys
const KDF_ITERATIONS: u32 = 1;

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cipher key for `secret` and `salt`
fn derive_key(secret: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, 1, Some(32))
        .map_err(|e| Error::Crypto(format!("Invalid KDF parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(secret.as_bytes(), salt, &mut key[..])
        .map_err(|e| Error::Crypto(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

/// Mint a token that stays valid until `now + cache_secs`
pub fn issue(secret: &str, now: i64, cache_secs: i64) -> Result<Token> {
    let expires_at = now.saturating_add(cache_secs.saturating_mul(1000));
    encrypt_expiry(secret, expires_at)
}

fn encrypt_expiry(secret: &str, expires_at: i64) -> Result<Token> {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(secret, &salt)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key[..])
        .map_err(|e| Error::Crypto(format!("Invalid key: {}", e)))?;

    let plaintext = expires_at.to_string();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    let mut bytes = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    bytes.extend_from_slice(&salt);
    bytes.extend_from_slice(&nonce_bytes);
    bytes.extend_from_slice(&ciphertext);

    Ok(Token(STANDARD.encode(bytes)))
}

/// Decrypt the expiry carried by `token`, or `None` if it is not ours
pub fn decode_expiry(token: &str, secret: &str) -> Option<i64> {
    let bytes = STANDARD.decode(token.trim()).ok()?;
    if bytes.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
        return None;
    }

    let (salt, rest) = bytes.split_at(SALT_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let key = derive_key(secret, salt).ok()?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key[..]).ok()?;
    let plaintext = cipher.decrypt(Nonce::from_slice(nonce), ciphertext).ok()?;

    std::str::from_utf8(&plaintext).ok()?.parse().ok()
}

/// Whether `token` was minted under `secret` and has not expired at `now`
pub fn validate(token: &str, secret: &str, now: i64) -> bool {
    decode_expiry(token, secret).map_or(false, |expires_at| now <= expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifetime() {
        let token = issue("pw", 1000, 60).unwrap();
        assert!(validate(token.as_str(), "pw", 1000 + 59_000));
        assert!(validate(token.as_str(), "pw", 1000 + 60_000));
        assert!(!validate(token.as_str(), "pw", 1000 + 61_000));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = issue("pw", 1000, 60).unwrap();
        assert!(!validate(token.as_str(), "other", 1000));
        assert_eq!(decode_expiry(token.as_str(), "other"), None);
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(!validate("", "pw", 0));
        assert!(!validate("not base64 !!", "pw", 0));
        assert!(!validate(&STANDARD.encode([0u8; 8]), "pw", 0));
        assert!(!validate(&STANDARD.encode([7u8; 64]), "pw", 0));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let token = issue("pw", 1000, 60).unwrap();
        let mut bytes = STANDARD.decode(token.as_str()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(!validate(&STANDARD.encode(bytes), "pw", 1000));
    }

    #[test]
    fn test_tokens_are_salted() {
        let a = issue("pw", 1000, 60).unwrap();
        let b = issue("pw", 1000, 60).unwrap();
        assert_ne!(a, b);
        assert_eq!(decode_expiry(a.as_str(), "pw"), Some(61_000));
        assert_eq!(decode_expiry(b.as_str(), "pw"), Some(61_000));
    }

    #[test]
    fn test_debug_hides_value() {
        let token = Token::new("secret-token");
        assert_eq!(format!("{:?}", token), "Token(..)");
    }
}
