//! Settings document persistence
//!
//! The settings document is written whole on every change. On disk it is
//! either plain JSON or, when a passphrase is configured, encrypted with
//! ChaCha20-Poly1305 under a key derived from the passphrase via Argon2id.
//!
//! # Encrypted Format
//!
//! - 8-byte magic `NLOCKENC`
//! - 16-byte Argon2id salt
//! - 12-byte nonce
//! - Encrypted settings JSON with the 16-byte tag appended

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use argon2::Argon2;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use netlock_core::Settings;

use crate::error::{DaemonError, Result};

/// Marker at the start of an encrypted settings file
const MAGIC: &[u8; 8] = b"NLOCKENC";

/// Size of the key-derivation salt
const SALT_SIZE: usize = 16;

/// Size of the nonce for ChaCha20-Poly1305
const NONCE_SIZE: usize = 12;

const HEADER_SIZE: usize = MAGIC.len() + SALT_SIZE + NONCE_SIZE;

/// Whole-document persistence for [`Settings`]
pub trait SettingsStore: Send + Sync {
    /// Read the stored document, `None` if nothing was stored yet
    fn load(&self) -> Result<Option<Settings>>;

    /// Replace the stored document
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<Option<Settings>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            document: Mutex::new(Some(settings)),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail, to exercise error paths
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<Settings>> {
        let document = self
            .document
            .lock()
            .map_err(|_| DaemonError::Store("Memory store poisoned".to_string()))?;
        Ok(document.clone())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DaemonError::Store("Write rejected".to_string()));
        }
        let mut document = self
            .document
            .lock()
            .map_err(|_| DaemonError::Store("Memory store poisoned".to_string()))?;
        *document = Some(settings.clone());
        Ok(())
    }
}

/// Key material for an encrypted settings file
struct StoreCipher {
    key: Zeroizing<[u8; 32]>,
    salt: [u8; SALT_SIZE],
}

impl StoreCipher {
    fn derive(passphrase: &str, salt: [u8; SALT_SIZE]) -> Result<Self> {
        let mut key = Zeroizing::new([0u8; 32]);
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key[..])
            .map_err(|e| DaemonError::Crypto(format!("Key derivation failed: {}", e)))?;
        Ok(Self { key, salt })
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(&self.key[..])
            .map_err(|e| DaemonError::Crypto(format!("Invalid key: {}", e)))
    }
}

/// File-backed store, optionally encrypted at rest
pub struct FileStore {
    path: PathBuf,
    cipher: Option<StoreCipher>,
}

impl FileStore {
    /// Open a plain JSON store
    pub fn plain(path: PathBuf) -> Self {
        Self { path, cipher: None }
    }

    /// Open a store, encrypting it when a passphrase is given.
    ///
    /// An existing encrypted file keeps its salt; a plain file is migrated
    /// to the encrypted format on the next save.
    pub fn open(path: PathBuf, passphrase: Option<&str>) -> Result<Self> {
        let Some(passphrase) = passphrase.filter(|p| !p.is_empty()) else {
            return Ok(Self::plain(path));
        };

        let salt = match read_header_salt(&path)? {
            Some(salt) => salt,
            None => {
                let mut salt = [0u8; SALT_SIZE];
                rand::rngs::OsRng.fill_bytes(&mut salt);
                salt
            }
        };

        Ok(Self {
            path,
            cipher: Some(StoreCipher::derive(passphrase, salt)?),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Settings> {
        if !bytes.starts_with(MAGIC) {
            return Ok(serde_json::from_slice(bytes)?);
        }

        let cipher = self.cipher.as_ref().ok_or_else(|| {
            DaemonError::Store("Settings file is encrypted but no key is configured".to_string())
        })?;
        if bytes.len() < HEADER_SIZE {
            return Err(DaemonError::Store("Encrypted file too short".to_string()));
        }

        let nonce = Nonce::from_slice(&bytes[MAGIC.len() + SALT_SIZE..HEADER_SIZE]);
        let plaintext = Zeroizing::new(
            cipher
                .cipher()?
                .decrypt(nonce, &bytes[HEADER_SIZE..])
                .map_err(|_| {
                    DaemonError::Crypto("Decryption failed - wrong key or corrupted data".to_string())
                })?,
        );

        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn encode(&self, settings: &Settings) -> Result<Vec<u8>> {
        let plaintext = Zeroizing::new(serde_json::to_vec_pretty(settings)?);
        let Some(cipher) = &self.cipher else {
            return Ok(plaintext.to_vec());
        };

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|e| DaemonError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&cipher.salt);
        bytes.extend_from_slice(&nonce_bytes);
        bytes.extend_from_slice(&ciphertext);
        Ok(bytes)
    }
}

/// Salt of an existing encrypted file, if any
fn read_header_salt(path: &Path) -> Result<Option<[u8; SALT_SIZE]>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    if bytes.len() < HEADER_SIZE || !bytes.starts_with(MAGIC) {
        return Ok(None);
    }
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&bytes[MAGIC.len()..MAGIC.len() + SALT_SIZE]);
    Ok(Some(salt))
}

impl SettingsStore for FileStore {
    fn load(&self) -> Result<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        self.decode(&bytes).map(Some)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let bytes = self.encode(settings)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("conf.tmp");
        std::fs::write(&temp_path, &bytes)?;
        std::fs::rename(&temp_path, &self.path)?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}
