//! Key capability for manifest and item encryption
//!
//! The translation layer never touches the account key hierarchy directly. It
//! asks a [`StorageCipher`] for a key scoped to one manifest version or one
//! item, and for authenticated encryption under that key.
//!
//! [`StorageKey`] is the reference capability: HKDF-SHA256 over the 32-byte
//! account storage key, ChaCha20-Poly1305 for the AEAD.
//!
//! # Wire Format
//!
//! Encrypted data format: `[nonce (12 bytes)] + [ciphertext + auth_tag (16 bytes)]`

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{SyncError, SyncResult};

/// Length of the account storage key and of every derived key
pub const STORAGE_KEY_LENGTH: usize = 32;

/// Nonce size for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_SIZE: usize = 12;

const HKDF_SALT: &[u8] = b"accountsync-storage-v1";

/// A key scoped to a single manifest version or a single item
#[derive(Clone, PartialEq, Eq)]
pub struct ItemKey([u8; STORAGE_KEY_LENGTH]);

impl ItemKey {
    pub fn from_bytes(bytes: [u8; STORAGE_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; STORAGE_KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ItemKey(..)")
    }
}

/// Key-derivation and AEAD capability consumed by the translation layer.
///
/// Implementations must be deterministic in their derivations: the same
/// version or raw id always yields the same key.
pub trait StorageCipher: Send + Sync {
    /// Key for the manifest with the given version
    fn manifest_key(&self, version: u64) -> ItemKey;

    /// Key for the item stored under `raw_id`
    fn item_key(&self, raw_id: &[u8]) -> ItemKey;

    /// Authenticated encryption under `key`
    fn encrypt(&self, key: &ItemKey, plaintext: &[u8]) -> SyncResult<Vec<u8>>;

    /// Authenticated decryption under `key`.
    ///
    /// Must fail with [`SyncError::DecryptionFailed`] on a wrong key or
    /// tampered input.
    fn decrypt(&self, key: &ItemKey, ciphertext: &[u8]) -> SyncResult<Vec<u8>>;
}

/// Account storage key.
///
/// # Example
///
/// ```
/// use accountsync_core::crypto::{StorageCipher, StorageKey};
///
/// let storage_key = StorageKey::generate();
/// let key = storage_key.item_key(b"raw-id");
///
/// let ciphertext = storage_key.encrypt(&key, b"record bytes").unwrap();
/// let plaintext = storage_key.decrypt(&key, &ciphertext).unwrap();
///
/// assert_eq!(plaintext, b"record bytes");
/// ```
#[derive(Clone)]
pub struct StorageKey {
    key: [u8; STORAGE_KEY_LENGTH],
}

impl StorageKey {
    pub fn new(key: [u8; STORAGE_KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Build from a slice, failing unless it is exactly 32 bytes
    pub fn from_slice(key: &[u8]) -> SyncResult<Self> {
        let key: [u8; STORAGE_KEY_LENGTH] = key.try_into().map_err(|_| {
            SyncError::Crypto(format!(
                "Storage key must be {} bytes, got {}",
                STORAGE_KEY_LENGTH,
                key.len()
            ))
        })?;
        Ok(Self::new(key))
    }

    /// Generate a new random storage key.
    ///
    /// Uses the system's cryptographically secure random number generator.
    pub fn generate() -> Self {
        let mut key = [0u8; STORAGE_KEY_LENGTH];
        rand::rng().fill_bytes(&mut key);
        Self::new(key)
    }

    fn derive(&self, label: &str) -> ItemKey {
        let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), &self.key);
        let mut output = [0u8; STORAGE_KEY_LENGTH];
        hkdf.expand(label.as_bytes(), &mut output)
            .expect("HKDF expand should never fail with 32-byte output");
        ItemKey(output)
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StorageKey(..)")
    }
}

impl StorageCipher for StorageKey {
    fn manifest_key(&self, version: u64) -> ItemKey {
        self.derive(&format!("Manifest_{}", version))
    }

    fn item_key(&self, raw_id: &[u8]) -> ItemKey {
        self.derive(&format!("Item_{}", BASE64.encode(raw_id)))
    }

    fn encrypt(&self, key: &ItemKey, plaintext: &[u8]) -> SyncResult<Vec<u8>> {
        AeadBox::new(key).encrypt(plaintext)
    }

    fn decrypt(&self, key: &ItemKey, ciphertext: &[u8]) -> SyncResult<Vec<u8>> {
        AeadBox::new(key).decrypt(ciphertext)
    }
}

/// ChaCha20-Poly1305 under one derived key, random nonce per message
struct AeadBox {
    cipher: ChaCha20Poly1305,
}

impl AeadBox {
    fn new(key: &ItemKey) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(key.as_bytes().into()),
        }
    }

    fn encrypt(&self, plaintext: &[u8]) -> SyncResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| SyncError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt(&self, data: &[u8]) -> SyncResult<Vec<u8>> {
        if data.len() < NONCE_SIZE {
            return Err(SyncError::DecryptionFailed(
                "Data too short to contain nonce".to_string(),
            ));
        }

        let (nonce, encrypted) = data.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), encrypted)
            .map_err(|e| SyncError::DecryptionFailed(format!("{}", e)))
    }
}
