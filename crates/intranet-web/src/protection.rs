//! Named-purpose data protection for cookie payloads.
//!
//! Every purpose gets its own AES-256-GCM key derived with HMAC-SHA256
//! from the master key, so a payload protected for one purpose cannot be
//! unprotected under another. Protected payloads are `nonce || ciphertext`.

use std::sync::Arc;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use intranet_core::error::AppError;
use intranet_core::result::AppResult;
use intranet_security::{Protect, Unprotect};

/// Purpose protecting token cookies.
pub const TOKEN_PROTECTION_PURPOSE: &str = "TokenProtection";

/// Purpose protecting state cookies.
pub const STATE_PROTECTION_PURPOSE: &str = "StateProtection";

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits)
const KEY_SIZE: usize = 32;

/// Creates purpose-bound protectors from a master key.
#[derive(Clone)]
pub struct DataProtectionProvider {
    master_key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for DataProtectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProtectionProvider").finish_non_exhaustive()
    }
}

impl DataProtectionProvider {
    /// Creates a provider from a 32-byte master key.
    pub fn new(master_key: [u8; KEY_SIZE]) -> Self {
        Self { master_key }
    }

    /// Creates a provider from a base64-encoded 32-byte master key.
    pub fn from_base64_key(key: &str) -> AppResult<Self> {
        let bytes = BASE64
            .decode(key.trim())
            .map_err(|e| AppError::configuration(format!("Data protection key is not base64: {e}")))?;
        let master_key: [u8; KEY_SIZE] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            AppError::configuration(format!(
                "Data protection key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::new(master_key))
    }

    /// Creates the protector for `purpose`.
    pub fn create_protector(&self, purpose: &str) -> AppResult<DataProtector> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&self.master_key)
            .map_err(|e| AppError::data_protection(format!("Failed to derive key: {e}")))?;
        mac.update(purpose.as_bytes());
        let derived = mac.finalize().into_bytes();

        let cipher = Aes256Gcm::new_from_slice(&derived)
            .map_err(|e| AppError::data_protection(format!("Failed to create cipher: {e}")))?;

        Ok(DataProtector {
            purpose: purpose.to_string(),
            cipher,
        })
    }
}

/// Protects and unprotects payloads for one purpose.
#[derive(Clone)]
pub struct DataProtector {
    purpose: String,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for DataProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProtector")
            .field("purpose", &self.purpose)
            .finish_non_exhaustive()
    }
}

impl DataProtector {
    /// Purpose this protector is bound to.
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// Encrypts `plaintext`.
    pub fn protect(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| AppError::data_protection(format!("Encryption failed: {e}")))?;

        let mut protected = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        protected.extend_from_slice(&nonce);
        protected.extend_from_slice(&ciphertext);
        Ok(protected)
    }

    /// Decrypts a payload produced by [`Self::protect`] for the same
    /// purpose.
    pub fn unprotect(&self, protected: &[u8]) -> AppResult<Vec<u8>> {
        if protected.len() <= NONCE_SIZE {
            return Err(AppError::data_protection("Protected payload is truncated"));
        }

        let (nonce, ciphertext) = protected.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                AppError::data_protection(format!(
                    "Payload was not protected for purpose '{}'",
                    self.purpose
                ))
            })
    }

    /// This protector as a [`Protect`] function.
    pub fn to_protect(&self) -> Protect {
        let protector = self.clone();
        Arc::new(move |bytes: &[u8]| protector.protect(bytes))
    }

    /// This protector as an [`Unprotect`] function.
    pub fn to_unprotect(&self) -> Unprotect {
        let protector = self.clone();
        Arc::new(move |bytes: &[u8]| protector.unprotect(bytes))
    }
}
