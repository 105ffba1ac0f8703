//! Cryptographic primitives for record encryption.
//!
//! Provides ChaCha20-Poly1305 authenticated encryption under per-subject
//! record keys. Key agreement and signing are out of scope: keys never
//! leave the platform, so symmetric AEAD is sufficient.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// A 256-bit symmetric record key for ChaCha20-Poly1305.
///
/// One key exists per subject. No Debug impl: key material must not end
/// up in logs.
#[derive(Clone)]
pub struct RecordKey([u8; 32]);

impl RecordKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt data with this key.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &RecordNonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| VaultError::Crypto(e.to_string()))
    }

    /// Decrypt data with this key.
    ///
    /// Fails when the ciphertext or its authentication tag has been
    /// altered, or when a different key sealed it.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &RecordNonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| VaultError::Crypto("authentication failed".to_string()))
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordNonce(pub [u8; 12]);

impl RecordNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 12];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}
