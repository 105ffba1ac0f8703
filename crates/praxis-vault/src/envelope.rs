//! Sealed record envelope.
//!
//! A patient record at rest is a [`SealedEnvelope`]: the AEAD ciphertext
//! plus the metadata needed to open it again. The envelope itself is what
//! the store persists; the store never sees plaintext.

use serde::{Deserialize, Serialize};

use crate::crypto::{RecordKey, RecordNonce};
use crate::error::{Result, VaultError};

/// Format identifier for sealed envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnvelopeFormat {
    /// ChaCha20-Poly1305 with 256-bit key.
    ChaCha20Poly1305 = 1,
}

/// A sealed record envelope.
///
/// Wraps encrypted record bytes together with the metadata needed to
/// decrypt them, assuming the caller holds the subject's record key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// Encryption algorithm used.
    pub format: EnvelopeFormat,

    /// Nonce used for sealing (unique per seal).
    pub nonce: RecordNonce,

    /// The encrypted record (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    /// Seal plaintext under the given key with a fresh nonce.
    pub fn seal(plaintext: &[u8], key: &RecordKey) -> Result<Self> {
        let nonce = RecordNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;

        Ok(Self {
            format: EnvelopeFormat::ChaCha20Poly1305,
            nonce,
            ciphertext,
        })
    }

    /// Open the envelope with the given key.
    pub fn open(&self, key: &RecordKey) -> Result<Vec<u8>> {
        match self.format {
            EnvelopeFormat::ChaCha20Poly1305 => key.decrypt(&self.ciphertext, &self.nonce),
        }
    }

    /// Serialize to CBOR bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| VaultError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| VaultError::Serialization(e.to_string()))
    }
}
