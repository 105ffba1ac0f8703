//! The record vault: encrypted persistence of patient records.
//!
//! Records cross the vault boundary as plaintext [`PatientRecord`] values
//! and rest in the store as sealed envelopes. A record that exists but
//! cannot be recovered surfaces as [`VaultError::Integrity`], never as an
//! absent record: callers must be able to distinguish "no record" from
//! "record destroyed".

use std::sync::Arc;

use praxis_core::{PatientRecord, SubjectId};
use praxis_store::Store;
use tracing::debug;

use crate::envelope::SealedEnvelope;
use crate::error::{Result, VaultError};
use crate::keyring::Keyring;

/// Encrypted store of per-subject patient records.
pub struct RecordVault<S> {
    store: Arc<S>,
    keyring: Keyring<S>,
}

impl<S: Store> RecordVault<S> {
    /// Create a vault over a store.
    pub fn new(store: Arc<S>) -> Self {
        let keyring = Keyring::new(store.clone());
        Self { store, keyring }
    }

    /// Load and decrypt the record for a subject.
    ///
    /// Returns `Ok(None)` when no record exists. Any failure to recover an
    /// existing record is an integrity error.
    pub async fn load(&self, subject_id: &SubjectId) -> Result<Option<PatientRecord>> {
        let Some(blob) = self.store.get_record_blob(subject_id).await? else {
            return Ok(None);
        };

        let key = self
            .keyring
            .get(subject_id)
            .await?
            .ok_or_else(|| VaultError::Integrity {
                subject: subject_id.clone(),
                detail: "envelope present but record key missing".to_string(),
            })?;

        let envelope =
            SealedEnvelope::from_bytes(&blob).map_err(|e| VaultError::Integrity {
                subject: subject_id.clone(),
                detail: format!("malformed envelope: {}", e),
            })?;

        let plaintext = envelope.open(&key).map_err(|e| VaultError::Integrity {
            subject: subject_id.clone(),
            detail: format!("envelope failed to open: {}", e),
        })?;

        let record: PatientRecord =
            ciborium::from_reader(plaintext.as_slice()).map_err(|e| VaultError::Integrity {
                subject: subject_id.clone(),
                detail: format!("record failed to decode: {}", e),
            })?;

        if record.subject_id() != subject_id {
            return Err(VaultError::Integrity {
                subject: subject_id.clone(),
                detail: format!("envelope holds record for {}", record.subject_id()),
            });
        }

        Ok(Some(record))
    }

    /// Encrypt and persist a record, replacing any previous envelope.
    ///
    /// The record key is fetched (or created and persisted) per call, and
    /// every seal uses a fresh nonce.
    pub async fn store(&self, record: &PatientRecord) -> Result<()> {
        let subject_id = record.subject_id();
        let key = self.keyring.get_or_create(subject_id).await?;

        let mut plaintext = Vec::new();
        ciborium::into_writer(record, &mut plaintext)
            .map_err(|e| VaultError::Serialization(e.to_string()))?;

        let envelope = SealedEnvelope::seal(&plaintext, &key)?;
        let blob = envelope.to_bytes()?;
        self.store.put_record_blob(subject_id, &blob).await?;

        debug!(subject = %subject_id, bytes = blob.len(), "sealed record stored");
        Ok(())
    }
}
