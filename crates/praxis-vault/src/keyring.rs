//! Per-subject record key management.
//!
//! One record key exists per subject, created lazily on first use and
//! persisted before anything is sealed under it. The store guarantees the
//! first written key wins, so racing creators converge on the same key.

use std::sync::Arc;

use praxis_core::SubjectId;
use praxis_store::Store;

use crate::crypto::RecordKey;
use crate::error::{Result, VaultError};

/// Manages per-subject record keys on top of a store.
pub struct Keyring<S> {
    store: Arc<S>,
}

impl<S: Store> Keyring<S> {
    /// Create a keyring over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The record key for a subject, if one has been created.
    pub async fn get(&self, subject_id: &SubjectId) -> Result<Option<RecordKey>> {
        Ok(self
            .store
            .get_record_key(subject_id)
            .await?
            .map(RecordKey::from_bytes))
    }

    /// The record key for a subject, creating one if none exists.
    ///
    /// The key is persisted before it is returned: a key that was used to
    /// seal an envelope but never stored would leave the envelope
    /// unrecoverable.
    pub async fn get_or_create(&self, subject_id: &SubjectId) -> Result<RecordKey> {
        if let Some(bytes) = self.store.get_record_key(subject_id).await? {
            return Ok(RecordKey::from_bytes(bytes));
        }

        let candidate = RecordKey::generate();
        self.store
            .put_record_key(subject_id, candidate.as_bytes())
            .await?;

        // Re-read after writing: if another task created the key first,
        // the stored key wins over our candidate.
        let bytes = self
            .store
            .get_record_key(subject_id)
            .await?
            .ok_or_else(|| VaultError::Integrity {
                subject: subject_id.clone(),
                detail: "record key missing immediately after creation".to_string(),
            })?;
        Ok(RecordKey::from_bytes(bytes))
    }
}
