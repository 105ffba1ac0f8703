//! The append-only, hash-chained audit log.
//!
//! Chaining requires reading the current tail and appending in one step,
//! so the log keeps a single-writer mutex. Readers go straight to the
//! store; only appends serialize.

use std::sync::Arc;

use praxis_core::{ActorId, AuditAction, AuditEvent, ChainHash, EventId, SubjectId};
use praxis_store::Store;
use tokio::sync::Mutex;

use crate::error::{PlatformError, Result};

/// Append-only audit log over a store.
pub struct AuditLog<S> {
    store: Arc<S>,
    writer: Mutex<()>,
}

impl<S: Store> AuditLog<S> {
    /// Create an audit log over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// Append an event, chained to the current tail.
    pub async fn append(
        &self,
        actor: ActorId,
        action: AuditAction,
        subject_id: Option<SubjectId>,
    ) -> Result<AuditEvent> {
        let _guard = self.writer.lock().await;

        let prev = self
            .store
            .last_audit()
            .await?
            .map(|e| e.chain_hash)
            .unwrap_or(ChainHash::ZERO);

        let event = AuditEvent::content(
            EventId::generate(),
            actor,
            action,
            subject_id,
            now_millis(),
        )
        .chained(&prev);

        self.store.append_audit(&event).await?;
        Ok(event)
    }

    /// Verify the whole chain. Returns the number of verified events.
    pub async fn verify(&self) -> Result<usize> {
        let events = self.store.load_audit().await?;
        praxis_core::verify_chain(&events)
            .map_err(|e| PlatformError::Integrity(e.to_string()))?;
        Ok(events.len())
    }

    /// The events concerning a subject, in insertion order.
    pub async fn events_for(&self, subject_id: &SubjectId) -> Result<Vec<AuditEvent>> {
        Ok(self.store.load_audit_for_subject(subject_id).await?)
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
