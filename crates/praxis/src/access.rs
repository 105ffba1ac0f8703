//! The coarse access ledger.
//!
//! Every consented facility read of a patient record, and every consent
//! change, leaves a plaintext entry here, so patients can review who has
//! dealt with their data without decrypting anything. The ledger carries
//! no record content.

use std::sync::Arc;

use praxis_core::{AccessRecord, FacilityId, SubjectId};
use praxis_store::Store;

use crate::error::Result;

/// Append-only ledger of facility reads.
pub struct AccessLedger<S> {
    store: Arc<S>,
}

impl<S: Store> AccessLedger<S> {
    /// Create a ledger over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record that a facility read a subject's record.
    pub async fn record(&self, subject_id: &SubjectId, facility_id: &FacilityId) -> Result<()> {
        self.store
            .append_access(&AccessRecord {
                subject_id: subject_id.clone(),
                facility_id: facility_id.clone(),
                timestamp_ms: now_millis(),
            })
            .await?;
        Ok(())
    }

    /// The access history for a subject, in insertion order.
    pub async fn history(&self, subject_id: &SubjectId) -> Result<Vec<AccessRecord>> {
        Ok(self.store.load_access(subject_id).await?)
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

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_store::MemoryStore;

    #[tokio::test]
    async fn test_history_is_per_subject() {
        let store = Arc::new(MemoryStore::new());
        let ledger = AccessLedger::new(store);

        let anna = SubjectId::new("p-100");
        let ben = SubjectId::new("p-200");
        ledger
            .record(&anna, &FacilityId::new("c-berlin-cardio"))
            .await
            .unwrap();
        ledger
            .record(&ben, &FacilityId::new("c-hamburg-derma"))
            .await
            .unwrap();
        ledger
            .record(&anna, &FacilityId::new("c-hamburg-derma"))
            .await
            .unwrap();

        let history = ledger.history(&anna).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].facility_id, FacilityId::new("c-berlin-cardio"));
        assert_eq!(history[1].facility_id, FacilityId::new("c-hamburg-derma"));
    }
}
