//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use praxis_core::{AccessRecord, AuditEvent, Facility, FacilityId, Slot, SlotId, SubjectId};

use crate::error::Result;
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Record keys by subject.
    keys: HashMap<SubjectId, [u8; 32]>,

    /// Sealed record envelopes by subject.
    blobs: HashMap<SubjectId, Vec<u8>>,

    /// Audit events in insertion order.
    audit: Vec<AuditEvent>,

    /// Access records in insertion order.
    access: Vec<AccessRecord>,

    /// Slots by id.
    slots: HashMap<SlotId, Slot>,

    /// Facilities by id.
    facilities: HashMap<FacilityId, Facility>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_record_key(&self, subject_id: &SubjectId) -> Result<Option<[u8; 32]>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.keys.get(subject_id).copied())
    }

    async fn put_record_key(&self, subject_id: &SubjectId, key: &[u8; 32]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.keys.entry(subject_id.clone()).or_insert(*key);
        Ok(())
    }

    async fn get_record_blob(&self, subject_id: &SubjectId) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.blobs.get(subject_id).cloned())
    }

    async fn put_record_blob(&self, subject_id: &SubjectId, blob: &[u8]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.blobs.insert(subject_id.clone(), blob.to_vec());
        Ok(())
    }

    async fn append_audit(&self, event: &AuditEvent) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.audit.push(event.clone());
        Ok(())
    }

    async fn last_audit(&self) -> Result<Option<AuditEvent>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.audit.last().cloned())
    }

    async fn load_audit(&self) -> Result<Vec<AuditEvent>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.audit.clone())
    }

    async fn load_audit_for_subject(&self, subject_id: &SubjectId) -> Result<Vec<AuditEvent>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .audit
            .iter()
            .filter(|e| e.subject_id.as_ref() == Some(subject_id))
            .cloned()
            .collect())
    }

    async fn append_access(&self, record: &AccessRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.access.push(record.clone());
        Ok(())
    }

    async fn load_access(&self, subject_id: &SubjectId) -> Result<Vec<AccessRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .access
            .iter()
            .filter(|r| &r.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.slots.get(slot_id).cloned())
    }

    async fn upsert_slot(&self, slot: &Slot) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.slots.insert(slot.id.clone(), slot.clone());
        Ok(())
    }

    async fn list_slots(&self) -> Result<Vec<Slot>> {
        let inner = self.inner.read().unwrap();
        let mut slots: Vec<Slot> = inner.slots.values().cloned().collect();
        slots.sort_by(|a, b| (a.start_ms, &a.id).cmp(&(b.start_ms, &b.id)));
        Ok(slots)
    }

    async fn get_facility(&self, facility_id: &FacilityId) -> Result<Option<Facility>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.facilities.get(facility_id).cloned())
    }

    async fn upsert_facility(&self, facility: &Facility) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .facilities
            .insert(facility.id.clone(), facility.clone());
        Ok(())
    }

    async fn list_facilities(&self) -> Result<Vec<Facility>> {
        let inner = self.inner.read().unwrap();
        let mut facilities: Vec<Facility> = inner.facilities.values().cloned().collect();
        facilities.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(facilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::{ActorId, AuditAction, ChainHash, EventId};

    #[tokio::test]
    async fn test_record_key_first_writer_wins() {
        let store = MemoryStore::new();
        let subject = SubjectId::new("p-100");

        assert!(store.get_record_key(&subject).await.unwrap().is_none());

        store.put_record_key(&subject, &[1u8; 32]).await.unwrap();
        store.put_record_key(&subject, &[2u8; 32]).await.unwrap();

        assert_eq!(store.get_record_key(&subject).await.unwrap(), Some([1u8; 32]));
    }

    #[tokio::test]
    async fn test_record_blob_replaced_atomically() {
        let store = MemoryStore::new();
        let subject = SubjectId::new("p-100");

        store.put_record_blob(&subject, b"v1").await.unwrap();
        store.put_record_blob(&subject, b"v2").await.unwrap();

        assert_eq!(
            store.get_record_blob(&subject).await.unwrap(),
            Some(b"v2".to_vec())
        );
    }

    #[tokio::test]
    async fn test_audit_insertion_order_and_subject_filter() {
        let store = MemoryStore::new();
        let mut prev = ChainHash::ZERO;
        for i in 0..3 {
            let subject = if i == 1 { "p-200" } else { "p-100" };
            let event = AuditEvent::content(
                EventId::from_bytes([i as u8; 16]),
                ActorId::new("staff-1"),
                AuditAction::ReadRecord,
                Some(SubjectId::new(subject)),
                1_000 + i as i64,
            )
            .chained(&prev);
            prev = event.chain_hash;
            store.append_audit(&event).await.unwrap();
        }

        let all = store.load_audit().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(store.last_audit().await.unwrap().unwrap(), all[2]);

        let filtered = store
            .load_audit_for_subject(&SubjectId::new("p-100"))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[tokio::test]
    async fn test_slots_sorted_by_start_then_id() {
        let store = MemoryStore::new();
        store
            .upsert_slot(&Slot::new("slot-b", "c-1", 2_000, 3_000, false))
            .await
            .unwrap();
        store
            .upsert_slot(&Slot::new("slot-a", "c-1", 2_000, 3_000, false))
            .await
            .unwrap();
        store
            .upsert_slot(&Slot::new("slot-c", "c-1", 1_000, 2_000, false))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list_slots()
            .await
            .unwrap()
            .iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["slot-c", "slot-a", "slot-b"]);
    }
}
