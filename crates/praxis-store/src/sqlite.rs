//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the Praxis platform. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use praxis_core::{
    AccessRecord, ActorId, AuditAction, AuditEvent, ChainHash, EventId, Facility, FacilityId,
    Slot, SlotId, SubjectId,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        debug!(path = %path.display(), "sqlite store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;
            f(&conn)
        })
        .await
        .map_err(join_failed)?
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    warn!("connection mutex poisoned: {}", e);
    StoreError::Task(format!("connection mutex poisoned: {}", e))
}

fn join_failed(e: tokio::task::JoinError) -> StoreError {
    warn!("blocking task failed: {}", e);
    StoreError::Task(format!("blocking task failed: {}", e))
}

/// Encode a document to CBOR for a doc column.
fn encode_doc<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Decode a document from a doc column.
fn decode_doc<T: DeserializeOwned>(what: &str, bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Corrupt(format!("{}: {}", what, e)))
}

/// Convert a fixed-length blob column into an array.
fn blob_array<const N: usize>(what: &str, bytes: Vec<u8>) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| StoreError::Corrupt(format!("{}: expected {} bytes, got {}", what, N, b.len())))
}

// Helper to convert a row to AuditEvent. Fields live in columns, so there is
// no doc blob for audit events.
fn row_to_audit(row: &rusqlite::Row<'_>) -> Result<AuditEvent> {
    let id_bytes: Vec<u8> = row.get("event_id")?;
    let actor: String = row.get("actor")?;
    let action_str: String = row.get("action")?;
    let subject: Option<String> = row.get("subject_id")?;
    let timestamp_ms: i64 = row.get("timestamp_ms")?;
    let chain_bytes: Vec<u8> = row.get("chain_hash")?;

    let action = AuditAction::parse(&action_str)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown audit action: {}", action_str)))?;

    Ok(AuditEvent {
        id: EventId::from_bytes(blob_array("event_id", id_bytes)?),
        actor: ActorId::new(actor),
        action,
        subject_id: subject.map(SubjectId::new),
        timestamp_ms,
        chain_hash: ChainHash::from_bytes(blob_array("chain_hash", chain_bytes)?),
    })
}

const AUDIT_COLUMNS: &str = "event_id, actor, action, subject_id, timestamp_ms, chain_hash";

#[async_trait]
impl Store for SqliteStore {
    async fn get_record_key(&self, subject_id: &SubjectId) -> Result<Option<[u8; 32]>> {
        let subject_id = subject_id.clone();
        self.blocking(move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT key FROM subject_keys WHERE subject_id = ?1",
                    params![subject_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            bytes.map(|b| blob_array("record key", b)).transpose()
        })
        .await
    }

    async fn put_record_key(&self, subject_id: &SubjectId, key: &[u8; 32]) -> Result<()> {
        let subject_id = subject_id.clone();
        let key = *key;
        self.blocking(move |conn| {
            // First writer wins: a second key for the same subject would
            // orphan the envelope sealed under the first.
            conn.execute(
                "INSERT OR IGNORE INTO subject_keys (subject_id, key, created_at)
                 VALUES (?1, ?2, ?3)",
                params![subject_id.as_str(), key.as_slice(), now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_record_blob(&self, subject_id: &SubjectId) -> Result<Option<Vec<u8>>> {
        let subject_id = subject_id.clone();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT envelope FROM patient_records WHERE subject_id = ?1",
                params![subject_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn put_record_blob(&self, subject_id: &SubjectId, blob: &[u8]) -> Result<()> {
        let subject_id = subject_id.clone();
        let blob = blob.to_vec();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO patient_records (subject_id, envelope, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(subject_id) DO UPDATE SET
                     envelope = excluded.envelope,
                     updated_at = excluded.updated_at",
                params![subject_id.as_str(), blob.as_slice(), now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn append_audit(&self, event: &AuditEvent) -> Result<()> {
        let event = event.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO audit_events
                     (event_id, actor, action, subject_id, timestamp_ms, chain_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.id.as_bytes().as_slice(),
                    event.actor.as_str(),
                    event.action.as_str(),
                    event.subject_id.as_ref().map(|s| s.as_str()),
                    event.timestamp_ms,
                    event.chain_hash.as_bytes().as_slice(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn last_audit(&self) -> Result<Option<AuditEvent>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM audit_events ORDER BY seq DESC LIMIT 1",
                AUDIT_COLUMNS
            ))?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_audit(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn load_audit(&self) -> Result<Vec<AuditEvent>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM audit_events ORDER BY seq",
                AUDIT_COLUMNS
            ))?;
            let mut rows = stmt.query([])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(row_to_audit(row)?);
            }
            Ok(events)
        })
        .await
    }

    async fn load_audit_for_subject(&self, subject_id: &SubjectId) -> Result<Vec<AuditEvent>> {
        let subject_id = subject_id.clone();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM audit_events WHERE subject_id = ?1 ORDER BY seq",
                AUDIT_COLUMNS
            ))?;
            let mut rows = stmt.query(params![subject_id.as_str()])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(row_to_audit(row)?);
            }
            Ok(events)
        })
        .await
    }

    async fn append_access(&self, record: &AccessRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO access_records (subject_id, facility_id, timestamp_ms)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.subject_id.as_str(),
                    record.facility_id.as_str(),
                    record.timestamp_ms,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn load_access(&self, subject_id: &SubjectId) -> Result<Vec<AccessRecord>> {
        let subject_id = subject_id.clone();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT subject_id, facility_id, timestamp_ms
                 FROM access_records WHERE subject_id = ?1 ORDER BY seq",
            )?;
            let records = stmt
                .query_map(params![subject_id.as_str()], |row| {
                    let subject: String = row.get(0)?;
                    let facility: String = row.get(1)?;
                    let timestamp_ms: i64 = row.get(2)?;
                    Ok(AccessRecord {
                        subject_id: SubjectId::new(subject),
                        facility_id: FacilityId::new(facility),
                        timestamp_ms,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        let slot_id = slot_id.clone();
        self.blocking(move |conn| {
            let doc: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT doc FROM slots WHERE slot_id = ?1",
                    params![slot_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            doc.map(|d| decode_doc("slot", &d)).transpose()
        })
        .await
    }

    async fn upsert_slot(&self, slot: &Slot) -> Result<()> {
        let doc = encode_doc(slot)?;
        let slot = slot.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO slots (slot_id, facility_id, status, start_ms, doc)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(slot_id) DO UPDATE SET
                     facility_id = excluded.facility_id,
                     status = excluded.status,
                     start_ms = excluded.start_ms,
                     doc = excluded.doc",
                params![
                    slot.id.as_str(),
                    slot.facility_id.as_str(),
                    slot.status.as_str(),
                    slot.start_ms,
                    doc.as_slice(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_slots(&self) -> Result<Vec<Slot>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare("SELECT doc FROM slots ORDER BY start_ms, slot_id")?;
            let mut rows = stmt.query([])?;
            let mut slots = Vec::new();
            while let Some(row) = rows.next()? {
                let doc: Vec<u8> = row.get(0)?;
                slots.push(decode_doc("slot", &doc)?);
            }
            Ok(slots)
        })
        .await
    }

    async fn get_facility(&self, facility_id: &FacilityId) -> Result<Option<Facility>> {
        let facility_id = facility_id.clone();
        self.blocking(move |conn| {
            let doc: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT doc FROM facilities WHERE facility_id = ?1",
                    params![facility_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            doc.map(|d| decode_doc("facility", &d)).transpose()
        })
        .await
    }

    async fn upsert_facility(&self, facility: &Facility) -> Result<()> {
        let doc = encode_doc(facility)?;
        let facility_id = facility.id.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO facilities (facility_id, doc) VALUES (?1, ?2)
                 ON CONFLICT(facility_id) DO UPDATE SET doc = excluded.doc",
                params![facility_id.as_str(), doc.as_slice()],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_facilities(&self) -> Result<Vec<Facility>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare("SELECT doc FROM facilities ORDER BY facility_id")?;
            let mut rows = stmt.query([])?;
            let mut facilities = Vec::new();
            while let Some(row) = rows.next()? {
                let doc: Vec<u8> = row.get(0)?;
                facilities.push(decode_doc("facility", &doc)?);
            }
            Ok(facilities)
        })
        .await
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
    use praxis_core::{Occupant, PatientProfile, SlotStatus};
    use std::collections::BTreeSet;

    fn profile() -> PatientProfile {
        PatientProfile {
            id: SubjectId::new("p-100"),
            email: "anna@example.org".into(),
            first_name: "Anna".into(),
            last_name: "Becker".into(),
            date_of_birth: "1987-03-14".into(),
        }
    }

    #[tokio::test]
    async fn test_record_key_first_writer_wins() {
        let store = SqliteStore::open_memory().unwrap();
        let subject = SubjectId::new("p-100");

        assert!(store.get_record_key(&subject).await.unwrap().is_none());

        store.put_record_key(&subject, &[1u8; 32]).await.unwrap();
        store.put_record_key(&subject, &[2u8; 32]).await.unwrap();

        assert_eq!(
            store.get_record_key(&subject).await.unwrap(),
            Some([1u8; 32])
        );
    }

    #[tokio::test]
    async fn test_record_blob_upsert() {
        let store = SqliteStore::open_memory().unwrap();
        let subject = SubjectId::new("p-100");

        assert!(store.get_record_blob(&subject).await.unwrap().is_none());

        store.put_record_blob(&subject, b"envelope v1").await.unwrap();
        store.put_record_blob(&subject, b"envelope v2").await.unwrap();

        assert_eq!(
            store.get_record_blob(&subject).await.unwrap(),
            Some(b"envelope v2".to_vec())
        );
    }

    #[tokio::test]
    async fn test_audit_roundtrip_preserves_chain() {
        let store = SqliteStore::open_memory().unwrap();

        let mut prev = ChainHash::ZERO;
        let mut appended = Vec::new();
        for i in 0..3u8 {
            let event = AuditEvent::content(
                EventId::from_bytes([i; 16]),
                ActorId::new("staff-1"),
                AuditAction::BookAppointment,
                Some(SubjectId::new("p-100")),
                1_000 + i as i64,
            )
            .chained(&prev);
            prev = event.chain_hash;
            store.append_audit(&event).await.unwrap();
            appended.push(event);
        }

        let loaded = store.load_audit().await.unwrap();
        assert_eq!(loaded, appended);
        assert!(praxis_core::verify_chain(&loaded).is_ok());
        assert_eq!(store.last_audit().await.unwrap().unwrap(), appended[2]);
    }

    #[tokio::test]
    async fn test_audit_subject_filter_handles_null_subject() {
        let store = SqliteStore::open_memory().unwrap();

        let admin_event = AuditEvent::content(
            EventId::from_bytes([0xaa; 16]),
            ActorId::new("staff-1"),
            AuditAction::CreateSlot,
            None,
            1_000,
        )
        .chained(&ChainHash::ZERO);
        store.append_audit(&admin_event).await.unwrap();

        let patient_event = AuditEvent::content(
            EventId::from_bytes([0xbb; 16]),
            ActorId::new("p-100"),
            AuditAction::BookAppointment,
            Some(SubjectId::new("p-100")),
            2_000,
        )
        .chained(&admin_event.chain_hash);
        store.append_audit(&patient_event).await.unwrap();

        let filtered = store
            .load_audit_for_subject(&SubjectId::new("p-100"))
            .await
            .unwrap();
        assert_eq!(filtered, vec![patient_event]);
    }

    #[tokio::test]
    async fn test_access_records_ordered() {
        let store = SqliteStore::open_memory().unwrap();
        let subject = SubjectId::new("p-100");

        for (i, facility) in ["c-1", "c-2"].iter().enumerate() {
            store
                .append_access(&AccessRecord {
                    subject_id: subject.clone(),
                    facility_id: FacilityId::new(*facility),
                    timestamp_ms: 1_000 + i as i64,
                })
                .await
                .unwrap();
        }

        let records = store.load_access(&subject).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].facility_id, FacilityId::new("c-1"));
        assert!(store
            .load_access(&SubjectId::new("p-999"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_slot_document_roundtrip_with_occupant() {
        let store = SqliteStore::open_memory().unwrap();

        let mut slot = Slot::new("slot-001", "c-1", 1_000, 2_000, true)
            .with_department("d-echo")
            .with_provider("dr-weber");
        slot.book(Occupant::from_profile(profile())).unwrap();

        store.upsert_slot(&slot).await.unwrap();
        let loaded = store.get_slot(&slot.id).await.unwrap().unwrap();
        assert_eq!(loaded, slot);
        assert_eq!(loaded.status, SlotStatus::Booked);
    }

    #[tokio::test]
    async fn test_list_slots_sorted_by_start_then_id() {
        let store = SqliteStore::open_memory().unwrap();
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

    #[tokio::test]
    async fn test_facility_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let facility = Facility {
            id: FacilityId::new("c-berlin-cardio"),
            name: "GesundHerz Zentrum".into(),
            city: "Berlin".into(),
            street: "Friedrichstraße 12".into(),
            postal_code: "10117".into(),
            contact_email: "kontakt@gesundherz.de".into(),
            specialties: BTreeSet::from([praxis_core::Specialty::Cardiology]),
            departments: Vec::new(),
            providers: Vec::new(),
        };

        store.upsert_facility(&facility).await.unwrap();
        let loaded = store.get_facility(&facility.id).await.unwrap().unwrap();
        assert_eq!(loaded, facility);
        assert_eq!(store.list_facilities().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("praxis.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .put_record_key(&SubjectId::new("p-100"), &[7u8; 32])
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store
                .get_record_key(&SubjectId::new("p-100"))
                .await
                .unwrap(),
            Some([7u8; 32])
        );
    }
}
