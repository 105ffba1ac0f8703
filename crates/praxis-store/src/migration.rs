//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            debug!(version, "schema migration applied");

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Task(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Per-subject record keys. One row per subject, written once.
        CREATE TABLE subject_keys (
            subject_id TEXT PRIMARY KEY,
            key BLOB NOT NULL,                -- 32 bytes
            created_at INTEGER NOT NULL
        );

        -- Sealed record envelopes. The store never sees plaintext.
        CREATE TABLE patient_records (
            subject_id TEXT PRIMARY KEY,
            envelope BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Append-only audit log. seq preserves insertion order.
        CREATE TABLE audit_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id BLOB NOT NULL UNIQUE,    -- 16 bytes
            actor TEXT NOT NULL,
            action TEXT NOT NULL,
            subject_id TEXT,                  -- nullable: slot admin has no subject
            timestamp_ms INTEGER NOT NULL,
            chain_hash BLOB NOT NULL          -- 32 bytes
        );

        -- Plaintext access ledger: who read whose record, when.
        CREATE TABLE access_records (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_id TEXT NOT NULL,
            facility_id TEXT NOT NULL,
            timestamp_ms INTEGER NOT NULL
        );

        -- Slots. Indexed columns for search, full document in doc.
        CREATE TABLE slots (
            slot_id TEXT PRIMARY KEY,
            facility_id TEXT NOT NULL,
            status TEXT NOT NULL,
            start_ms INTEGER NOT NULL,
            doc BLOB NOT NULL                 -- CBOR slot document
        );

        -- Facility directory.
        CREATE TABLE facilities (
            facility_id TEXT PRIMARY KEY,
            doc BLOB NOT NULL                 -- CBOR facility document
        );

        -- Indexes for common queries
        CREATE INDEX idx_audit_subject ON audit_events(subject_id);
        CREATE INDEX idx_access_subject ON access_records(subject_id);
        CREATE INDEX idx_slots_facility ON slots(facility_id, start_ms);
        CREATE INDEX idx_slots_start ON slots(start_ms);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
