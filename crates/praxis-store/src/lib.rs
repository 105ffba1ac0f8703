//! # Praxis Store
//!
//! Storage abstraction for the Praxis platform. Provides a trait-based
//! interface for persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait,
//! keeping the vault, the slot registry, and the coordinator
//! storage-agnostic. The primary implementation is [`SqliteStore`], with
//! [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`KeyedLocks`] - Per-key async mutexes for read-modify-write cycles
//!
//! ## Design Notes
//!
//! - **Opaque envelopes**: patient records are stored sealed; the store
//!   never sees plaintext
//! - **Append-only logs**: audit events and access records keep insertion
//!   order and are never rewritten
//! - **Blocking offload**: SQLite work runs on the blocking pool via
//!   `spawn_blocking`

pub mod error;
pub mod locks;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use locks::KeyedLocks;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
