//! # Praxis Vault
//!
//! Encrypted record storage and consent policy for the Praxis platform.
//!
//! ## Overview
//!
//! Patient records rest in the store as sealed ChaCha20-Poly1305 envelopes,
//! one per subject, under per-subject keys managed by the [`Keyring`]. The
//! [`RecordVault`] moves records across the encryption boundary; the
//! [`ConsentGate`] decides, purely, who may read a decrypted record.
//!
//! ## Key Types
//!
//! - [`RecordVault`] - Load and store sealed patient records
//! - [`Keyring`] - Per-subject record key management
//! - [`SealedEnvelope`] - The at-rest ciphertext format
//! - [`ConsentGate`] - Pure read-authorization policy
//!
//! ## Design Notes
//!
//! - **Integrity over silence**: an existing record that cannot be
//!   recovered is an error, never `None`
//! - **Keys persist before use**: a key is stored before anything is
//!   sealed under it
//! - **Fresh nonce per seal**: envelopes are never rewritten in place

pub mod consent;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod keyring;
pub mod vault;

pub use consent::ConsentGate;
pub use crypto::{RecordKey, RecordNonce};
pub use envelope::{EnvelopeFormat, SealedEnvelope};
pub use error::{Result, VaultError};
pub use keyring::Keyring;
pub use vault::RecordVault;
