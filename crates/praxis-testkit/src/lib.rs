//! # Praxis Testkit
//!
//! Testing utilities for the Praxis platform.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a seeded facility directory, open slots, and identities
//!   for every role
//! - **Generators**: proptest strategies for property-based testing
//! - **Scenarios**: end-to-end integration tests under `tests/`
//!
//! ## Fixtures
//!
//! Quickly set up a platform over an in-memory store:
//!
//! ```rust,ignore
//! use praxis_testkit::fixtures::{anna, TestFixture};
//! use praxis::SlotId;
//!
//! let fixture = TestFixture::seeded().await;
//! fixture.platform.book(&anna(), &SlotId::new("slot-001")).await?;
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use praxis_testkit::generators::{chain_events, EventParams};
//!
//! proptest! {
//!     #[test]
//!     fn chains_verify(params in prop::collection::vec(any::<EventParams>(), 0..16)) {
//!         prop_assert!(praxis::verify_chain(&chain_events(&params)).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    anna, ben, berlin_admin, berlin_cardio, berlin_provider, hamburg_derma, hamburg_provider,
    platform_admin, random_patient, seed_facilities, seed_slots, TestFixture,
};
pub use generators::{chain_events, EventParams};
