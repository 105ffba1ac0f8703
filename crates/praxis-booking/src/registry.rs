//! The slot registry: lifecycle and search over bookable slots.
//!
//! The registry drives the slot state machine under per-slot locks and
//! persists every transition. Two tasks racing for the last open slot are
//! serialized by the lock: one books, the other sees `Booked` and gets a
//! conflict.

use std::collections::HashMap;
use std::sync::Arc;

use praxis_core::{Facility, FacilityId, Occupant, Slot, SlotId, SlotPatch, SlotStatus};
use praxis_store::{KeyedLocks, Store};
use tracing::info;

use crate::error::{RegistryError, Result};
use crate::search::{FacilityQuery, SlotQuery};

/// Lifecycle and search over bookable slots.
pub struct SlotRegistry<S> {
    store: Arc<S>,
    locks: KeyedLocks,
}

impl<S: Store> SlotRegistry<S> {
    /// Create a registry over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    /// Register a new open slot.
    ///
    /// The slot id must be unused and the facility must exist in the
    /// directory. Whatever status the caller passed in, the slot is
    /// registered open with no occupant.
    pub async fn create(&self, mut slot: Slot) -> Result<Slot> {
        if slot.end_ms <= slot.start_ms {
            return Err(RegistryError::InvalidSlot(format!(
                "slot {} ends at {} before it starts at {}",
                slot.id, slot.end_ms, slot.start_ms
            )));
        }
        if self.store.get_facility(&slot.facility_id).await?.is_none() {
            return Err(RegistryError::FacilityNotFound(slot.facility_id.clone()));
        }

        let _guard = self.locks.acquire(slot.id.as_str()).await;

        if self.store.get_slot(&slot.id).await?.is_some() {
            return Err(RegistryError::SlotExists(slot.id.clone()));
        }

        slot.status = SlotStatus::Open;
        slot.occupant = None;
        self.store.upsert_slot(&slot).await?;
        info!(slot = %slot.id, facility = %slot.facility_id, "slot created");
        Ok(slot)
    }

    /// Get a slot by id.
    pub async fn get(&self, slot_id: &SlotId) -> Result<Slot> {
        self.store
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| RegistryError::SlotNotFound(slot_id.clone()))
    }

    /// Book an open slot for an occupant.
    pub async fn book(&self, slot_id: &SlotId, occupant: Occupant) -> Result<Slot> {
        let _guard = self.locks.acquire(slot_id.as_str()).await;

        let mut slot = self.get(slot_id).await?;
        slot.book(occupant)?;
        self.store.upsert_slot(&slot).await?;
        info!(slot = %slot.id, "slot booked");
        Ok(slot)
    }

    /// Free a slot back to open, evicting any occupant.
    pub async fn release(&self, slot_id: &SlotId) -> Result<(Slot, Option<Occupant>)> {
        let _guard = self.locks.acquire(slot_id.as_str()).await;

        let mut slot = self.get(slot_id).await?;
        let evicted = slot.release();
        self.store.upsert_slot(&slot).await?;
        info!(slot = %slot.id, evicted = evicted.is_some(), "slot released");
        Ok((slot, evicted))
    }

    /// Withdraw a slot, evicting any occupant. Terminal.
    pub async fn cancel(&self, slot_id: &SlotId) -> Result<(Slot, Option<Occupant>)> {
        let _guard = self.locks.acquire(slot_id.as_str()).await;

        let mut slot = self.get(slot_id).await?;
        let evicted = slot.cancel();
        self.store.upsert_slot(&slot).await?;
        info!(slot = %slot.id, evicted = evicted.is_some(), "slot cancelled");
        Ok((slot, evicted))
    }

    /// Edit a slot's schedulable fields, preserving status and occupant.
    pub async fn update(&self, slot_id: &SlotId, patch: &SlotPatch) -> Result<Slot> {
        let _guard = self.locks.acquire(slot_id.as_str()).await;

        let mut slot = self.get(slot_id).await?;
        slot.apply_patch(patch);
        if slot.end_ms <= slot.start_ms {
            return Err(RegistryError::InvalidSlot(format!(
                "patch leaves slot {} ending at {} before it starts at {}",
                slot.id, slot.end_ms, slot.start_ms
            )));
        }
        self.store.upsert_slot(&slot).await?;
        info!(slot = %slot.id, "slot updated");
        Ok(slot)
    }

    /// Search slots, ordered by (start time, slot id).
    pub async fn search(&self, query: &SlotQuery) -> Result<Vec<Slot>> {
        // The facility map is only needed to resolve specialty filters.
        let facilities: HashMap<FacilityId, Facility> = if query.specialty.is_some() {
            self.store
                .list_facilities()
                .await?
                .into_iter()
                .map(|f| (f.id.clone(), f))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(self
            .store
            .list_slots()
            .await?
            .into_iter()
            .filter(|slot| query.matches(slot, facilities.get(&slot.facility_id)))
            .collect())
    }

    /// Search the facility directory, ordered by facility id.
    pub async fn search_facilities(&self, query: &FacilityQuery) -> Result<Vec<Facility>> {
        Ok(self
            .store
            .list_facilities()
            .await?
            .into_iter()
            .filter(|facility| query.matches(facility))
            .collect())
    }
}
