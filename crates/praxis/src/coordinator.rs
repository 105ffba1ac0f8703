//! The booking coordinator: the platform's use-case layer.
//!
//! Every operation that spans the slot registry, the record vault, the
//! audit log, the access ledger, and notifications goes through here. The
//! coordinator owns the ordering rules: book the slot before touching the
//! record, write the record before auditing, audit before notifying, and
//! never let a failed notification undo clinical bookkeeping.

use std::sync::Arc;

use praxis_booking::{FacilityQuery, SlotQuery, SlotRegistry};
use praxis_core::{
    AccessRecord, AuditAction, AuditEvent, Facility, FacilityId, Identity, Occupant,
    PatientProfile, PatientRecord, Role, Slot, SlotId, SlotPatch, SubjectId, TreatmentNote,
};
use praxis_store::{KeyedLocks, Store};
use praxis_vault::{ConsentGate, RecordVault};
use tracing::warn;

use crate::access::AccessLedger;
use crate::audit::AuditLog;
use crate::error::{PlatformError, Result};
use crate::notify::{Notification, Notifier};

/// The result of a successful booking.
#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    /// The slot as booked, including the occupant.
    pub slot: Slot,
    /// The facility the appointment takes place at.
    pub facility: Facility,
}

/// Orchestrates bookings, records, consent, audit, and notifications.
pub struct BookingCoordinator<S, N> {
    store: Arc<S>,
    registry: SlotRegistry<S>,
    vault: RecordVault<S>,
    audit: AuditLog<S>,
    ledger: AccessLedger<S>,
    notifier: N,
    /// Serializes record read-modify-write cycles per subject.
    subject_locks: KeyedLocks,
}

impl<S: Store, N: Notifier> BookingCoordinator<S, N> {
    /// Create a coordinator over a store and a notification channel.
    pub fn new(store: Arc<S>, notifier: N) -> Self {
        Self {
            registry: SlotRegistry::new(store.clone()),
            vault: RecordVault::new(store.clone()),
            audit: AuditLog::new(store.clone()),
            ledger: AccessLedger::new(store.clone()),
            store,
            notifier,
            subject_locks: KeyedLocks::new(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Booking
    // ─────────────────────────────────────────────────────────────────────────

    /// Book an open slot for the calling patient.
    ///
    /// Creates the patient record lazily on first booking and grants the
    /// facility read consent: booking implies consent.
    pub async fn book(&self, identity: &Identity, slot_id: &SlotId) -> Result<BookingConfirmation> {
        let profile = require_patient(identity)?;
        let subject_id = profile.id.clone();

        // The registry decides the race: at most one caller gets the slot.
        let slot = self
            .registry
            .book(slot_id, Occupant::from_profile(profile.clone()))
            .await?;
        let facility = self.facility(&slot.facility_id).await?;

        {
            let _guard = self.subject_locks.acquire(subject_id.as_str()).await;
            let mut record = self
                .vault
                .load(&subject_id)
                .await?
                .unwrap_or_else(|| PatientRecord::new(profile.clone()));
            record.upsert_appointment(slot.to_appointment());
            record.grant_consent(slot.facility_id.clone());
            self.vault.store(&record).await?;
        }

        self.audit
            .append(
                identity.id.clone(),
                AuditAction::BookAppointment,
                Some(subject_id),
            )
            .await?;

        self.notify_best_effort(
            &profile.email,
            "Terminbestätigung",
            format!("Ihr Termin bei {} ist bestätigt.", facility.name),
        )
        .await;

        Ok(BookingConfirmation { slot, facility })
    }

    /// Cancel the calling patient's own booking, reopening the slot.
    pub async fn cancel_booking(&self, identity: &Identity, slot_id: &SlotId) -> Result<Slot> {
        let slot = self.registry.get(slot_id).await?;
        let occupant = slot
            .occupant
            .ok_or_else(|| PlatformError::Conflict(format!("slot {slot_id} is not booked")))?;
        if !identity.id.is_subject(&occupant.subject_id) {
            return Err(PlatformError::AccessDenied(format!(
                "actor {} does not hold the booking on slot {slot_id}",
                identity.id
            )));
        }

        let (slot, _evicted) = self.registry.release(slot_id).await?;
        let subject_id = occupant.subject_id.clone();

        {
            let _guard = self.subject_locks.acquire(subject_id.as_str()).await;
            if let Some(mut record) = self.vault.load(&subject_id).await? {
                record.remove_appointment(slot_id);
                self.vault.store(&record).await?;
            }
        }

        self.audit
            .append(
                identity.id.clone(),
                AuditAction::CancelAppointment,
                Some(subject_id),
            )
            .await?;

        let facility_name = self.facility_name(&slot.facility_id).await;
        self.notify_best_effort(
            &occupant.snapshot.email,
            "Terminabsage",
            format!("Ihr Termin bei {facility_name} wurde abgesagt."),
        )
        .await;

        Ok(slot)
    }

    /// Move the calling patient's booking to another open slot.
    ///
    /// The new slot is booked before the old one is released, so a
    /// conflict on the new slot leaves the existing booking untouched.
    pub async fn reschedule(
        &self,
        identity: &Identity,
        from_slot_id: &SlotId,
        to_slot_id: &SlotId,
    ) -> Result<BookingConfirmation> {
        let profile = require_patient(identity)?;
        let subject_id = profile.id.clone();

        let from_slot = self.registry.get(from_slot_id).await?;
        let holds_booking = from_slot
            .occupant
            .as_ref()
            .is_some_and(|o| identity.id.is_subject(&o.subject_id));
        if !holds_booking {
            return Err(PlatformError::AccessDenied(format!(
                "actor {} does not hold the booking on slot {from_slot_id}",
                identity.id
            )));
        }

        let new_slot = self
            .registry
            .book(to_slot_id, Occupant::from_profile(profile.clone()))
            .await?;
        let facility = self.facility(&new_slot.facility_id).await?;
        self.registry.release(from_slot_id).await?;

        {
            let _guard = self.subject_locks.acquire(subject_id.as_str()).await;
            let mut record = self
                .vault
                .load(&subject_id)
                .await?
                .unwrap_or_else(|| PatientRecord::new(profile.clone()));
            record.remove_appointment(from_slot_id);
            record.upsert_appointment(new_slot.to_appointment());
            record.grant_consent(new_slot.facility_id.clone());
            self.vault.store(&record).await?;
        }

        self.audit
            .append(
                identity.id.clone(),
                AuditAction::RescheduleAppointment,
                Some(subject_id),
            )
            .await?;

        self.notify_best_effort(
            &profile.email,
            "Terminänderung",
            format!("Ihr Termin bei {} wurde geändert.", facility.name),
        )
        .await;

        Ok(BookingConfirmation {
            slot: new_slot,
            facility,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Slot Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new open slot for a facility.
    pub async fn create_slot(&self, identity: &Identity, slot: Slot) -> Result<Slot> {
        require_slot_admin(identity, &slot.facility_id)?;

        let slot = self.registry.create(slot).await?;
        self.audit
            .append(identity.id.clone(), AuditAction::CreateSlot, None)
            .await?;
        Ok(slot)
    }

    /// Edit a slot's schedulable fields.
    ///
    /// When the schedule of a booked slot changes, the occupant's record
    /// is brought in line and the occupant is notified.
    pub async fn update_slot(
        &self,
        identity: &Identity,
        slot_id: &SlotId,
        patch: &SlotPatch,
    ) -> Result<Slot> {
        let current = self.registry.get(slot_id).await?;
        require_slot_admin(identity, &current.facility_id)?;

        let updated = self.registry.update(slot_id, patch).await?;
        let subject_id = updated.occupant.as_ref().map(|o| o.subject_id.clone());

        if patch.touches_schedule() {
            if let Some(occupant) = &updated.occupant {
                let facility_name = self.facility_name(&updated.facility_id).await;
                self.notify_best_effort(
                    &occupant.snapshot.email,
                    "Terminänderung",
                    format!("Ihr Termin bei {facility_name} wurde geändert."),
                )
                .await;

                let _guard = self
                    .subject_locks
                    .acquire(occupant.subject_id.as_str())
                    .await;
                if let Some(mut record) = self.vault.load(&occupant.subject_id).await? {
                    record.upsert_appointment(updated.to_appointment());
                    self.vault.store(&record).await?;
                }
            }
        }

        self.audit
            .append(identity.id.clone(), AuditAction::UpdateSlot, subject_id)
            .await?;
        Ok(updated)
    }

    /// Withdraw a slot, evicting and notifying any occupant.
    pub async fn cancel_slot(&self, identity: &Identity, slot_id: &SlotId) -> Result<Slot> {
        let current = self.registry.get(slot_id).await?;
        require_slot_admin(identity, &current.facility_id)?;

        let (slot, evicted) = self.registry.cancel(slot_id).await?;
        let subject_id = evicted.as_ref().map(|o| o.subject_id.clone());

        if let Some(occupant) = evicted {
            // Notify from the slot's snapshot, never from the vault: the
            // patient must hear about the cancellation even when their
            // record cannot currently be read.
            let facility_name = self.facility_name(&slot.facility_id).await;
            self.notify_best_effort(
                &occupant.snapshot.email,
                "Terminabsage",
                format!("Ihr Termin bei {facility_name} wurde abgesagt."),
            )
            .await;

            let _guard = self
                .subject_locks
                .acquire(occupant.subject_id.as_str())
                .await;
            if let Some(mut record) = self.vault.load(&occupant.subject_id).await? {
                record.remove_appointment(slot_id);
                self.vault.store(&record).await?;
            }
        }

        self.audit
            .append(identity.id.clone(), AuditAction::CancelSlot, subject_id)
            .await?;
        Ok(slot)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Records and Consent
    // ─────────────────────────────────────────────────────────────────────────

    /// Read a patient record through the consent gate.
    ///
    /// An absent record is `NotFound` and leaves no audit trace. A denied
    /// read is audited as such; a granted facility read additionally lands
    /// in the access ledger.
    pub async fn get_record(
        &self,
        identity: &Identity,
        subject_id: &SubjectId,
    ) -> Result<PatientRecord> {
        let record = self
            .vault
            .load(subject_id)
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("no record for {subject_id}")))?;

        if !ConsentGate::may_read(&record, identity) {
            self.audit
                .append(
                    identity.id.clone(),
                    AuditAction::ReadRecordDenied,
                    Some(subject_id.clone()),
                )
                .await?;
            return Err(PlatformError::AccessDenied(format!(
                "actor {} may not read the record of {subject_id}",
                identity.id
            )));
        }

        if identity.role.is_facility_staff() {
            if let Some(facility_id) = &identity.facility_id {
                self.ledger.record(subject_id, facility_id).await?;
            }
        }

        self.audit
            .append(
                identity.id.clone(),
                AuditAction::ReadRecord,
                Some(subject_id.clone()),
            )
            .await?;

        Ok(record)
    }

    /// Append a treatment note to a consented patient's record.
    pub async fn add_note(
        &self,
        identity: &Identity,
        subject_id: &SubjectId,
        summary: &str,
        next_steps: Option<String>,
    ) -> Result<TreatmentNote> {
        let facility_id = match identity.role {
            Role::Provider | Role::ClinicAdmin => {
                identity.facility_id.clone().ok_or_else(|| {
                    PlatformError::AccessDenied(format!(
                        "staff actor {} has no facility",
                        identity.id
                    ))
                })?
            }
            _ => {
                return Err(PlatformError::AccessDenied(format!(
                    "actor {} may not write treatment notes",
                    identity.id
                )))
            }
        };

        let note = {
            let _guard = self.subject_locks.acquire(subject_id.as_str()).await;
            let mut record = self
                .vault
                .load(subject_id)
                .await?
                .ok_or_else(|| PlatformError::NotFound(format!("no record for {subject_id}")))?;

            if !record.has_consent(&facility_id) {
                return Err(PlatformError::AccessDenied(format!(
                    "facility {facility_id} holds no consent for {subject_id}"
                )));
            }

            let note = record
                .push_note(identity.id.clone(), now_millis(), summary, next_steps)
                .clone();
            self.vault.store(&record).await?;
            note
        };

        self.audit
            .append(
                identity.id.clone(),
                AuditAction::AddTreatmentNote,
                Some(subject_id.clone()),
            )
            .await?;

        Ok(note)
    }

    /// Grant or revoke a facility's read consent on a record.
    ///
    /// Only the patient themself may change their consent. Granting
    /// creates the record lazily; revoking consent that was never held is
    /// a no-op. Returns whether the consent set changed. Every call lands
    /// in both the audit log and the access ledger, changed or not.
    pub async fn update_consent(
        &self,
        identity: &Identity,
        subject_id: &SubjectId,
        facility_id: &FacilityId,
        granted: bool,
    ) -> Result<bool> {
        if !(identity.role == Role::Patient && identity.id.is_subject(subject_id)) {
            return Err(PlatformError::AccessDenied(format!(
                "actor {} may not change consent for {subject_id}",
                identity.id
            )));
        }
        if granted && self.store.get_facility(facility_id).await?.is_none() {
            return Err(PlatformError::NotFound(format!(
                "facility not found: {facility_id}"
            )));
        }

        let changed = {
            let _guard = self.subject_locks.acquire(subject_id.as_str()).await;
            match self.vault.load(subject_id).await? {
                Some(mut record) => {
                    let changed = if granted {
                        record.grant_consent(facility_id.clone())
                    } else {
                        record.revoke_consent(facility_id)
                    };
                    if changed {
                        self.vault.store(&record).await?;
                    }
                    changed
                }
                None if granted => {
                    let profile = identity.profile.clone().ok_or_else(|| {
                        PlatformError::Invalid(format!(
                            "patient identity {} carries no profile",
                            identity.id
                        ))
                    })?;
                    let mut record = PatientRecord::new(profile);
                    record.grant_consent(facility_id.clone());
                    self.vault.store(&record).await?;
                    true
                }
                // Revoking consent never held, on a record that does not
                // exist, changes nothing.
                None => false,
            }
        };

        self.ledger.record(subject_id, facility_id).await?;
        self.audit
            .append(
                identity.id.clone(),
                AuditAction::UpdateConsent,
                Some(subject_id.clone()),
            )
            .await?;

        Ok(changed)
    }

    /// The access ledger for a subject. Patients see their own; platform
    /// admins see any.
    pub async fn access_history(
        &self,
        identity: &Identity,
        subject_id: &SubjectId,
    ) -> Result<Vec<AccessRecord>> {
        require_self_or_platform_admin(identity, subject_id)?;
        self.ledger.history(subject_id).await
    }

    /// The audit events for a subject. Same visibility as the access
    /// ledger.
    pub async fn audit_trail(
        &self,
        identity: &Identity,
        subject_id: &SubjectId,
    ) -> Result<Vec<AuditEvent>> {
        require_self_or_platform_admin(identity, subject_id)?;
        self.audit.events_for(subject_id).await
    }

    /// Verify the full audit chain. Returns the number of verified events.
    pub async fn verify_audit(&self) -> Result<usize> {
        self.audit.verify().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a slot by id.
    pub async fn slot(&self, slot_id: &SlotId) -> Result<Slot> {
        Ok(self.registry.get(slot_id).await?)
    }

    /// Search slots.
    pub async fn search_slots(&self, query: &SlotQuery) -> Result<Vec<Slot>> {
        Ok(self.registry.search(query).await?)
    }

    /// All slots of a facility regardless of status, ordered by start
    /// time. The facility-side inventory view.
    pub async fn list_slots(&self, facility_id: &FacilityId) -> Result<Vec<Slot>> {
        let query = SlotQuery::open()
            .facility(facility_id.clone())
            .with_booked()
            .with_cancelled();
        Ok(self.registry.search(&query).await?)
    }

    /// Search the facility directory.
    pub async fn search_facilities(&self, query: &FacilityQuery) -> Result<Vec<Facility>> {
        Ok(self.registry.search_facilities(query).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn facility(&self, facility_id: &FacilityId) -> Result<Facility> {
        self.store
            .get_facility(facility_id)
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("facility not found: {facility_id}")))
    }

    /// The facility's display name, falling back to the id. For
    /// notification text only; never used for authorization.
    async fn facility_name(&self, facility_id: &FacilityId) -> String {
        match self.store.get_facility(facility_id).await {
            Ok(Some(facility)) => facility.name,
            _ => facility_id.to_string(),
        }
    }

    async fn notify_best_effort(&self, to: &str, subject: &str, body: String) {
        let notification = Notification {
            to: to.to_string(),
            subject: subject.to_string(),
            body,
        };
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(error = %e, recipient = to, "notification delivery failed");
        }
    }
}

fn require_patient(identity: &Identity) -> Result<&PatientProfile> {
    if identity.role != Role::Patient {
        return Err(PlatformError::AccessDenied(format!(
            "actor {} is not a patient",
            identity.id
        )));
    }
    identity.profile.as_ref().ok_or_else(|| {
        PlatformError::Invalid(format!(
            "patient identity {} carries no profile",
            identity.id
        ))
    })
}

fn require_slot_admin(identity: &Identity, facility_id: &FacilityId) -> Result<()> {
    match identity.role {
        Role::PlatformAdmin => Ok(()),
        Role::Provider | Role::ClinicAdmin
            if identity.facility_id.as_ref() == Some(facility_id) =>
        {
            Ok(())
        }
        _ => Err(PlatformError::AccessDenied(format!(
            "actor {} may not administer slots of {facility_id}",
            identity.id
        ))),
    }
}

fn require_self_or_platform_admin(identity: &Identity, subject_id: &SubjectId) -> Result<()> {
    let allowed = match identity.role {
        Role::Patient => identity.id.is_subject(subject_id),
        Role::PlatformAdmin => true,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(PlatformError::AccessDenied(format!(
            "actor {} may not view the history of {subject_id}",
            identity.id
        )))
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
