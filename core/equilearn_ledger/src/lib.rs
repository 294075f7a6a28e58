//! # EquiLearn Donation Ledger
//!
//! This is the authoritative domain engine of the **EquiLearn** school
//! donation marketplace. It exposes the single [`Ledger`] type whose entry
//! points cover the full marketplace lifecycle:
//!
//! | Phase        | Entry point(s)                                           |
//! |--------------|----------------------------------------------------------|
//! | Registration | [`Ledger::register_user`], [`Ledger::register_school`], [`Ledger::create_pool`] |
//! | Moderation   | [`Ledger::submit_need`], [`Ledger::approve_need`], [`Ledger::reject_need`], [`Ledger::verify_school`] |
//! | Funding      | [`Ledger::submit_donation`], [`Ledger::join_pool`]       |
//! | Queries      | `get_*`, `list_*`, [`Ledger::impact_stats`]              |
//!
//! ## Architecture
//!
//! Funding arithmetic is fully delegated to [`funding`]. State access is
//! fully delegated to [`storage`], whose `apply` is the single mutation
//! point shared by live commits and journal replay. Read-side projections
//! live in [`stats`]. This file contains **only** the public entry points,
//! validation, and the donation commit loop.
//!
//! ## Commit model
//!
//! Every successful mutation produces exactly one [`LedgerEvent`], returned
//! to the caller for journaling. Applying a ledger's own event stream, in
//! order, to [`Ledger::replay`] reproduces identical state.
//!
//! Donations are the only racy path. They run as read-snapshot → plan →
//! write-lock commit with a version re-check, retried internally up to a
//! small bound before surfacing [`Error::ConcurrencyConflict`]. Two
//! donations racing on a need's last unit always resolve to one success and
//! one [`Error::FullyFunded`], never an overfunded need.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

mod error;
mod events;
mod funding;
mod stats;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_concurrency;
#[cfg(test)]
mod test_events;

use storage::Store;

pub use error::{Error, ErrorClass, Result};
pub use events::{EventBody, EventKind, LedgerEvent};
pub use stats::{
    AdminSchool, DonationHistoryEntry, NeedSummary, PendingNeed, PoolSummary, SchoolNeeds,
};
pub use types::{
    Donation, DonationReceipt, DonationTarget, ImpactStats, Need, NeedConfig, NeedState,
    NeedStatus, NeedSubmission, Pool, PoolConfig, PoolState, PoolSubmission, Role, School,
    SchoolRegistration, Urgency, User, UserRegistration,
};

/// Internal retry bound for the optimistic donation commit.
const MAX_COMMIT_RETRIES: usize = 8;

/// Divisor for the students-impacted estimate when none is configured.
pub const DEFAULT_DOLLARS_PER_STUDENT: i64 = 100;

/// The donation ledger engine.
///
/// All state sits behind one `RwLock`; queries share the read side, commits
/// take the write side briefly. The engine itself is purely in-memory — the
/// caller journals the returned events and rebuilds via [`Ledger::replay`].
#[derive(Debug)]
pub struct Ledger {
    store: RwLock<Store>,
    dollars_per_student: i64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// An empty ledger with the default students-impacted divisor.
    pub fn new() -> Self {
        Self::with_dollars_per_student(DEFAULT_DOLLARS_PER_STUDENT)
    }

    pub fn with_dollars_per_student(dollars_per_student: i64) -> Self {
        Ledger {
            store: RwLock::new(Store::new()),
            dollars_per_student,
        }
    }

    /// Rebuild a ledger from a journaled event stream.
    ///
    /// Events must arrive in sequence order, gap-free from 1; anything else
    /// means the journal is corrupt and the replay aborts with
    /// [`Error::ReplayOutOfOrder`].
    pub fn replay(
        events: impl IntoIterator<Item = LedgerEvent>,
        dollars_per_student: i64,
    ) -> Result<Self> {
        let mut store = Store::new();
        let mut expected = 1;
        for event in events {
            if event.seq != expected {
                return Err(Error::ReplayOutOfOrder {
                    expected,
                    found: event.seq,
                });
            }
            store.apply(&event)?;
            expected += 1;
        }
        Ok(Ledger {
            store: RwLock::new(store),
            dollars_per_student,
        })
    }

    // ─────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────

    /// Register a user (donor or admin).
    ///
    /// Email is normalised (trimmed, lowercased) and must be unique.
    /// Credentials never reach this service; identity is asserted upstream.
    pub fn register_user(&self, reg: UserRegistration) -> Result<(User, LedgerEvent)> {
        let name = require_non_empty("name", &reg.name)?;
        let email = require_non_empty("email", &reg.email)?.to_lowercase();

        let mut store = self.write();
        if store.emails.contains_key(&email) {
            return Err(Error::DuplicateEmail { email });
        }
        let id = store.next_user_id;
        let event = stamp(
            &store,
            EventBody::UserRegistered {
                id,
                name,
                email,
                role: reg.role,
            },
        );
        store.apply(&event)?;
        Ok((store.user(id)?.clone(), event))
    }

    /// Register a school. Schools enter unverified and stay out of public
    /// listings until an admin verifies them.
    pub fn register_school(&self, reg: SchoolRegistration) -> Result<(School, LedgerEvent)> {
        let name = require_non_empty("name", &reg.name)?;
        let location = require_non_empty("location", &reg.location)?;
        let city = require_non_empty("city", &reg.city)?;
        let state = require_non_empty("state", &reg.state)?;
        let description = reg
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or_default();

        let mut store = self.write();
        let id = store.next_school_id;
        let event = stamp(
            &store,
            EventBody::SchoolRegistered {
                id,
                name,
                location,
                city,
                state,
                description,
            },
        );
        store.apply(&event)?;
        Ok((store.school(id)?.clone(), event))
    }

    /// Create a shared-goal donation pool.
    pub fn create_pool(&self, sub: PoolSubmission) -> Result<(Pool, LedgerEvent)> {
        let name = require_non_empty("name", &sub.name)?;
        if sub.target_cents <= 0 {
            return Err(Error::InvalidTarget {
                target_cents: sub.target_cents,
            });
        }

        let mut store = self.write();
        let id = store.next_pool_id;
        let event = stamp(
            &store,
            EventBody::PoolCreated {
                id,
                name,
                description: sub.description.trim().to_string(),
                target_cents: sub.target_cents,
                end_date: sub.end_date,
            },
        );
        store.apply(&event)?;
        Ok((store.pool(id)?, event))
    }

    // ─────────────────────────────────────────────────────────
    // Moderation
    // ─────────────────────────────────────────────────────────

    /// Submit a need into the moderation queue. It becomes visible and
    /// fundable only after [`Ledger::approve_need`].
    pub fn submit_need(&self, sub: NeedSubmission) -> Result<(Need, LedgerEvent)> {
        let title = require_non_empty("title", &sub.title)?;
        let description = require_non_empty("description", &sub.description)?;
        let category = require_non_empty("category", &sub.category)?;
        if sub.total_needed == 0 {
            return Err(Error::InvalidUnits);
        }
        if sub.cost_per_item_cents <= 0 {
            return Err(Error::InvalidCost {
                cost_per_item_cents: sub.cost_per_item_cents,
            });
        }

        let mut store = self.write();
        store.school(sub.school_id)?;
        let id = store.next_need_id;
        let event = stamp(
            &store,
            EventBody::NeedSubmitted {
                id,
                school_id: sub.school_id,
                title,
                description,
                category,
                urgency: sub.urgency,
                total_needed: sub.total_needed,
                cost_per_item_cents: sub.cost_per_item_cents,
            },
        );
        store.apply(&event)?;
        Ok((store.need(id)?, event))
    }

    /// Approve a pending need, making it fundable. Valid only from
    /// `Pending`; approval is terminal.
    pub fn approve_need(&self, need_id: u64) -> Result<LedgerEvent> {
        self.moderate(need_id, EventBody::NeedApproved { need_id })
    }

    /// Reject a pending need, permanently removing it from consideration.
    pub fn reject_need(&self, need_id: u64) -> Result<LedgerEvent> {
        self.moderate(need_id, EventBody::NeedRejected { need_id })
    }

    fn moderate(&self, need_id: u64, body: EventBody) -> Result<LedgerEvent> {
        let mut store = self.write();
        let state = store.need_state(need_id)?;
        if state.status != NeedStatus::Pending {
            return Err(Error::NotPending(need_id));
        }
        let event = stamp(&store, body);
        store.apply(&event)?;
        Ok(event)
    }

    /// Mark a school as verified. Idempotent: verifying an already verified
    /// school changes nothing and emits no event.
    pub fn verify_school(&self, school_id: u64) -> Result<Option<LedgerEvent>> {
        let mut store = self.write();
        if store.school(school_id)?.verified {
            return Ok(None);
        }
        let event = stamp(&store, EventBody::SchoolVerified { school_id });
        store.apply(&event)?;
        Ok(Some(event))
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Record a donation against a need or a pool.
    ///
    /// Need targets must be approved and not fully funded; the donation is
    /// then accepted in full and grants
    /// `min(floor(amount / cost_per_item), remaining)` whole units. Any
    /// remainder stays on the recorded amount without granting units. Pool
    /// targets accept any positive amount and grant no units. An amount
    /// that would push the donor's or the pool's running total past
    /// `i64::MAX` cents is rejected before anything is recorded.
    ///
    /// The ledger entry, the target's counters, the donor's cached total and
    /// the event are committed in one critical section; on failure nothing
    /// is recorded.
    pub fn submit_donation(
        &self,
        donor_id: u64,
        target: DonationTarget,
        amount_cents: i64,
        message: Option<String>,
    ) -> Result<(DonationReceipt, LedgerEvent)> {
        if amount_cents <= 0 {
            return Err(Error::InvalidAmount { amount_cents });
        }
        let message = message.and_then(|m| {
            let trimmed = m.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        for _ in 0..MAX_COMMIT_RETRIES {
            // Read phase: validate against a snapshot and plan the grant.
            let (units_planned, observed_version) = {
                let store = self.read();
                store
                    .user(donor_id)?
                    .total_donated_cents
                    .checked_add(amount_cents)
                    .ok_or(Error::CounterOverflow)?;
                match target {
                    DonationTarget::Need(need_id) => {
                        let config = store.need_config(need_id)?;
                        let state = store.need_state(need_id)?;
                        if state.status != NeedStatus::Approved {
                            return Err(Error::NotApproved(need_id));
                        }
                        let remaining =
                            funding::remaining_units(config.total_needed, state.units_funded);
                        if remaining == 0 {
                            return Err(Error::FullyFunded(need_id));
                        }
                        let units = funding::units_granted(
                            amount_cents,
                            config.cost_per_item_cents,
                            remaining,
                        );
                        (units, state.version)
                    }
                    DonationTarget::Pool(pool_id) => {
                        store.pool_config(pool_id)?;
                        let state = store.pool_state(pool_id)?;
                        state
                            .current_cents
                            .checked_add(amount_cents)
                            .ok_or(Error::CounterOverflow)?;
                        (0, state.version)
                    }
                }
            };

            // Commit phase: the version check proves the snapshot still
            // holds. A bump between the phases means another commit landed;
            // replan from fresh state.
            let mut store = self.write();
            let current_version = match target {
                DonationTarget::Need(id) => store.need_state(id)?.version,
                DonationTarget::Pool(id) => store.pool_state(id)?.version,
            };
            if current_version != observed_version {
                continue;
            }

            let id = store.next_donation_id;
            let event = stamp(
                &store,
                EventBody::DonationRecorded {
                    id,
                    donor_id,
                    target,
                    amount_cents,
                    units_granted: units_planned,
                    message: message.clone(),
                },
            );
            store.apply(&event)?;

            let percent_funded = match target {
                DonationTarget::Need(need_id) => {
                    let config = store.need_config(need_id)?;
                    let state = store.need_state(need_id)?;
                    funding::need_percent(state.units_funded, config.total_needed)
                }
                DonationTarget::Pool(pool_id) => {
                    let config = store.pool_config(pool_id)?;
                    let state = store.pool_state(pool_id)?;
                    funding::pool_percent(state.current_cents, config.target_cents)
                }
            };
            let receipt = DonationReceipt {
                donation_id: id,
                donor_id,
                target,
                amount_cents,
                units_granted: units_planned,
                percent_funded,
                created_at: event.at,
            };
            return Ok((receipt, event));
        }
        Err(Error::ConcurrencyConflict)
    }

    /// Contribute to a shared-goal pool: [`Ledger::submit_donation`] with a
    /// pool target. Every successful join counts as a new participant.
    pub fn join_pool(
        &self,
        pool_id: u64,
        donor_id: u64,
        amount_cents: i64,
        message: Option<String>,
    ) -> Result<(DonationReceipt, LedgerEvent)> {
        self.submit_donation(donor_id, DonationTarget::Pool(pool_id), amount_cents, message)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_school(&self, id: u64) -> Result<School> {
        Ok(self.read().school(id)?.clone())
    }

    pub fn get_need(&self, id: u64) -> Result<Need> {
        self.read().need(id)
    }

    pub fn get_pool(&self, id: u64) -> Result<Pool> {
        self.read().pool(id)
    }

    pub fn get_user(&self, id: u64) -> Result<User> {
        Ok(self.read().user(id)?.clone())
    }

    /// Verified schools with their approved needs; the public browse view.
    pub fn list_approved_schools_with_needs(&self) -> Vec<SchoolNeeds> {
        stats::schools_with_needs(&self.read())
    }

    pub fn list_pools(&self) -> Vec<PoolSummary> {
        stats::pool_summaries(&self.read())
    }

    /// A donor's donation history, newest first.
    pub fn list_donations_for_donor(&self, donor_id: u64) -> Result<Vec<DonationHistoryEntry>> {
        stats::donor_history(&self.read(), donor_id)
    }

    /// Needs awaiting moderation, oldest first.
    pub fn list_pending_needs(&self) -> Vec<PendingNeed> {
        stats::pending_needs(&self.read())
    }

    /// Every school with its verified flag and submission count.
    pub fn list_admin_schools(&self) -> Vec<AdminSchool> {
        stats::admin_schools(&self.read())
    }

    /// Aggregate impact statistics, recomputed from the ledger on demand.
    pub fn impact_stats(&self) -> ImpactStats {
        stats::impact(&self.read(), self.dollars_per_student)
    }

    /// Every ledger entry, oldest first.
    pub fn donations(&self) -> Vec<Donation> {
        self.read().donations.clone()
    }

    /// Every committed event, in sequence order.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.read().events.clone()
    }

    /// Committed events with a sequence number greater than `after`, in
    /// order. The stream is gap-free from 1, so the event with seq `n` sits
    /// at index `n - 1`.
    pub fn events_after(&self, after: u64) -> Vec<LedgerEvent> {
        let store = self.read();
        match usize::try_from(after) {
            Ok(from) => store.events.get(from..).unwrap_or_default().to_vec(),
            Err(_) => Vec::new(),
        }
    }

    /// True when nothing has ever been committed.
    pub fn is_empty(&self) -> bool {
        self.read().events.is_empty()
    }

    // Poisoning only records that some caller panicked while holding the
    // guard. `Store::apply` validates every step before its first write, so
    // the store a poisoned lock protects is still consistent; recover the
    // guard instead of propagating the panic to every later caller.
    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the next event for a store, stamping the sequence number and the
/// commit timestamp. Must be applied before the write lock is released.
fn stamp(store: &Store, body: EventBody) -> LedgerEvent {
    LedgerEvent {
        seq: store.next_seq,
        at: Utc::now(),
        body,
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyField { field });
    }
    Ok(trimmed.to_string())
}
