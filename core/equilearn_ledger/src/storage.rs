//! # Storage
//!
//! The in-memory store behind the ledger engine: typed maps for every
//! entity family, the append-only donation vector, the event log, and the
//! id counters.
//!
//! ## Single mutation point
//!
//! All state changes — live commits and journal replay alike — go through
//! [`Store::apply`]. The entry points in `lib.rs` validate a request, build
//! one event, and apply it; replay applies the journaled events in order.
//! Because there is no second write path, replaying an engine's own event
//! log always reproduces its exact state, versions and counters included.
//!
//! ## Why split Config and State?
//!
//! Donations are the high-frequency write. Keeping the mutable part of a
//! need (`NeedState`, three words) separate from its immutable submission
//! record means the commit path touches only counters, and the fixed fields
//! (cost per item, total units, derived total cost) cannot drift once the
//! need exists. The public [`Need`] / [`Pool`] views are reconstructed on
//! read.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::events::{EventBody, LedgerEvent};
use crate::types::{
    Donation, Need, NeedConfig, NeedState, NeedStatus, Pool, PoolConfig, PoolState, School, User,
};

#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) schools: BTreeMap<u64, School>,
    pub(crate) need_configs: BTreeMap<u64, NeedConfig>,
    pub(crate) need_states: BTreeMap<u64, NeedState>,
    pub(crate) pool_configs: BTreeMap<u64, PoolConfig>,
    pub(crate) pool_states: BTreeMap<u64, PoolState>,
    pub(crate) users: BTreeMap<u64, User>,
    /// Normalized email → user id, for duplicate registration checks.
    pub(crate) emails: HashMap<String, u64>,
    /// The append-only ledger. Entries are never mutated or removed.
    pub(crate) donations: Vec<Donation>,
    /// Every applied event, in sequence order.
    pub(crate) events: Vec<LedgerEvent>,
    pub(crate) next_school_id: u64,
    pub(crate) next_need_id: u64,
    pub(crate) next_pool_id: u64,
    pub(crate) next_user_id: u64,
    pub(crate) next_donation_id: u64,
    pub(crate) next_seq: u64,
}

impl Store {
    pub(crate) fn new() -> Self {
        Store {
            next_school_id: 1,
            next_need_id: 1,
            next_pool_id: 1,
            next_user_id: 1,
            next_donation_id: 1,
            next_seq: 1,
            ..Store::default()
        }
    }

    // ── Typed lookups ────────────────────────────────────────────────────

    pub(crate) fn school(&self, id: u64) -> Result<&School> {
        self.schools.get(&id).ok_or(Error::UnknownSchool(id))
    }

    pub(crate) fn need_config(&self, id: u64) -> Result<&NeedConfig> {
        self.need_configs.get(&id).ok_or(Error::UnknownNeed(id))
    }

    pub(crate) fn need_state(&self, id: u64) -> Result<&NeedState> {
        self.need_states.get(&id).ok_or(Error::UnknownNeed(id))
    }

    pub(crate) fn pool_config(&self, id: u64) -> Result<&PoolConfig> {
        self.pool_configs.get(&id).ok_or(Error::UnknownPool(id))
    }

    pub(crate) fn pool_state(&self, id: u64) -> Result<&PoolState> {
        self.pool_states.get(&id).ok_or(Error::UnknownPool(id))
    }

    pub(crate) fn user(&self, id: u64) -> Result<&User> {
        self.users.get(&id).ok_or(Error::UnknownUser(id))
    }

    /// Reconstruct the full `Need` view from its config and state records.
    pub(crate) fn need(&self, id: u64) -> Result<Need> {
        let config = self.need_config(id)?;
        let state = self.need_state(id)?;
        Ok(Need {
            id: config.id,
            school_id: config.school_id,
            title: config.title.clone(),
            description: config.description.clone(),
            category: config.category.clone(),
            urgency: config.urgency,
            total_needed: config.total_needed,
            units_funded: state.units_funded,
            cost_per_item_cents: config.cost_per_item_cents,
            status: state.status,
            created_at: config.created_at,
        })
    }

    /// Reconstruct the full `Pool` view from its config and state records.
    pub(crate) fn pool(&self, id: u64) -> Result<Pool> {
        let config = self.pool_config(id)?;
        let state = self.pool_state(id)?;
        Ok(Pool {
            id: config.id,
            name: config.name.clone(),
            description: config.description.clone(),
            target_cents: config.target_cents,
            current_cents: state.current_cents,
            participants: state.participants,
            end_date: config.end_date,
        })
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Apply one event to the store.
    ///
    /// The entry points validate before building an event, so on the live
    /// path every lookup here succeeds. On replay a failed lookup means the
    /// journal references an entity it never created — the error aborts the
    /// replay rather than guessing. Running totals use checked arithmetic,
    /// validated before the first write of the arm, so an overflowing event
    /// is rejected with the store untouched.
    pub(crate) fn apply(&mut self, event: &LedgerEvent) -> Result<()> {
        match &event.body {
            EventBody::UserRegistered {
                id,
                name,
                email,
                role,
            } => {
                self.users.insert(
                    *id,
                    User {
                        id: *id,
                        name: name.clone(),
                        email: email.clone(),
                        role: *role,
                        total_donated_cents: 0,
                        created_at: event.at,
                    },
                );
                self.emails.insert(email.clone(), *id);
                self.next_user_id = self.next_user_id.max(id + 1);
            }
            EventBody::SchoolRegistered {
                id,
                name,
                location,
                city,
                state,
                description,
            } => {
                self.schools.insert(
                    *id,
                    School {
                        id: *id,
                        name: name.clone(),
                        location: location.clone(),
                        city: city.clone(),
                        state: state.clone(),
                        description: description.clone(),
                        verified: false,
                        created_at: event.at,
                    },
                );
                self.next_school_id = self.next_school_id.max(id + 1);
            }
            EventBody::SchoolVerified { school_id } => {
                let school = self
                    .schools
                    .get_mut(school_id)
                    .ok_or(Error::UnknownSchool(*school_id))?;
                school.verified = true;
            }
            EventBody::NeedSubmitted {
                id,
                school_id,
                title,
                description,
                category,
                urgency,
                total_needed,
                cost_per_item_cents,
            } => {
                self.need_configs.insert(
                    *id,
                    NeedConfig {
                        id: *id,
                        school_id: *school_id,
                        title: title.clone(),
                        description: description.clone(),
                        category: category.clone(),
                        urgency: *urgency,
                        total_needed: *total_needed,
                        cost_per_item_cents: *cost_per_item_cents,
                        created_at: event.at,
                    },
                );
                self.need_states.insert(
                    *id,
                    NeedState {
                        units_funded: 0,
                        status: NeedStatus::Pending,
                        version: 0,
                    },
                );
                self.next_need_id = self.next_need_id.max(id + 1);
            }
            EventBody::NeedApproved { need_id } => {
                let state = self
                    .need_states
                    .get_mut(need_id)
                    .ok_or(Error::UnknownNeed(*need_id))?;
                state.status = NeedStatus::Approved;
                state.version += 1;
            }
            EventBody::NeedRejected { need_id } => {
                let state = self
                    .need_states
                    .get_mut(need_id)
                    .ok_or(Error::UnknownNeed(*need_id))?;
                state.status = NeedStatus::Rejected;
                state.version += 1;
            }
            EventBody::PoolCreated {
                id,
                name,
                description,
                target_cents,
                end_date,
            } => {
                self.pool_configs.insert(
                    *id,
                    PoolConfig {
                        id: *id,
                        name: name.clone(),
                        description: description.clone(),
                        target_cents: *target_cents,
                        end_date: *end_date,
                    },
                );
                self.pool_states.insert(
                    *id,
                    PoolState {
                        current_cents: 0,
                        participants: 0,
                        version: 0,
                    },
                );
                self.next_pool_id = self.next_pool_id.max(id + 1);
            }
            EventBody::DonationRecorded {
                id,
                donor_id,
                target,
                amount_cents,
                units_granted,
                message,
            } => {
                // Every checked addition happens before the first write, so
                // a failing arm leaves the store untouched.
                let donor_total = self
                    .user(*donor_id)?
                    .total_donated_cents
                    .checked_add(*amount_cents)
                    .ok_or(Error::CounterOverflow)?;
                match *target {
                    crate::types::DonationTarget::Need(need_id) => {
                        let state = self
                            .need_states
                            .get_mut(&need_id)
                            .ok_or(Error::UnknownNeed(need_id))?;
                        let units_funded = state
                            .units_funded
                            .checked_add(*units_granted)
                            .ok_or(Error::CounterOverflow)?;
                        state.units_funded = units_funded;
                        state.version += 1;
                    }
                    crate::types::DonationTarget::Pool(pool_id) => {
                        let state = self
                            .pool_states
                            .get_mut(&pool_id)
                            .ok_or(Error::UnknownPool(pool_id))?;
                        let current_cents = state
                            .current_cents
                            .checked_add(*amount_cents)
                            .ok_or(Error::CounterOverflow)?;
                        let participants = state
                            .participants
                            .checked_add(1)
                            .ok_or(Error::CounterOverflow)?;
                        state.current_cents = current_cents;
                        state.participants = participants;
                        state.version += 1;
                    }
                }
                let donor = self
                    .users
                    .get_mut(donor_id)
                    .ok_or(Error::UnknownUser(*donor_id))?;
                donor.total_donated_cents = donor_total;
                self.donations.push(Donation {
                    id: *id,
                    donor_id: *donor_id,
                    target: *target,
                    amount_cents: *amount_cents,
                    units_granted: *units_granted,
                    message: message.clone(),
                    created_at: event.at,
                });
                self.next_donation_id = self.next_donation_id.max(id + 1);
            }
        }
        self.next_seq = self.next_seq.max(event.seq + 1);
        self.events.push(event.clone());
        Ok(())
    }
}
