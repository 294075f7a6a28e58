//! Read-side projections: the browse, history, moderation and impact views
//! are all computed from the store on demand. Nothing in here mutates.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::funding;
use crate::storage::Store;
use crate::types::{DonationTarget, ImpactStats, NeedStatus, Urgency};

/// One approved need inside the public school listing.
#[derive(Debug, Clone, Serialize)]
pub struct NeedSummary {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    pub total_needed: u32,
    pub units_funded: u32,
    pub cost_per_item_cents: i64,
    pub total_cost_cents: i64,
    pub percent_funded: u32,
}

/// A verified school and its approved needs.
#[derive(Debug, Clone, Serialize)]
pub struct SchoolNeeds {
    pub id: u64,
    pub name: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub needs: Vec<NeedSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub target_cents: i64,
    pub current_cents: i64,
    pub participants: u32,
    pub percent_funded: u32,
    pub end_date: chrono::NaiveDate,
}

/// One row of a donor's history, newest first. The target is denormalized
/// into display names so the caller does not need follow-up lookups.
#[derive(Debug, Clone, Serialize)]
pub struct DonationHistoryEntry {
    pub id: u64,
    pub target: DonationTarget,
    pub amount_cents: i64,
    pub units_granted: u32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_name: Option<String>,
}

/// A need awaiting moderation, with enough context to review it.
#[derive(Debug, Clone, Serialize)]
pub struct PendingNeed {
    pub id: u64,
    pub school_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    pub total_needed: u32,
    pub cost_per_item_cents: i64,
    pub total_cost_cents: i64,
    pub submitted_at: DateTime<Utc>,
}

/// A school row in the admin directory, every school regardless of
/// verification state.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSchool {
    pub id: u64,
    pub name: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub verified: bool,
    pub needs_count: u64,
}

/// Verified schools with their approved needs. Schools without at least one
/// approved need are omitted, so the browse view never shows an empty card.
pub(crate) fn schools_with_needs(store: &Store) -> Vec<SchoolNeeds> {
    let mut result = Vec::new();
    for school in store.schools.values().filter(|s| s.verified) {
        let mut needs = Vec::new();
        for config in store
            .need_configs
            .values()
            .filter(|c| c.school_id == school.id)
        {
            let Some(state) = store.need_states.get(&config.id) else {
                continue;
            };
            if state.status != NeedStatus::Approved {
                continue;
            }
            needs.push(NeedSummary {
                id: config.id,
                title: config.title.clone(),
                description: config.description.clone(),
                category: config.category.clone(),
                urgency: config.urgency,
                total_needed: config.total_needed,
                units_funded: state.units_funded,
                cost_per_item_cents: config.cost_per_item_cents,
                total_cost_cents: config.total_cost_cents(),
                percent_funded: funding::need_percent(state.units_funded, config.total_needed),
            });
        }
        if !needs.is_empty() {
            result.push(SchoolNeeds {
                id: school.id,
                name: school.name.clone(),
                location: school.location.clone(),
                city: school.city.clone(),
                state: school.state.clone(),
                needs,
            });
        }
    }
    result
}

pub(crate) fn pool_summaries(store: &Store) -> Vec<PoolSummary> {
    store
        .pool_configs
        .values()
        .filter_map(|config| {
            let state = store.pool_states.get(&config.id)?;
            Some(PoolSummary {
                id: config.id,
                name: config.name.clone(),
                description: config.description.clone(),
                target_cents: config.target_cents,
                current_cents: state.current_cents,
                participants: state.participants,
                percent_funded: funding::pool_percent(state.current_cents, config.target_cents),
                end_date: config.end_date,
            })
        })
        .collect()
}

/// A donor's full history, newest first.
pub(crate) fn donor_history(store: &Store, donor_id: u64) -> Result<Vec<DonationHistoryEntry>> {
    store.user(donor_id)?;
    let mut result = Vec::new();
    for donation in store
        .donations
        .iter()
        .rev()
        .filter(|d| d.donor_id == donor_id)
    {
        let mut entry = DonationHistoryEntry {
            id: donation.id,
            target: donation.target,
            amount_cents: donation.amount_cents,
            units_granted: donation.units_granted,
            message: donation.message.clone(),
            created_at: donation.created_at,
            need_title: None,
            school_name: None,
            pool_name: None,
        };
        match donation.target {
            DonationTarget::Need(need_id) => {
                if let Some(config) = store.need_configs.get(&need_id) {
                    entry.need_title = Some(config.title.clone());
                    if let Some(school) = store.schools.get(&config.school_id) {
                        entry.school_name = Some(school.name.clone());
                    }
                }
            }
            DonationTarget::Pool(pool_id) => {
                if let Some(config) = store.pool_configs.get(&pool_id) {
                    entry.pool_name = Some(config.name.clone());
                }
            }
        }
        result.push(entry);
    }
    Ok(result)
}

/// Needs still awaiting a moderation decision, oldest first.
pub(crate) fn pending_needs(store: &Store) -> Vec<PendingNeed> {
    store
        .need_configs
        .values()
        .filter_map(|config| {
            let state = store.need_states.get(&config.id)?;
            if state.status != NeedStatus::Pending {
                return None;
            }
            let school_name = store
                .schools
                .get(&config.school_id)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            Some(PendingNeed {
                id: config.id,
                school_name,
                title: config.title.clone(),
                description: config.description.clone(),
                category: config.category.clone(),
                urgency: config.urgency,
                total_needed: config.total_needed,
                cost_per_item_cents: config.cost_per_item_cents,
                total_cost_cents: config.total_cost_cents(),
                submitted_at: config.created_at,
            })
        })
        .collect()
}

/// Every school with its total submission count, for the admin directory.
pub(crate) fn admin_schools(store: &Store) -> Vec<AdminSchool> {
    store
        .schools
        .values()
        .map(|school| AdminSchool {
            id: school.id,
            name: school.name.clone(),
            location: school.location.clone(),
            city: school.city.clone(),
            state: school.state.clone(),
            verified: school.verified,
            needs_count: store
                .need_configs
                .values()
                .filter(|c| c.school_id == school.id)
                .count() as u64,
        })
        .collect()
}

/// Platform-wide impact totals.
///
/// Supported needs/schools are counted from the ledger itself: an approved
/// need counts once it has received at least one donation, and a school
/// counts once any of its approved needs has. `students_impacted` is the
/// rough headcount estimate, total funding divided by the configured
/// per-student dollar figure.
pub(crate) fn impact(store: &Store, dollars_per_student: i64) -> ImpactStats {
    // Per-donor and per-pool totals are overflow-checked at commit, but the
    // platform-wide sum across donors is not bounded by them; saturate the
    // display figure rather than panic.
    let total_funding_cents = store
        .donations
        .iter()
        .fold(0i64, |acc, d| acc.saturating_add(d.amount_cents));

    let mut funded_needs = BTreeSet::new();
    for donation in &store.donations {
        if let DonationTarget::Need(need_id) = donation.target {
            funded_needs.insert(need_id);
        }
    }
    funded_needs.retain(|id| {
        store
            .need_states
            .get(id)
            .is_some_and(|s| s.status == NeedStatus::Approved)
    });
    let supported_schools: BTreeSet<u64> = funded_needs
        .iter()
        .filter_map(|id| store.need_configs.get(id).map(|c| c.school_id))
        .collect();

    let cents_per_student = dollars_per_student * 100;
    let students_impacted = if cents_per_student > 0 {
        (total_funding_cents / cents_per_student) as u64
    } else {
        0
    };
    ImpactStats {
        total_donations: store.donations.len() as u64,
        schools_supported: supported_schools.len() as u64,
        needs_supported: funded_needs.len() as u64,
        total_funding_cents,
        students_impacted,
    }
}
