//! # Types
//!
//! Shared data structures used across all modules of the donation ledger.
//!
//! ## Design decisions
//!
//! ### Money
//!
//! All amounts are integer cents (`i64`). Funding math (units granted,
//! percent funded) is exact integer arithmetic; fractional cents cannot
//! exist, so donor totals always reconcile against the ledger to the cent.
//!
//! ### Config / State split
//!
//! A `Need` is internally stored as two separate records:
//!
//! - [`NeedConfig`] — written once at submission; never mutated. Its derived
//!   total cost (`cost_per_item_cents × total_needed`) is therefore fixed
//!   for the need's lifetime.
//! - [`NeedState`] — the small mutable part (units funded, approval status,
//!   commit version), rewritten on every donation and moderation decision.
//!
//! Pools use the same split ([`PoolConfig`] / [`PoolState`]). The public API
//! exposes the reconstructed [`Need`] and [`Pool`] views for convenience.
//!
//! ### Status as a Finite-State Machine
//!
//! [`NeedStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Pending ──► Approved
//!     └─────► Rejected
//! ```
//!
//! Both `Approved` and `Rejected` are terminal. Only approved needs accept
//! donations; rejected needs are permanently out of consideration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Moderation status of a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedStatus {
    /// Awaiting an admin decision; not visible, not fundable.
    Pending,
    /// Accepted into the marketplace; visible and fundable.
    Approved,
    /// Permanently removed from consideration.
    Rejected,
}

/// Urgency tier a school assigns to a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Platform role. The identity provider authenticates callers; this role is
/// the only authorization fact the ledger keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Donor,
    Admin,
}

/// What a donation is earmarked for: a specific need, or a shared-goal pool.
/// Mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DonationTarget {
    Need(u64),
    Pool(u64),
}

/// An educational institution. Owns zero or more needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: u64,
    pub name: String,
    /// Free-form setting descriptor (urban / rural / suburban).
    pub location: String,
    pub city: String,
    pub state: String,
    pub description: String,
    /// Only verified schools appear in public listings.
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Immutable need configuration, written once at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedConfig {
    pub id: u64,
    pub school_id: u64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    /// How many identical items the school is asking for.
    pub total_needed: u32,
    pub cost_per_item_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl NeedConfig {
    /// Derived total cost; fixed because the config never mutates.
    pub fn total_cost_cents(&self) -> i64 {
        self.cost_per_item_cents * i64::from(self.total_needed)
    }
}

/// Mutable need state, rewritten on donations and moderation decisions.
///
/// `version` backs the optimistic commit check: every mutation increments
/// it, and a donation commit whose snapshot version no longer matches is
/// retried against fresh state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedState {
    pub units_funded: u32,
    pub status: NeedStatus,
    pub version: u64,
}

/// Full public representation of a need, reconstructed from the split
/// `NeedConfig` + `NeedState` records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Need {
    pub id: u64,
    pub school_id: u64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    pub total_needed: u32,
    pub units_funded: u32,
    pub cost_per_item_cents: i64,
    pub status: NeedStatus,
    pub created_at: DateTime<Utc>,
}

/// Immutable pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub target_cents: i64,
    /// Display-only campaign end; joins after this date still count.
    pub end_date: NaiveDate,
}

/// Mutable pool state. Both counters are monotonically non-decreasing and
/// have no upper bound — exceeding the target is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub current_cents: i64,
    pub participants: u32,
    pub version: u64,
}

/// Full public representation of a shared-goal pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub target_cents: i64,
    pub current_cents: i64,
    pub participants: u32,
    pub end_date: NaiveDate,
}

/// A platform user (donor or admin).
///
/// `total_donated_cents` is a cached derivation: the sum of the user's
/// ledger entries. It is updated inside the same commit as each donation, so
/// it reconciles at every observable instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub total_donated_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// One immutable ledger entry. Never mutated after commit; the ledger is
/// append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: u64,
    pub donor_id: u64,
    pub target: DonationTarget,
    pub amount_cents: i64,
    /// Whole items funded by this donation (always 0 for pool targets).
    pub units_granted: u32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What the caller gets back from a successful donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationReceipt {
    pub donation_id: u64,
    pub donor_id: u64,
    pub target: DonationTarget,
    pub amount_cents: i64,
    pub units_granted: u32,
    /// The target's percent funded after this commit. Clamped to 100 for
    /// needs; pools may report more than 100.
    pub percent_funded: u32,
    pub created_at: DateTime<Utc>,
}

/// Aggregate impact summary. A pure projection over the ledger — never
/// stored, recomputable at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactStats {
    /// Count of ledger entries (direct and pool).
    pub total_donations: u64,
    /// Distinct schools reachable from approved needs with at least one
    /// donation.
    pub schools_supported: u64,
    /// Approved needs with at least one donation.
    pub needs_supported: u64,
    /// Sum over all donation amounts, pools included.
    pub total_funding_cents: i64,
    /// Heuristic estimate (total funding / configured dollars-per-student),
    /// not a ledger-derived guarantee.
    pub students_impacted: u64,
}

/// Parameters for submitting a new need into the moderation queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedSubmission {
    pub school_id: u64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    pub total_needed: u32,
    pub cost_per_item_cents: i64,
}

/// Parameters for registering a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolRegistration {
    pub name: String,
    pub location: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters for creating a shared-goal pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSubmission {
    pub name: String,
    pub description: String,
    pub target_cents: i64,
    pub end_date: NaiveDate,
}

/// Parameters for registering a user. Credentials are the identity
/// provider's concern and never reach this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistration {
    pub name: String,
    pub email: String,
    pub role: Role,
}
