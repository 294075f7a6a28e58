//! Canonical events produced by the donation ledger.
//!
//! Every committed mutation yields exactly one [`LedgerEvent`]. The event
//! stream is the durable form of the ledger: applying the same events, in
//! sequence order, to an empty engine reproduces identical state. The
//! service journals each event verbatim and replays the journal on startup.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DonationTarget, Role, Urgency};

/// All recognised event kinds, as stored in the journal's `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    UserRegistered,
    SchoolRegistered,
    SchoolVerified,
    NeedSubmitted,
    NeedApproved,
    NeedRejected,
    PoolCreated,
    DonationRecorded,
}

impl EventKind {
    /// Short identifier string suitable for storage in the journal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistered => "user_registered",
            Self::SchoolRegistered => "school_registered",
            Self::SchoolVerified => "school_verified",
            Self::NeedSubmitted => "need_submitted",
            Self::NeedApproved => "need_approved",
            Self::NeedRejected => "need_rejected",
            Self::PoolCreated => "pool_created",
            Self::DonationRecorded => "donation_recorded",
        }
    }
}

/// Payload of a committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventBody {
    UserRegistered {
        id: u64,
        name: String,
        email: String,
        role: Role,
    },
    SchoolRegistered {
        id: u64,
        name: String,
        location: String,
        city: String,
        state: String,
        description: String,
    },
    SchoolVerified {
        school_id: u64,
    },
    NeedSubmitted {
        id: u64,
        school_id: u64,
        title: String,
        description: String,
        category: String,
        urgency: Urgency,
        total_needed: u32,
        cost_per_item_cents: i64,
    },
    NeedApproved {
        need_id: u64,
    },
    NeedRejected {
        need_id: u64,
    },
    PoolCreated {
        id: u64,
        name: String,
        description: String,
        target_cents: i64,
        end_date: NaiveDate,
    },
    DonationRecorded {
        id: u64,
        donor_id: u64,
        target: DonationTarget,
        amount_cents: i64,
        /// Carried on the event so replay never recomputes a grant against
        /// state that later donations have already moved.
        units_granted: u32,
        message: Option<String>,
    },
}

impl EventBody {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UserRegistered { .. } => EventKind::UserRegistered,
            Self::SchoolRegistered { .. } => EventKind::SchoolRegistered,
            Self::SchoolVerified { .. } => EventKind::SchoolVerified,
            Self::NeedSubmitted { .. } => EventKind::NeedSubmitted,
            Self::NeedApproved { .. } => EventKind::NeedApproved,
            Self::NeedRejected { .. } => EventKind::NeedRejected,
            Self::PoolCreated { .. } => EventKind::PoolCreated,
            Self::DonationRecorded { .. } => EventKind::DonationRecorded,
        }
    }
}

/// A committed, sequence-numbered ledger event.
///
/// `seq` is gap-free from 1 within one ledger; `at` is the server-assigned
/// commit timestamp, reused as the created-at of whatever the event created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub seq: u64,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: EventBody,
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        self.body.kind()
    }
}
