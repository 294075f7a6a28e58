//! Ledger error taxonomy.
//!
//! Every failure the engine can report is one flat variant here. The
//! [`ErrorClass`] accessor groups variants into the four families the
//! transport layer cares about (bad input, missing entity, wrong state,
//! transient conflict) so status mapping lives in one place on the API side.

use thiserror::Error;

/// All failures reported by the donation ledger.
///
/// No variant is ever returned after a partial update: validation happens
/// before the commit point, and the commit itself is a single atomic apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("donation amount must be positive, got {amount_cents} cents")]
    InvalidAmount { amount_cents: i64 },

    #[error("cost per item must be positive, got {cost_per_item_cents} cents")]
    InvalidCost { cost_per_item_cents: i64 },

    #[error("total units required must be positive")]
    InvalidUnits,

    #[error("pool target must be positive, got {target_cents} cents")]
    InvalidTarget { target_cents: i64 },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("email {email} is already registered")]
    DuplicateEmail { email: String },

    #[error("school {0} does not exist")]
    UnknownSchool(u64),

    #[error("need {0} does not exist")]
    UnknownNeed(u64),

    #[error("pool {0} does not exist")]
    UnknownPool(u64),

    #[error("user {0} does not exist")]
    UnknownUser(u64),

    #[error("need {0} is not approved for funding")]
    NotApproved(u64),

    #[error("need {0} is already fully funded")]
    FullyFunded(u64),

    #[error("need {0} is not pending moderation")]
    NotPending(u64),

    #[error("donation amount would overflow the target's running totals")]
    CounterOverflow,

    #[error("conflicting updates to the same target, retries exhausted")]
    ConcurrencyConflict,

    #[error("journal replay out of order: expected seq {expected}, found {found}")]
    ReplayOutOfOrder { expected: u64, found: u64 },
}

/// Coarse grouping used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input; the request never made sense.
    Validation,
    /// The referenced entity does not exist.
    NotFound,
    /// The entity exists but is in a state that forbids the operation.
    State,
    /// Transient serialization failure; safe to retry.
    Conflict,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::InvalidAmount { .. }
            | Error::InvalidCost { .. }
            | Error::InvalidUnits
            | Error::InvalidTarget { .. }
            | Error::EmptyField { .. }
            | Error::DuplicateEmail { .. }
            | Error::CounterOverflow
            | Error::ReplayOutOfOrder { .. } => ErrorClass::Validation,
            Error::UnknownSchool(_)
            | Error::UnknownNeed(_)
            | Error::UnknownPool(_)
            | Error::UnknownUser(_) => ErrorClass::NotFound,
            Error::NotApproved(_) | Error::FullyFunded(_) | Error::NotPending(_) => {
                ErrorClass::State
            }
            Error::ConcurrencyConflict => ErrorClass::Conflict,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
