//! Funding arithmetic.
//!
//! Pure integer math shared by the donation commit path and the read-side
//! projections. Percent values round half-up; need percent clamps to 100,
//! pool percent does not (campaigns may exceed their goal).
//!
//! Remainder policy: a donation grants `floor(amount / cost)` whole units,
//! capped at the need's remaining capacity. The un-granted remainder stays
//! on the ledger entry — it counts toward funding totals but buys no
//! further units. Nothing is refunded or redirected.

/// Units of capacity still open on a need.
pub(crate) fn remaining_units(total_needed: u32, units_funded: u32) -> u32 {
    total_needed.saturating_sub(units_funded)
}

/// Whole items funded by a donation of `amount_cents` against a need with
/// the given per-item cost and remaining capacity.
///
/// `cost_per_item_cents` is validated positive at need submission.
pub(crate) fn units_granted(amount_cents: i64, cost_per_item_cents: i64, remaining: u32) -> u32 {
    let affordable = amount_cents / cost_per_item_cents;
    affordable.min(i64::from(remaining)) as u32
}

/// Percent of a need's capacity that is funded, rounded half-up and clamped
/// to [0, 100].
pub(crate) fn need_percent(units_funded: u32, total_needed: u32) -> u32 {
    if total_needed == 0 {
        return 0;
    }
    let total = u64::from(total_needed);
    let pct = (u64::from(units_funded) * 100 + total / 2) / total;
    pct.min(100) as u32
}

/// Percent of a pool's target that is funded, rounded half-up. Not clamped:
/// a pool past its goal reports more than 100.
pub(crate) fn pool_percent(current_cents: i64, target_cents: i64) -> u32 {
    if target_cents <= 0 {
        return 0;
    }
    let current = i128::from(current_cents.max(0));
    let target = i128::from(target_cents);
    let pct = (current * 100 + target / 2) / target;
    u32::try_from(pct).unwrap_or(u32::MAX)
}
