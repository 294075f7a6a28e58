#![allow(dead_code)]

use crate::types::{DonationTarget, NeedStatus};
use crate::{Ledger, DEFAULT_DOLLARS_PER_STUDENT};

/// INV-1: a need's funded units never exceed its required total.
pub fn assert_units_within_capacity(ledger: &Ledger) {
    let store = ledger.read();
    for (id, state) in &store.need_states {
        let config = store
            .need_configs
            .get(id)
            .unwrap_or_else(|| panic!("INV-1 violated: need {} has state but no config", id));
        assert!(
            state.units_funded <= config.total_needed,
            "INV-1 violated: need {} funded {} of {} units",
            id,
            state.units_funded,
            config.total_needed
        );
    }
}

/// INV-2: every user's cached total equals the sum of their ledger entries.
pub fn assert_donor_totals_reconcile(ledger: &Ledger) {
    let store = ledger.read();
    for user in store.users.values() {
        let ledger_sum: i64 = store
            .donations
            .iter()
            .filter(|d| d.donor_id == user.id)
            .map(|d| d.amount_cents)
            .sum();
        assert_eq!(
            user.total_donated_cents, ledger_sum,
            "INV-2 violated: user {} cached total {} != ledger sum {}",
            user.id, user.total_donated_cents, ledger_sum
        );
    }
}

/// INV-3: pool counters reconcile against the ledger — current amount is the
/// sum of the pool's entries, participants is their count.
pub fn assert_pool_counters_reconcile(ledger: &Ledger) {
    let store = ledger.read();
    for (id, state) in &store.pool_states {
        let mut sum = 0i64;
        let mut count = 0u32;
        for donation in &store.donations {
            if donation.target == DonationTarget::Pool(*id) {
                sum += donation.amount_cents;
                count += 1;
            }
        }
        assert_eq!(
            state.current_cents, sum,
            "INV-3 violated: pool {} current {} != ledger sum {}",
            id, state.current_cents, sum
        );
        assert_eq!(
            state.participants, count,
            "INV-3 violated: pool {} participants {} != entry count {}",
            id, state.participants, count
        );
    }
}

/// INV-4: the event stream is gap-free, sequenced from 1.
pub fn assert_event_stream_contiguous(ledger: &Ledger) {
    for (i, event) in ledger.events().iter().enumerate() {
        assert_eq!(
            event.seq,
            i as u64 + 1,
            "INV-4 violated: expected seq {}, got {}",
            i + 1,
            event.seq
        );
    }
}

/// INV-5: status transition validity. The only legal moves are
///   Pending -> Approved
///   Pending -> Rejected
/// Both destinations are terminal.
pub fn assert_valid_status_transition(from: NeedStatus, to: NeedStatus) {
    let valid = matches!(
        (from, to),
        (NeedStatus::Pending, NeedStatus::Approved) | (NeedStatus::Pending, NeedStatus::Rejected)
    );
    assert!(
        valid,
        "INV-5 violated: invalid status transition from {:?} to {:?}",
        from, to
    );
}

/// INV-6: ledger entries are well formed — positive amounts, zero units for
/// pool targets, and every referenced target and donor exists.
pub fn assert_ledger_entries_well_formed(ledger: &Ledger) {
    let store = ledger.read();
    for donation in &store.donations {
        assert!(
            donation.amount_cents > 0,
            "INV-6 violated: donation {} has non-positive amount {}",
            donation.id,
            donation.amount_cents
        );
        assert!(
            store.users.contains_key(&donation.donor_id),
            "INV-6 violated: donation {} references unknown donor {}",
            donation.id,
            donation.donor_id
        );
        match donation.target {
            DonationTarget::Need(need_id) => {
                assert!(
                    store.need_configs.contains_key(&need_id),
                    "INV-6 violated: donation {} references unknown need {}",
                    donation.id,
                    need_id
                );
            }
            DonationTarget::Pool(pool_id) => {
                assert!(
                    store.pool_configs.contains_key(&pool_id),
                    "INV-6 violated: donation {} references unknown pool {}",
                    donation.id,
                    pool_id
                );
                assert_eq!(
                    donation.units_granted, 0,
                    "INV-6 violated: pool donation {} granted {} units",
                    donation.id, donation.units_granted
                );
            }
        }
    }
}

/// INV-7: replay equivalence — applying the ledger's own event stream to an
/// empty engine reproduces identical state, counters and versions included.
pub fn assert_replay_equivalent(ledger: &Ledger) {
    let replayed = Ledger::replay(ledger.events(), DEFAULT_DOLLARS_PER_STUDENT)
        .unwrap_or_else(|e| panic!("INV-7 violated: replay failed: {}", e));
    let a = ledger.read();
    let b = replayed.read();
    assert_eq!(a.schools, b.schools, "INV-7 violated: schools diverge");
    assert_eq!(
        a.need_configs, b.need_configs,
        "INV-7 violated: need configs diverge"
    );
    assert_eq!(
        a.need_states, b.need_states,
        "INV-7 violated: need states diverge"
    );
    assert_eq!(
        a.pool_configs, b.pool_configs,
        "INV-7 violated: pool configs diverge"
    );
    assert_eq!(
        a.pool_states, b.pool_states,
        "INV-7 violated: pool states diverge"
    );
    assert_eq!(a.users, b.users, "INV-7 violated: users diverge");
    assert_eq!(a.emails, b.emails, "INV-7 violated: email index diverges");
    assert_eq!(a.donations, b.donations, "INV-7 violated: donations diverge");
    assert_eq!(a.events, b.events, "INV-7 violated: events diverge");
    assert_eq!(
        (
            a.next_school_id,
            a.next_need_id,
            a.next_pool_id,
            a.next_user_id,
            a.next_donation_id,
            a.next_seq,
        ),
        (
            b.next_school_id,
            b.next_need_id,
            b.next_pool_id,
            b.next_user_id,
            b.next_donation_id,
            b.next_seq,
        ),
        "INV-7 violated: id counters diverge"
    );
}

/// Run every ledger-wide invariant.
pub fn assert_all_ledger_invariants(ledger: &Ledger) {
    assert_units_within_capacity(ledger);
    assert_donor_totals_reconcile(ledger);
    assert_pool_counters_reconcile(ledger);
    assert_event_stream_contiguous(ledger);
    assert_ledger_entries_well_formed(ledger);
    assert_replay_equivalent(ledger);
}
