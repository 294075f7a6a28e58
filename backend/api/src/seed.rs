//! Demo fixture for an empty journal.
//!
//! Everything goes through the normal engine entry points, so every invariant
//! holds on the seeded data: progress counters come from real seeded
//! donations, and donor totals reconcile against the ledger. The fixture only
//! runs when the journal is empty, so the ledger's full event stream at the
//! end is exactly the seed and one journal sync persists it wholesale.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

use equilearn_ledger::{
    DonationTarget, Ledger, NeedSubmission, PoolSubmission, Role, SchoolRegistration, Urgency,
    UserRegistration,
};

use crate::db;
use crate::errors::Result;

pub async fn demo_fixture(ledger: &Ledger, pool: &SqlitePool) -> Result<()> {
    ledger.register_user(UserRegistration {
        name: "Admin User".into(),
        email: "admin@equilearn.org".into(),
        role: Role::Admin,
    })?;
    let (john, _) = ledger.register_user(UserRegistration {
        name: "John Smith".into(),
        email: "john@example.com".into(),
        role: Role::Donor,
    })?;
    let (sarah, _) = ledger.register_user(UserRegistration {
        name: "Sarah Johnson".into(),
        email: "sarah@example.com".into(),
        role: Role::Donor,
    })?;

    let (oakwood, _) = ledger.register_school(SchoolRegistration {
        name: "Oakwood Middle School".into(),
        location: "urban".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        description: None,
    })?;
    let (riverside, _) = ledger.register_school(SchoolRegistration {
        name: "Riverside Elementary".into(),
        location: "rural".into(),
        city: "Farmville".into(),
        state: "NC".into(),
        description: None,
    })?;
    let (lincoln, _) = ledger.register_school(SchoolRegistration {
        name: "Lincoln High School".into(),
        location: "suburban".into(),
        city: "Fairview".into(),
        state: "CA".into(),
        description: None,
    })?;
    for school_id in [oakwood.id, riverside.id, lincoln.id] {
        ledger.verify_school(school_id)?;
    }

    let needs = [
        NeedSubmission {
            school_id: oakwood.id,
            title: "Chromebooks for Grade 6".into(),
            description: "Need 5 Chromebooks for our 6th grade computer lab".into(),
            category: "Technology".into(),
            urgency: Urgency::High,
            total_needed: 5,
            cost_per_item_cents: 30_000,
        },
        NeedSubmission {
            school_id: oakwood.id,
            title: "Science Lab Equipment".into(),
            description: "Microscopes and lab supplies for biology class".into(),
            category: "STEM".into(),
            urgency: Urgency::Medium,
            total_needed: 10,
            cost_per_item_cents: 15_000,
        },
        NeedSubmission {
            school_id: riverside.id,
            title: "Art Supplies".into(),
            description: "Paint, brushes, and canvas for art class".into(),
            category: "Art".into(),
            urgency: Urgency::Low,
            total_needed: 50,
            cost_per_item_cents: 500,
        },
        NeedSubmission {
            school_id: lincoln.id,
            title: "Sports Equipment".into(),
            description: "Basketballs, soccer balls, and gym equipment".into(),
            category: "Sports".into(),
            urgency: Urgency::Medium,
            total_needed: 20,
            cost_per_item_cents: 2_500,
        },
        NeedSubmission {
            school_id: lincoln.id,
            title: "Library Books".into(),
            description: "New fiction and non-fiction books for library".into(),
            category: "Books".into(),
            urgency: Urgency::Low,
            total_needed: 100,
            cost_per_item_cents: 1_500,
        },
    ];
    let mut need_ids = Vec::new();
    for submission in needs {
        let (need, _) = ledger.submit_need(submission)?;
        ledger.approve_need(need.id)?;
        need_ids.push(need.id);
    }

    // Funding progress from the original fixture, expressed as donations:
    // 2, 3, 15, 8, 30 units respectively.
    let progress = [
        (need_ids[0], &john, 60_000),
        (need_ids[1], &sarah, 45_000),
        (need_ids[2], &john, 7_500),
        (need_ids[3], &sarah, 20_000),
        (need_ids[4], &john, 45_000),
    ];
    for (need_id, donor, amount_cents) in progress {
        ledger.submit_donation(donor.id, DonationTarget::Need(need_id), amount_cents, None)?;
    }

    let pools = [
        PoolSubmission {
            name: "Back to School Supplies".into(),
            description:
                "Help provide essential school supplies for students in need across multiple schools."
                    .into(),
            target_cents: 1_000_000,
            end_date: date(2024, 2, 15),
        },
        PoolSubmission {
            name: "Technology for All".into(),
            description:
                "Fund computers and tablets for schools that lack basic technology infrastructure."
                    .into(),
            target_cents: 2_500_000,
            end_date: date(2024, 3, 1),
        },
        PoolSubmission {
            name: "Sports Equipment Drive".into(),
            description:
                "Provide sports equipment and uniforms for schools to promote physical education."
                    .into(),
            target_cents: 800_000,
            end_date: date(2024, 2, 28),
        },
    ];
    let mut pool_ids = Vec::new();
    for submission in pools {
        let (created, _) = ledger.create_pool(submission)?;
        pool_ids.push(created.id);
    }
    let joins = [
        (pool_ids[0], &john, 25_000),
        (pool_ids[0], &sarah, 10_000),
        (pool_ids[1], &sarah, 50_000),
        (pool_ids[2], &john, 15_000),
    ];
    for (pool_id, donor, amount_cents) in joins {
        ledger.join_pool(pool_id, donor.id, amount_cents, None)?;
    }

    db::sync_journal(pool, ledger).await?;
    info!(events = ledger.events().len(), "Seeded demo fixture");
    Ok(())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}
