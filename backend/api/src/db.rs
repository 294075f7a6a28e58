//! Journal layer — migrations, appends, and startup reads.
//!
//! The journal is the durable form of the ledger: one row per committed
//! event, keyed by the engine-assigned sequence number. Inserts are
//! idempotent (`INSERT OR IGNORE` on the `seq` primary key), so retrying an
//! append after a transport failure can never duplicate or reorder history.

use std::str::FromStr;

use equilearn_ledger::{Ledger, LedgerEvent};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Make sure the file is created if it doesn't exist yet.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Journal writes
// ─────────────────────────────────────────────────────────

/// Append one committed event to the journal.
pub async fn append_event(pool: &SqlitePool, event: &LedgerEvent) -> Result<()> {
    let payload = serde_json::to_string(event)?;
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO ledger_events (seq, kind, payload, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(event.seq as i64)
    .bind(event.kind().as_str())
    .bind(&payload)
    .bind(event.at.to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Bring the journal up to date with the engine's event stream.
///
/// Appends every engine event past the journal's highest sequence number,
/// oldest first. A commit whose append failed earlier (surfaced to that
/// caller as a transient error) is re-appended here before the next commit
/// is acknowledged, so the journal converges to the engine's history and
/// never keeps a gap. Appends run oldest first and stop on the first
/// failure, so the journal is at every moment a gap-free prefix of the
/// engine's stream. Concurrent syncs may both select overlapping ranges;
/// the seq-keyed `INSERT OR IGNORE` makes that harmless.
pub async fn sync_journal(pool: &SqlitePool, ledger: &Ledger) -> Result<()> {
    let (last,): (Option<i64>,) = sqlx::query_as("SELECT MAX(seq) FROM ledger_events")
        .fetch_one(pool)
        .await?;
    let last = last.unwrap_or(0).max(0) as u64;
    for event in ledger.events_after(last) {
        append_event(pool, &event).await?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Journal reads
// ─────────────────────────────────────────────────────────

/// Load the full journal in sequence order, ready for replay.
pub async fn load_events(pool: &SqlitePool) -> Result<Vec<LedgerEvent>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT payload FROM ledger_events ORDER BY seq ASC")
        .fetch_all(pool)
        .await?;
    let mut events = Vec::with_capacity(rows.len());
    for (payload,) in rows {
        events.push(serde_json::from_str(&payload)?);
    }
    Ok(events)
}
