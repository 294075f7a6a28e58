//! EquiLearn API — entry point.
//!
//! Rebuilds the donation ledger by replaying the SQLite event journal, then
//! serves the Axum REST API over the in-memory engine. Every committed
//! mutation is appended to the journal before the request is acknowledged,
//! so the replayed state on the next start equals what callers saw.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod seed;

use std::sync::Arc;

use equilearn_ledger::Ledger;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env()?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // Rebuild the engine from the journal.
    let events = db::load_events(&pool).await?;
    let replayed = events.len();
    let ledger = Arc::new(Ledger::replay(events, config.dollars_per_student)?);
    info!(events = replayed, "Ledger replayed from journal");

    if config.seed_demo_data && ledger.is_empty() {
        seed::demo_fixture(&ledger, &pool).await?;
    }

    // ─── REST API ─────────────────────────────────────────
    let state = Arc::new(api::ApiState { ledger, pool });
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
