//! Axum REST API over the ledger engine.
//!
//! Write handlers follow one shape: commit to the engine (which validates
//! and produces the event), sync the journal up to the engine's event
//! stream, then acknowledge. A journal failure surfaces as a 5xx before any
//! acknowledgement; the committed event stays in the engine and the next
//! successful sync re-appends it, so a transient outage never leaves a
//! sequence gap behind. Read handlers project straight off the engine's
//! read lock.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use equilearn_ledger::{
    DonationTarget, Ledger, NeedSubmission, PoolSubmission, SchoolRegistration, UserRegistration,
};

use crate::auth;
use crate::db;
use crate::errors::Result;

#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<Ledger>,
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DonationRequest {
    pub donor_id: u64,
    pub target: DonationTarget,
    pub amount_cents: i64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct JoinPoolRequest {
    pub donor_id: u64,
    pub amount_cents: i64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/users`
///
/// Registers a donor or admin. No credentials pass through here; identity is
/// the external provider's concern.
pub async fn register_user(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<UserRegistration>,
) -> Result<impl IntoResponse> {
    let (user, _) = state.ledger.register_user(req)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: user.id })))
}

/// `GET /api/users/:id`
pub async fn get_user(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.ledger.get_user(id)?))
}

/// `POST /api/schools` — schools enter unverified.
pub async fn register_school(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<SchoolRegistration>,
) -> Result<impl IntoResponse> {
    let (school, _) = state.ledger.register_school(req)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: school.id })))
}

/// `GET /api/schools` — the public browse listing: verified schools with
/// their approved needs.
pub async fn list_schools(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse> {
    Ok(Json(state.ledger.list_approved_schools_with_needs()))
}

/// `POST /api/needs` — enters the moderation queue as pending.
pub async fn submit_need(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<NeedSubmission>,
) -> Result<impl IntoResponse> {
    let (need, _) = state.ledger.submit_need(req)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: need.id })))
}

/// `POST /api/pools` — admin only.
pub async fn create_pool(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(req): Json<PoolSubmission>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.ledger, &headers)?;
    let (pool, _) = state.ledger.create_pool(req)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: pool.id })))
}

/// `GET /api/pools`
pub async fn list_pools(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse> {
    Ok(Json(state.ledger.list_pools()))
}

/// `POST /api/donations`
pub async fn submit_donation(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<DonationRequest>,
) -> Result<impl IntoResponse> {
    let (receipt, _) =
        state
            .ledger
            .submit_donation(req.donor_id, req.target, req.amount_cents, req.message)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `POST /api/pools/:id/join` — pool sugar over the donation path.
pub async fn join_pool(
    State(state): State<Arc<ApiState>>,
    Path(pool_id): Path<u64>,
    Json(req): Json<JoinPoolRequest>,
) -> Result<impl IntoResponse> {
    let (receipt, _) =
        state
            .ledger
            .join_pool(pool_id, req.donor_id, req.amount_cents, req.message)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `GET /api/donations` — the calling donor's history, newest first.
pub async fn donation_history(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let actor = auth::resolve_actor(&state.ledger, &headers)?;
    Ok(Json(state.ledger.list_donations_for_donor(actor.id)?))
}

/// `GET /api/impact`
pub async fn impact(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse> {
    Ok(Json(state.ledger.impact_stats()))
}

/// `GET /api/admin/needs/pending` — admin only.
pub async fn pending_needs(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.ledger, &headers)?;
    Ok(Json(state.ledger.list_pending_needs()))
}

/// `POST /api/admin/needs/:id/approve` — admin only; pending needs only.
pub async fn approve_need(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.ledger, &headers)?;
    state.ledger.approve_need(id)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok(Json(state.ledger.get_need(id)?))
}

/// `POST /api/admin/needs/:id/reject` — admin only; terminal.
pub async fn reject_need(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.ledger, &headers)?;
    state.ledger.reject_need(id)?;
    db::sync_journal(&state.pool, &state.ledger).await?;
    Ok(Json(state.ledger.get_need(id)?))
}

/// `GET /api/admin/schools` — admin directory, verified or not.
pub async fn admin_schools(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.ledger, &headers)?;
    Ok(Json(state.ledger.list_admin_schools()))
}

/// `POST /api/admin/schools/:id/verify` — admin only; idempotent.
pub async fn verify_school(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.ledger, &headers)?;
    if state.ledger.verify_school(id)?.is_some() {
        db::sync_journal(&state.pool, &state.ledger).await?;
    }
    Ok(Json(state.ledger.get_school(id)?))
}

// ─────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users", post(register_user))
        .route("/api/users/:id", get(get_user))
        .route("/api/schools", get(list_schools).post(register_school))
        .route("/api/needs", post(submit_need))
        .route("/api/pools", get(list_pools).post(create_pool))
        .route("/api/pools/:id/join", post(join_pool))
        .route("/api/donations", get(donation_history).post(submit_donation))
        .route("/api/impact", get(impact))
        .route("/api/admin/needs/pending", get(pending_needs))
        .route("/api/admin/needs/:id/approve", post(approve_need))
        .route("/api/admin/needs/:id/reject", post(reject_need))
        .route("/api/admin/schools", get(admin_schools))
        .route("/api/admin/schools/:id/verify", post(verify_school))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
