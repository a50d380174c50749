//! HTTP API surface
//!
//! Thin handlers over the store and index query contract, plus the claim
//! intake pass-through and the ingestion trigger. The read path is
//! per-request and never touches ingestion state; the trigger path takes
//! the run lock so overlapping ingestion runs are rejected rather than
//! racing on the index watermark.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::info;

use escheat_common::{EscheatError, Property, RunSummary};

use crate::config::Config;
use crate::db::search;
use crate::error::AppError;
use crate::ingest::{BatchLoader, SourceFetcher, SyncOrchestrator};

/// Default number of search results when the caller does not say.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Hard ceiling on search results per request.
pub const MAX_SEARCH_LIMIT: u32 = 500;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    /// Ingestion is single-writer; an overlapping trigger fails fast.
    pub sync_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Arc<Config>) -> Self {
        Self {
            pool,
            config,
            sync_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search_properties))
        .route("/property/:property_id", get(get_property))
        .route("/claim", post(start_claim))
        .route("/sync", post(trigger_sync))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
    limit: Option<u32>,
}

/// Token search over owner and holder text; hydrated records, best first.
async fn search_properties(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Property>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);
    let results = search::search(&state.pool, &params.q, limit).await?;
    Ok(Json(results))
}

/// Exact lookup by property id.
async fn get_property(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<Property>, AppError> {
    let property = search::lookup(&state.pool, &property_id)
        .await?
        .ok_or(EscheatError::NotFound(property_id))?;
    Ok(Json(property))
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub property_id: String,
    pub claimant_name: String,
    pub claimant_address: String,
    pub claimant_email: String,
    #[serde(default)]
    pub claimant_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimReceipt {
    pub message: String,
    pub property: Property,
}

/// Stateless claim intake: confirm the record exists and acknowledge.
/// Claim fulfilment (identity proofing, e-signature) happens outside this
/// service.
async fn start_claim(
    State(state): State<AppState>,
    Json(payload): Json<ClaimRequest>,
) -> Result<Json<ClaimReceipt>, AppError> {
    let property = search::lookup(&state.pool, &payload.property_id)
        .await?
        .ok_or_else(|| EscheatError::NotFound(payload.property_id.clone()))?;

    info!(
        property_id = %property.property_id,
        claimant = %payload.claimant_name,
        "Claim initiated"
    );

    Ok(Json(ClaimReceipt {
        message: "Claim initiated".to_string(),
        property,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Archive locations to ingest; defaults to the configured list.
    #[serde(default)]
    pub locations: Option<Vec<String>>,
}

/// Trigger one ingestion run. Returns the run summary once every location
/// has been processed; a concurrent trigger is rejected with 409.
async fn trigger_sync(
    State(state): State<AppState>,
    payload: Option<Json<SyncRequest>>,
) -> Result<Json<RunSummary>, AppError> {
    let Ok(_guard) = state.sync_lock.try_lock() else {
        return Err(AppError::Conflict(
            "an ingestion run is already in progress".to_string(),
        ));
    };

    let locations = payload
        .and_then(|Json(request)| request.locations)
        .unwrap_or_else(|| state.config.source.archives.clone());

    let fetcher = SourceFetcher::new(&state.config.source)?;
    let loader = BatchLoader::new(state.pool.clone());
    let orchestrator = SyncOrchestrator::new(fetcher, loader, state.config.ingest.chunk_size);

    let summary = orchestrator.run(&locations).await?;
    Ok(Json(summary))
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}
