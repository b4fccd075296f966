//! Axum route handlers for the Matching API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::handlers::PartyQuery;
use crate::errors::AppError;
use crate::matching::lifecycle;
use crate::matching::proposer::{propose_matches, NO_MATCHES_MESSAGE};
use crate::matching::similarity::Laxity;
use crate::models::job_match::{JobMatchRow, MatchDisplay, MatchKey};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub ad_id: Uuid,
    /// Percentage in [0, 100]. Falls back to `DEFAULT_LAXITY`.
    pub laxity: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProposeResponse {
    pub message: &'static str,
    pub created: bool,
    pub new_matches: Vec<MatchKey>,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    #[serde(rename = "match")]
    pub job_match: JobMatchRow,
    pub mutually_approved: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/matches/propose
///
/// Scores the caller's ad against every candidate and stores the new pairs.
/// Responds 404 with "You have no matches!" when nothing new was created.
pub async fn handle_propose(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
    Json(req): Json<ProposeRequest>,
) -> Result<Json<ProposeResponse>, AppError> {
    let laxity = Laxity::from_percent(req.laxity.unwrap_or(state.config.default_laxity))?;
    let outcome = propose_matches(state.store.as_ref(), params.party(), req.ad_id, laxity).await?;

    if !outcome.created {
        return Err(AppError::NotFound(NO_MATCHES_MESSAGE.to_string()));
    }

    Ok(Json(ProposeResponse {
        message: outcome.message(),
        created: outcome.created,
        new_matches: outcome.new_matches,
    }))
}

/// GET /api/v1/matches
pub async fn handle_list_matches(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
) -> Result<Json<Vec<MatchDisplay>>, AppError> {
    let matches = lifecycle::list_matches_for(state.store.as_ref(), params.party()).await?;
    Ok(Json(matches))
}

/// PATCH /api/v1/matches/approve
pub async fn handle_approve(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
    Json(key): Json<MatchKey>,
) -> Result<Json<ApproveResponse>, AppError> {
    let row = lifecycle::approve(state.store.as_ref(), key, params.party()).await?;
    Ok(Json(ApproveResponse {
        mutually_approved: row.is_mutual(),
        job_match: row,
    }))
}
