//! Axum route handlers for the selection endpoints.

use axum::{extract::State, Json};

use crate::cache::cached;
use crate::errors::AppError;
use crate::extract::{Path, Query};
use crate::matching::engine::{find_matches, MatchDirection, MatchRequest, MatchResults};
use crate::pagination::{validate_id, SelectionParams};
use crate::state::AppState;

async fn select(
    state: &AppState,
    cache_namespace: &str,
    direction: MatchDirection,
    target_id: i64,
    params: SelectionParams,
) -> Result<Json<MatchResults>, AppError> {
    let request = MatchRequest {
        target_id,
        direction,
        order: params.sort,
        page: params.page()?,
    };
    let key = format!(
        "{cache_namespace}:{target_id}:{}:{}:{}",
        request.order.as_str(),
        request.page.limit,
        request.page.page
    );
    let results = cached(state.cache.as_ref(), &key, state.cache_ttl(), || {
        find_matches(state.store.as_ref(), request)
    })
    .await?;
    Ok(Json(results))
}

/// GET /api/v1/job-openings/:id/selection
/// Candidates that satisfy every required skill of the job opening.
pub async fn handle_select_candidates(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<MatchResults>, AppError> {
    let id = validate_id(id, "job_id")?;
    select(
        &state,
        "job_openings_selection",
        MatchDirection::CandidatesForJob,
        id,
        params,
    )
    .await
}

/// GET /api/v1/candidates/:id/selection
/// Job openings whose every required skill the candidate satisfies.
pub async fn handle_select_job_openings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<MatchResults>, AppError> {
    let id = validate_id(id, "candidate_id")?;
    select(
        &state,
        "candidates_selection",
        MatchDirection::JobsForCandidate,
        id,
        params,
    )
    .await
}
