//! Axum route handlers for candidates and candidate skills.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::cache::cached;
use crate::errors::AppError;
use crate::extract::{Path, Query};
use crate::models::{
    Candidate, CandidateFields, CandidatePatch, CandidateSkill, CandidateSkillInput,
    CandidateSkillPatch, NewCandidate,
};
use crate::pagination::{require_batch, validate_id, PageParams};
use crate::state::AppState;

fn candidate_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Candidate {id} not found"))
}

fn skill_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Candidate skill {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Candidates
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    let page = params.validate()?;
    let key = format!("all_candidates:{}:{}", page.limit, page.page);
    let candidates = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        let rows = state.store.list_candidates(page).await?;
        if rows.is_empty() {
            return Err(AppError::empty_listing());
        }
        Ok(rows)
    })
    .await?;
    Ok(Json(candidates))
}

/// POST /api/v1/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Json(req): Json<NewCandidate>,
) -> Result<(StatusCode, Json<Candidate>), AppError> {
    let candidate = state.store.create_candidate(req).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Candidate>, AppError> {
    let id = validate_id(id, "candidate_id")?;
    let key = format!("candidates:{id}");
    let candidate = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        state
            .store
            .get_candidate(id)
            .await?
            .ok_or_else(|| candidate_not_found(id))
    })
    .await?;
    Ok(Json(candidate))
}

/// PUT /api/v1/candidates/:id
pub async fn handle_replace_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CandidateFields>,
) -> Result<StatusCode, AppError> {
    let id = validate_id(id, "candidate_id")?;
    state
        .store
        .update_candidate(id, req.into())
        .await?
        .ok_or_else(|| candidate_not_found(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/candidates/:id
pub async fn handle_patch_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CandidatePatch>,
) -> Result<Json<Candidate>, AppError> {
    let id = validate_id(id, "candidate_id")?;
    let candidate = state
        .store
        .update_candidate(id, req)
        .await?
        .ok_or_else(|| candidate_not_found(id))?;
    Ok(Json(candidate))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let id = validate_id(id, "candidate_id")?;
    if !state.store.delete_candidate(id).await? {
        return Err(candidate_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Skills of one candidate
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates/:id/skills
pub async fn handle_list_candidate_skills(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CandidateSkill>>, AppError> {
    let id = validate_id(id, "candidate_id")?;
    let key = format!("all_candidates_skills:{id}");
    let skills = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        let skills = state.store.list_candidate_skills(id).await?;
        // An empty list is only meaningful for a candidate that exists.
        if skills.is_empty() && state.store.get_candidate(id).await?.is_none() {
            return Err(candidate_not_found(id));
        }
        Ok(skills)
    })
    .await?;
    Ok(Json(skills))
}

/// POST /api/v1/candidates/:id/skills
pub async fn handle_add_candidate_skills(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Vec<CandidateSkillInput>>,
) -> Result<(StatusCode, Json<Vec<CandidateSkill>>), AppError> {
    let id = validate_id(id, "candidate_id")?;
    require_batch(&req, "skills")?;
    let skills = state.store.add_candidate_skills(id, req).await?;
    Ok((StatusCode::CREATED, Json(skills)))
}

// ────────────────────────────────────────────────────────────────────────────
// Single candidate skill
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidate-skills/:skill_id
pub async fn handle_get_candidate_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
) -> Result<Json<CandidateSkill>, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    let key = format!("candidates_skills:{skill_id}");
    let skill = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        state
            .store
            .get_candidate_skill(skill_id)
            .await?
            .ok_or_else(|| skill_not_found(skill_id))
    })
    .await?;
    Ok(Json(skill))
}

/// PUT /api/v1/candidate-skills/:skill_id
pub async fn handle_replace_candidate_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
    Json(req): Json<CandidateSkillInput>,
) -> Result<StatusCode, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    state
        .store
        .update_candidate_skill(skill_id, req.into())
        .await?
        .ok_or_else(|| skill_not_found(skill_id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/candidate-skills/:skill_id
pub async fn handle_patch_candidate_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
    Json(req): Json<CandidateSkillPatch>,
) -> Result<Json<CandidateSkill>, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    let skill = state
        .store
        .update_candidate_skill(skill_id, req)
        .await?
        .ok_or_else(|| skill_not_found(skill_id))?;
    Ok(Json(skill))
}

/// DELETE /api/v1/candidate-skills/:skill_id
pub async fn handle_delete_candidate_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    if !state.store.delete_candidate_skill(skill_id).await? {
        return Err(skill_not_found(skill_id));
    }
    Ok(StatusCode::NO_CONTENT)
}
