//! Axum route handlers for job openings and required skills.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::cached;
use crate::errors::AppError;
use crate::extract::{Path, Query};
use crate::models::{
    JobOpening, JobOpeningFields, JobOpeningPatch, NewJobOpening, RequiredSkill,
    RequiredSkillInput, RequiredSkillPatch,
};
use crate::pagination::{require_batch, validate_id, PageParams};
use crate::state::AppState;

fn job_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Job opening {id} not found"))
}

fn skill_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Required skill {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Job openings
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/job-openings
pub async fn handle_list_job_openings(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<JobOpening>>, AppError> {
    let page = params.validate()?;
    let key = format!("all_job_openings:{}:{}", page.limit, page.page);
    let jobs = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        let rows = state.store.list_job_openings(page).await?;
        if rows.is_empty() {
            return Err(AppError::empty_listing());
        }
        Ok(rows)
    })
    .await?;
    Ok(Json(jobs))
}

/// POST /api/v1/job-openings
pub async fn handle_create_job_opening(
    State(state): State<AppState>,
    Json(req): Json<NewJobOpening>,
) -> Result<(StatusCode, Json<JobOpening>), AppError> {
    let job = state.store.create_job_opening(req).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/job-openings/:id
pub async fn handle_get_job_opening(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobOpening>, AppError> {
    let id = validate_id(id, "job_id")?;
    let key = format!("job_openings:{id}");
    let job = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        state
            .store
            .get_job_opening(id)
            .await?
            .ok_or_else(|| job_not_found(id))
    })
    .await?;
    Ok(Json(job))
}

/// PUT /api/v1/job-openings/:id
pub async fn handle_replace_job_opening(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<JobOpeningFields>,
) -> Result<StatusCode, AppError> {
    let id = validate_id(id, "job_id")?;
    state
        .store
        .update_job_opening(id, req.into())
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/job-openings/:id
pub async fn handle_patch_job_opening(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<JobOpeningPatch>,
) -> Result<Json<JobOpening>, AppError> {
    let id = validate_id(id, "job_id")?;
    let job = state
        .store
        .update_job_opening(id, req)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(job))
}

/// DELETE /api/v1/job-openings/:id
pub async fn handle_delete_job_opening(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let id = validate_id(id, "job_id")?;
    if !state.store.delete_job_opening(id).await? {
        return Err(job_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Required skills of one job opening
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/job-openings/:id/skills
pub async fn handle_list_required_skills(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RequiredSkill>>, AppError> {
    let id = validate_id(id, "job_id")?;
    let key = format!("all_job_openings_skills:{id}");
    let skills = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        let skills = state.store.list_required_skills(id).await?;
        if skills.is_empty() && state.store.get_job_opening(id).await?.is_none() {
            return Err(job_not_found(id));
        }
        Ok(skills)
    })
    .await?;
    Ok(Json(skills))
}

/// POST /api/v1/job-openings/:id/skills
pub async fn handle_add_required_skills(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Vec<RequiredSkillInput>>,
) -> Result<(StatusCode, Json<Vec<RequiredSkill>>), AppError> {
    let id = validate_id(id, "job_id")?;
    require_batch(&req, "skills")?;
    let skills = state.store.add_required_skills(id, req).await?;
    info!("Job opening {id} now requires {} more skill(s)", skills.len());
    Ok((StatusCode::CREATED, Json(skills)))
}

// ────────────────────────────────────────────────────────────────────────────
// Single required skill
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/required-skills/:skill_id
pub async fn handle_get_required_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
) -> Result<Json<RequiredSkill>, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    let key = format!("job_openings_skills:{skill_id}");
    let skill = cached(state.cache.as_ref(), &key, state.cache_ttl(), || async {
        state
            .store
            .get_required_skill(skill_id)
            .await?
            .ok_or_else(|| skill_not_found(skill_id))
    })
    .await?;
    Ok(Json(skill))
}

/// PUT /api/v1/required-skills/:skill_id
pub async fn handle_replace_required_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
    Json(req): Json<RequiredSkillInput>,
) -> Result<StatusCode, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    state
        .store
        .update_required_skill(skill_id, req.into())
        .await?
        .ok_or_else(|| skill_not_found(skill_id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/required-skills/:skill_id
pub async fn handle_patch_required_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
    Json(req): Json<RequiredSkillPatch>,
) -> Result<Json<RequiredSkill>, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    let skill = state
        .store
        .update_required_skill(skill_id, req)
        .await?
        .ok_or_else(|| skill_not_found(skill_id))?;
    Ok(Json(skill))
}

/// DELETE /api/v1/required-skills/:skill_id
pub async fn handle_delete_required_skill(
    State(state): State<AppState>,
    Path(skill_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let skill_id = validate_id(skill_id, "skill_id")?;
    if !state.store.delete_required_skill(skill_id).await? {
        return Err(skill_not_found(skill_id));
    }
    Ok(StatusCode::NO_CONTENT)
}
