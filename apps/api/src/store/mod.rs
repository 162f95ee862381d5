//! Persistence gateway for candidates, job openings and their skills.
//!
//! `AppState` holds an `Arc<dyn TalentStore>`: [`PgStore`] when a database is
//! configured, otherwise [`MemoryStore`], which tests use as well.

use async_trait::async_trait;
use thiserror::Error;

use crate::matching::engine::Ranked;
use crate::models::{
    Candidate, CandidatePatch, CandidateSkill, CandidateSkillInput, CandidateSkillPatch,
    JobOpening, JobOpeningPatch, NewCandidate, NewJobOpening, RequiredSkill, RequiredSkillInput,
    RequiredSkillPatch,
};
use crate::pagination::{Page, SortOrder};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record a query is anchored on does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A child row referenced a parent that does not exist. The write was rolled back.
    #[error("{0} does not exist")]
    InvalidReference(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Every write is atomic: a failure leaves no partially applied state behind.
/// Operations on a single record return `Ok(None)` / `Ok(false)` when the id
/// does not resolve, leaving the not-found policy to the caller.
#[async_trait]
pub trait TalentStore: Send + Sync {
    // ── Candidates ──────────────────────────────────────────────────────────
    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError>;
    async fn get_candidate(&self, id: i64) -> Result<Option<Candidate>, StoreError>;
    async fn list_candidates(&self, page: Page) -> Result<Vec<Candidate>, StoreError>;
    async fn update_candidate(
        &self,
        id: i64,
        patch: CandidatePatch,
    ) -> Result<Option<Candidate>, StoreError>;
    async fn delete_candidate(&self, id: i64) -> Result<bool, StoreError>;

    // ── Candidate skills ────────────────────────────────────────────────────
    async fn add_candidate_skills(
        &self,
        candidate_id: i64,
        skills: Vec<CandidateSkillInput>,
    ) -> Result<Vec<CandidateSkill>, StoreError>;
    async fn list_candidate_skills(
        &self,
        candidate_id: i64,
    ) -> Result<Vec<CandidateSkill>, StoreError>;
    async fn get_candidate_skill(&self, skill_id: i64)
        -> Result<Option<CandidateSkill>, StoreError>;
    async fn update_candidate_skill(
        &self,
        skill_id: i64,
        patch: CandidateSkillPatch,
    ) -> Result<Option<CandidateSkill>, StoreError>;
    async fn delete_candidate_skill(&self, skill_id: i64) -> Result<bool, StoreError>;

    // ── Job openings ────────────────────────────────────────────────────────
    async fn create_job_opening(&self, job: NewJobOpening) -> Result<JobOpening, StoreError>;
    async fn get_job_opening(&self, id: i64) -> Result<Option<JobOpening>, StoreError>;
    async fn list_job_openings(&self, page: Page) -> Result<Vec<JobOpening>, StoreError>;
    async fn update_job_opening(
        &self,
        id: i64,
        patch: JobOpeningPatch,
    ) -> Result<Option<JobOpening>, StoreError>;
    async fn delete_job_opening(&self, id: i64) -> Result<bool, StoreError>;

    // ── Required skills (each write also adjusts `skills_quantity`) ─────────
    async fn add_required_skills(
        &self,
        job_id: i64,
        skills: Vec<RequiredSkillInput>,
    ) -> Result<Vec<RequiredSkill>, StoreError>;
    async fn list_required_skills(&self, job_id: i64) -> Result<Vec<RequiredSkill>, StoreError>;
    async fn get_required_skill(&self, skill_id: i64)
        -> Result<Option<RequiredSkill>, StoreError>;
    async fn update_required_skill(
        &self,
        skill_id: i64,
        patch: RequiredSkillPatch,
    ) -> Result<Option<RequiredSkill>, StoreError>;
    async fn delete_required_skill(&self, skill_id: i64) -> Result<bool, StoreError>;

    // ── Matching ────────────────────────────────────────────────────────────
    /// Candidates satisfying every required skill of `job_id`, ranked and paginated.
    /// `StoreError::NotFound` when the job opening does not exist.
    async fn candidates_for_job(
        &self,
        job_id: i64,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Ranked<Candidate>>, StoreError>;

    /// Job openings whose every required skill `candidate_id` satisfies, ranked and paginated.
    /// `StoreError::NotFound` when the candidate does not exist.
    async fn jobs_for_candidate(
        &self,
        candidate_id: i64,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Ranked<JobOpening>>, StoreError>;
}
