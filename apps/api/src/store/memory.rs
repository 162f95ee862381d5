//! In-process [`TalentStore`] for running without PostgreSQL. Nothing survives a restart.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{StoreError, TalentStore};
use crate::matching::engine::{rank, Ranked};
use crate::matching::scoring::ScoringPolicy;
use crate::models::{
    Candidate, CandidatePatch, CandidateSkill, CandidateSkillInput, CandidateSkillPatch,
    JobOpening, JobOpeningPatch, NewCandidate, NewCandidateSkill, NewJobOpening,
    NewRequiredSkill, RequiredSkill, RequiredSkillInput, RequiredSkillPatch,
};
use crate::pagination::{Page, SortOrder};

#[derive(Default)]
struct Tables {
    candidates: Vec<Candidate>,
    job_openings: Vec<JobOpening>,
    next_record_id: i64,
    next_skill_id: i64,
}

impl Tables {
    fn record_id(&mut self) -> i64 {
        self.next_record_id += 1;
        self.next_record_id
    }

    fn skill_id(&mut self) -> i64 {
        self.next_skill_id += 1;
        self.next_skill_id
    }

    fn candidate_mut(&mut self, id: i64) -> Option<&mut Candidate> {
        self.candidates.iter_mut().find(|c| c.id == id)
    }

    fn job_mut(&mut self, id: i64) -> Option<&mut JobOpening> {
        self.job_openings.iter_mut().find(|j| j.id == id)
    }

    fn candidate_skill_mut(&mut self, skill_id: i64) -> Option<&mut CandidateSkill> {
        self.candidates
            .iter_mut()
            .flat_map(|c| c.skills.iter_mut())
            .find(|s| s.id == skill_id)
    }

    fn required_skill_mut(&mut self, skill_id: i64) -> Option<&mut RequiredSkill> {
        self.job_openings
            .iter_mut()
            .flat_map(|j| j.skills.iter_mut())
            .find(|s| s.id == skill_id)
    }
}

/// Aggregates live in one mutex, so every operation is trivially atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    policy: ScoringPolicy,
}

impl MemoryStore {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            tables: Mutex::default(),
            policy,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn page_of<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    page.apply(items.to_vec())
}

#[async_trait]
impl TalentStore for MemoryStore {
    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let NewCandidate { fields, skills } = candidate;
        let mut tables = self.lock();
        let id = tables.record_id();
        let skills = skills
            .into_iter()
            .map(|s| {
                let skill_id = tables.skill_id();
                NewCandidateSkill::prepare(s, &self.policy).into_row(skill_id, id)
            })
            .collect();
        let created = Candidate {
            id,
            first_name: fields.first_name,
            second_name: fields.second_name,
            age: fields.age,
            status: fields.status,
            city: fields.city,
            desired_position: fields.desired_position,
            education_degree: fields.education_degree,
            working_experience: fields.working_experience,
            about_oneself: fields.about_oneself,
            published: fields.published,
            time_create: Utc::now(),
            skills,
        };
        tables.candidates.push(created.clone());
        Ok(created)
    }

    async fn get_candidate(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        Ok(self.lock().candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn list_candidates(&self, page: Page) -> Result<Vec<Candidate>, StoreError> {
        Ok(page_of(&self.lock().candidates, page))
    }

    async fn update_candidate(
        &self,
        id: i64,
        patch: CandidatePatch,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut tables = self.lock();
        Ok(tables.candidate_mut(id).map(|candidate| {
            candidate.apply_patch(patch);
            candidate.clone()
        }))
    }

    async fn delete_candidate(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        let before = tables.candidates.len();
        tables.candidates.retain(|c| c.id != id);
        Ok(tables.candidates.len() < before)
    }

    async fn add_candidate_skills(
        &self,
        candidate_id: i64,
        skills: Vec<CandidateSkillInput>,
    ) -> Result<Vec<CandidateSkill>, StoreError> {
        let mut tables = self.lock();
        if tables.candidate_mut(candidate_id).is_none() {
            return Err(StoreError::InvalidReference(format!(
                "candidate {candidate_id}"
            )));
        }
        let rows: Vec<CandidateSkill> = skills
            .into_iter()
            .map(|s| {
                let skill_id = tables.skill_id();
                NewCandidateSkill::prepare(s, &self.policy).into_row(skill_id, candidate_id)
            })
            .collect();
        if let Some(candidate) = tables.candidate_mut(candidate_id) {
            candidate.skills.extend(rows.iter().cloned());
        }
        Ok(rows)
    }

    async fn list_candidate_skills(
        &self,
        candidate_id: i64,
    ) -> Result<Vec<CandidateSkill>, StoreError> {
        Ok(self
            .lock()
            .candidates
            .iter()
            .find(|c| c.id == candidate_id)
            .map(|c| c.skills.clone())
            .unwrap_or_default())
    }

    async fn get_candidate_skill(
        &self,
        skill_id: i64,
    ) -> Result<Option<CandidateSkill>, StoreError> {
        Ok(self.lock().candidate_skill_mut(skill_id).cloned())
    }

    async fn update_candidate_skill(
        &self,
        skill_id: i64,
        patch: CandidateSkillPatch,
    ) -> Result<Option<CandidateSkill>, StoreError> {
        let mut tables = self.lock();
        Ok(tables.candidate_skill_mut(skill_id).map(|skill| {
            skill.apply_patch(patch, &self.policy);
            skill.clone()
        }))
    }

    async fn delete_candidate_skill(&self, skill_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        for candidate in &mut tables.candidates {
            let before = candidate.skills.len();
            candidate.skills.retain(|s| s.id != skill_id);
            if candidate.skills.len() < before {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn create_job_opening(&self, job: NewJobOpening) -> Result<JobOpening, StoreError> {
        let NewJobOpening { fields, skills } = job;
        let mut tables = self.lock();
        let id = tables.record_id();
        let skills: Vec<RequiredSkill> = skills
            .into_iter()
            .map(|s| {
                let skill_id = tables.skill_id();
                NewRequiredSkill::prepare(s, &self.policy).into_row(skill_id, id)
            })
            .collect();
        let created = JobOpening {
            id,
            title: fields.title,
            description: fields.description,
            address: fields.address,
            salary: fields.salary,
            skills_quantity: i32::try_from(skills.len()).unwrap_or(i32::MAX),
            time_create: Utc::now(),
            skills,
        };
        tables.job_openings.push(created.clone());
        Ok(created)
    }

    async fn get_job_opening(&self, id: i64) -> Result<Option<JobOpening>, StoreError> {
        Ok(self.lock().job_openings.iter().find(|j| j.id == id).cloned())
    }

    async fn list_job_openings(&self, page: Page) -> Result<Vec<JobOpening>, StoreError> {
        Ok(page_of(&self.lock().job_openings, page))
    }

    async fn update_job_opening(
        &self,
        id: i64,
        patch: JobOpeningPatch,
    ) -> Result<Option<JobOpening>, StoreError> {
        let mut tables = self.lock();
        Ok(tables.job_mut(id).map(|job| {
            job.apply_patch(patch);
            job.clone()
        }))
    }

    async fn delete_job_opening(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        let before = tables.job_openings.len();
        tables.job_openings.retain(|j| j.id != id);
        Ok(tables.job_openings.len() < before)
    }

    async fn add_required_skills(
        &self,
        job_id: i64,
        skills: Vec<RequiredSkillInput>,
    ) -> Result<Vec<RequiredSkill>, StoreError> {
        let mut tables = self.lock();
        if tables.job_mut(job_id).is_none() {
            return Err(StoreError::InvalidReference(format!("job opening {job_id}")));
        }
        let rows: Vec<RequiredSkill> = skills
            .into_iter()
            .map(|s| {
                let skill_id = tables.skill_id();
                NewRequiredSkill::prepare(s, &self.policy).into_row(skill_id, job_id)
            })
            .collect();
        if let Some(job) = tables.job_mut(job_id) {
            job.skills.extend(rows.iter().cloned());
            job.skills_quantity += i32::try_from(rows.len()).unwrap_or(i32::MAX);
        }
        Ok(rows)
    }

    async fn list_required_skills(&self, job_id: i64) -> Result<Vec<RequiredSkill>, StoreError> {
        Ok(self
            .lock()
            .job_openings
            .iter()
            .find(|j| j.id == job_id)
            .map(|j| j.skills.clone())
            .unwrap_or_default())
    }

    async fn get_required_skill(
        &self,
        skill_id: i64,
    ) -> Result<Option<RequiredSkill>, StoreError> {
        Ok(self.lock().required_skill_mut(skill_id).cloned())
    }

    async fn update_required_skill(
        &self,
        skill_id: i64,
        patch: RequiredSkillPatch,
    ) -> Result<Option<RequiredSkill>, StoreError> {
        let mut tables = self.lock();
        Ok(tables.required_skill_mut(skill_id).map(|skill| {
            skill.apply_patch(patch, &self.policy);
            skill.clone()
        }))
    }

    async fn delete_required_skill(&self, skill_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        for job in &mut tables.job_openings {
            let before = job.skills.len();
            job.skills.retain(|s| s.id != skill_id);
            if job.skills.len() < before {
                job.skills_quantity -= 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn candidates_for_job(
        &self,
        job_id: i64,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Ranked<Candidate>>, StoreError> {
        let tables = self.lock();
        let job = tables
            .job_openings
            .iter()
            .find(|j| j.id == job_id)
            .ok_or_else(|| StoreError::NotFound(format!("job opening {job_id}")))?;
        Ok(rank(job, tables.candidates.iter().cloned(), order, page))
    }

    async fn jobs_for_candidate(
        &self,
        candidate_id: i64,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Ranked<JobOpening>>, StoreError> {
        let tables = self.lock();
        let candidate = tables
            .candidates
            .iter()
            .find(|c| c.id == candidate_id)
            .ok_or_else(|| StoreError::NotFound(format!("candidate {candidate_id}")))?;
        Ok(rank(candidate, tables.job_openings.iter().cloned(), order, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobOpeningFields;

    fn required(name: &str, level: i32, years: i32) -> RequiredSkillInput {
        RequiredSkillInput {
            name: name.to_string(),
            level,
            years_of_experience: years,
        }
    }

    async fn empty_job(store: &MemoryStore) -> JobOpening {
        store
            .create_job_opening(NewJobOpening {
                fields: JobOpeningFields {
                    title: "Backend".to_string(),
                    description: String::new(),
                    address: "Minsk".to_string(),
                    salary: 1500,
                },
                skills: Vec::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_skills_quantity_tracks_adds_and_deletes() {
        let store = MemoryStore::default();
        let job = empty_job(&store).await;
        assert_eq!(job.skills_quantity, 0);

        let added = store
            .add_required_skills(
                job.id,
                vec![required("Rust", 1, 1), required("Tokio", 0, 1), required("SQL", 0, 1)],
            )
            .await
            .unwrap();
        let job = store.get_job_opening(job.id).await.unwrap().unwrap();
        assert_eq!(job.skills_quantity, 3);

        assert!(store.delete_required_skill(added[1].id).await.unwrap());
        let job = store.get_job_opening(job.id).await.unwrap().unwrap();
        assert_eq!(job.skills_quantity, 2);
        assert_eq!(job.skills.len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_unknown_skill_leaves_counter_alone() {
        let store = MemoryStore::default();
        let job = empty_job(&store).await;
        store
            .add_required_skills(job.id, vec![required("Go", 0, 1)])
            .await
            .unwrap();

        assert!(!store.delete_required_skill(9_999).await.unwrap());
        let job = store.get_job_opening(job.id).await.unwrap().unwrap();
        assert_eq!(job.skills_quantity, 1);
    }

    #[tokio::test]
    async fn test_adding_to_missing_parent_changes_nothing() {
        let store = MemoryStore::default();
        let err = store
            .add_required_skills(42, vec![required("Go", 0, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
        let err = store
            .add_candidate_skills(
                42,
                vec![CandidateSkillInput {
                    name: "Go".to_string(),
                    level: 0,
                    years_of_experience: 1,
                    last_used_year: 2024,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_matching_unknown_target_is_not_found() {
        let store = MemoryStore::default();
        let err = store
            .candidates_for_job(5, SortOrder::Lower, Page::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_renamed_required_skill_is_rescored() {
        let store = MemoryStore::default();
        let job = empty_job(&store).await;
        let added = store
            .add_required_skills(job.id, vec![required("docker", 0, 1)])
            .await
            .unwrap();
        let updated = store
            .update_required_skill(
                added[0].id,
                RequiredSkillPatch {
                    name: Some("Kubernetes".to_string()),
                    level: Some(2),
                    years_of_experience: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.normalized_name, "kubernetes");
        assert_eq!(updated.score, Some(3400));
        let job = store.get_job_opening(job.id).await.unwrap().unwrap();
        assert_eq!(job.skills_quantity, 1);
    }
}
