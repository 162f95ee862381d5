use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, info};

use super::{StoreError, TalentStore};
use crate::matching::engine::Ranked;
use crate::matching::scoring::ScoringPolicy;
use crate::models::{
    Candidate, CandidatePatch, CandidateSkill, CandidateSkillInput, CandidateSkillPatch,
    JobOpening, JobOpeningPatch, NewCandidate, NewCandidateSkill, NewJobOpening,
    NewRequiredSkill, RequiredSkill, RequiredSkillInput, RequiredSkillPatch,
};
use crate::pagination::{Page, SortOrder};

/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Candidates whose qualifying skill pairs against job `$1` number exactly the
/// job's `skills_quantity`. The LEFT JOIN keeps candidates with no pairs, so a
/// job without requirements is matched by everyone.
const CANDIDATES_FOR_JOB_SQL: &str = r#"
    WITH matched AS (
        SELECT cs.foreign_key AS candidate_id,
               COUNT(*) AS matched_skills,
               SUM(cs.score) AS total_score
        FROM candidates_skills cs
        JOIN required_skills rs ON rs.normalized_name = cs.normalized_name
        WHERE rs.foreign_key = $1
          AND cs.level >= rs.level
          AND cs.years_of_experience >= rs.years_of_experience
        GROUP BY cs.foreign_key
    )
    SELECT c.id, COALESCE(m.total_score, 0)::BIGINT AS total_score
    FROM candidates c
    LEFT JOIN matched m ON m.candidate_id = c.id
    WHERE COALESCE(m.matched_skills, 0) =
          (SELECT skills_quantity FROM job_openings WHERE id = $1)
    ORDER BY total_score {order}, c.id ASC
    LIMIT $2 OFFSET $3
"#;

/// Job openings whose every required skill candidate `$1` satisfies, ranked by
/// the summed score of the required skills.
const JOBS_FOR_CANDIDATE_SQL: &str = r#"
    WITH matched AS (
        SELECT rs.foreign_key AS job_id,
               COUNT(*) AS matched_skills,
               SUM(rs.score) AS total_score
        FROM required_skills rs
        JOIN candidates_skills cs ON cs.normalized_name = rs.normalized_name
        WHERE cs.foreign_key = $1
          AND cs.level >= rs.level
          AND cs.years_of_experience >= rs.years_of_experience
        GROUP BY rs.foreign_key
    )
    SELECT j.id, COALESCE(m.total_score, 0)::BIGINT AS total_score
    FROM job_openings j
    LEFT JOIN matched m ON m.job_id = j.id
    WHERE COALESCE(m.matched_skills, 0) = j.skills_quantity
    ORDER BY total_score {order}, j.id ASC
    LIMIT $2 OFFSET $3
"#;

/// PostgreSQL-backed [`TalentStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    policy: ScoringPolicy,
}

impl PgStore {
    pub fn new(pool: PgPool, policy: ScoringPolicy) -> Self {
        Self { pool, policy }
    }

    async fn attach_candidate_skills(
        &self,
        mut candidates: Vec<Candidate>,
    ) -> Result<Vec<Candidate>, StoreError> {
        let ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();
        let mut by_owner = group_by_owner(
            sqlx::query_as::<_, CandidateSkill>(
                "SELECT * FROM candidates_skills WHERE foreign_key = ANY($1) ORDER BY id",
            )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?,
            |s| s.foreign_key,
        );
        for candidate in &mut candidates {
            candidate.skills = by_owner.remove(&candidate.id).unwrap_or_default();
        }
        Ok(candidates)
    }

    async fn attach_required_skills(
        &self,
        mut jobs: Vec<JobOpening>,
    ) -> Result<Vec<JobOpening>, StoreError> {
        let ids: Vec<i64> = jobs.iter().map(|j| j.id).collect();
        let mut by_owner = group_by_owner(
            sqlx::query_as::<_, RequiredSkill>(
                "SELECT * FROM required_skills WHERE foreign_key = ANY($1) ORDER BY id",
            )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?,
            |s| s.foreign_key,
        );
        for job in &mut jobs {
            job.skills = by_owner.remove(&job.id).unwrap_or_default();
        }
        Ok(jobs)
    }

    /// Loads full candidate aggregates for `ranking`, preserving its order.
    async fn load_ranked_candidates(
        &self,
        ranking: Vec<(i64, i64)>,
    ) -> Result<Vec<Ranked<Candidate>>, StoreError> {
        let ids: Vec<i64> = ranking.iter().map(|(id, _)| *id).collect();
        let rows = sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let mut by_id: HashMap<i64, Candidate> = self
            .attach_candidate_skills(rows)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        Ok(ranking
            .into_iter()
            .filter_map(|(id, total_score)| {
                by_id.remove(&id).map(|record| Ranked {
                    record,
                    total_score,
                })
            })
            .collect())
    }

    async fn load_ranked_jobs(
        &self,
        ranking: Vec<(i64, i64)>,
    ) -> Result<Vec<Ranked<JobOpening>>, StoreError> {
        let ids: Vec<i64> = ranking.iter().map(|(id, _)| *id).collect();
        let rows = sqlx::query_as::<_, JobOpening>("SELECT * FROM job_openings WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let mut by_id: HashMap<i64, JobOpening> = self
            .attach_required_skills(rows)
            .await?
            .into_iter()
            .map(|j| (j.id, j))
            .collect();
        Ok(ranking
            .into_iter()
            .filter_map(|(id, total_score)| {
                by_id.remove(&id).map(|record| Ranked {
                    record,
                    total_score,
                })
            })
            .collect())
    }

    async fn exists(&self, table: Table, id: i64) -> Result<bool, StoreError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table.name());
        Ok(sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }
}

#[derive(Debug, Clone, Copy)]
enum Table {
    Candidates,
    JobOpenings,
}

impl Table {
    fn name(&self) -> &'static str {
        match self {
            Table::Candidates => "candidates",
            Table::JobOpenings => "job_openings",
        }
    }
}

fn group_by_owner<T>(rows: Vec<T>, owner: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(owner(&row)).or_default().push(row);
    }
    grouped
}

/// Translates a foreign-key violation into `InvalidReference`; anything else stays a database error.
fn reference_error(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return StoreError::InvalidReference(what());
        }
    }
    StoreError::Database(err)
}

async fn insert_candidate_skills(
    tx: &mut Transaction<'_, Postgres>,
    candidate_id: i64,
    skills: Vec<NewCandidateSkill>,
) -> Result<Vec<CandidateSkill>, sqlx::Error> {
    if skills.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO candidates_skills \
         (foreign_key, name, normalized_name, level, years_of_experience, last_used_year, score) ",
    );
    builder.push_values(skills, |mut row, skill| {
        row.push_bind(candidate_id)
            .push_bind(skill.name)
            .push_bind(skill.normalized_name)
            .push_bind(skill.level)
            .push_bind(skill.years_of_experience)
            .push_bind(skill.last_used_year)
            .push_bind(skill.score);
    });
    builder.push(" RETURNING *");
    builder
        .build_query_as::<CandidateSkill>()
        .fetch_all(&mut **tx)
        .await
}

async fn insert_required_skills(
    tx: &mut Transaction<'_, Postgres>,
    job_id: i64,
    skills: Vec<NewRequiredSkill>,
) -> Result<Vec<RequiredSkill>, sqlx::Error> {
    if skills.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO required_skills \
         (foreign_key, name, normalized_name, level, years_of_experience, score) ",
    );
    builder.push_values(skills, |mut row, skill| {
        row.push_bind(job_id)
            .push_bind(skill.name)
            .push_bind(skill.normalized_name)
            .push_bind(skill.level)
            .push_bind(skill.years_of_experience)
            .push_bind(skill.score);
    });
    builder.push(" RETURNING *");
    builder
        .build_query_as::<RequiredSkill>()
        .fetch_all(&mut **tx)
        .await
}

#[async_trait]
impl TalentStore for PgStore {
    // ── Candidates ──────────────────────────────────────────────────────────

    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let NewCandidate { fields, skills } = candidate;
        let skills: Vec<NewCandidateSkill> = skills
            .into_iter()
            .map(|s| NewCandidateSkill::prepare(s, &self.policy))
            .collect();

        let mut tx = self.pool.begin().await?;
        let mut created: Candidate = sqlx::query_as(
            r#"
            INSERT INTO candidates
                (first_name, second_name, age, status, city, desired_position,
                 education_degree, working_experience, about_oneself, published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&fields.first_name)
        .bind(&fields.second_name)
        .bind(fields.age)
        .bind(fields.status)
        .bind(&fields.city)
        .bind(&fields.desired_position)
        .bind(fields.education_degree)
        .bind(&fields.working_experience)
        .bind(&fields.about_oneself)
        .bind(fields.published)
        .fetch_one(&mut *tx)
        .await?;
        created.skills = insert_candidate_skills(&mut tx, created.id, skills).await?;
        tx.commit().await?;

        info!(
            "Created candidate {} with {} skill(s)",
            created.id,
            created.skills.len()
        );
        Ok(created)
    }

    async fn get_candidate(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let row: Option<Candidate> = sqlx::query_as("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(candidate) => Ok(self.attach_candidate_skills(vec![candidate]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_candidates(&self, page: Page) -> Result<Vec<Candidate>, StoreError> {
        let rows: Vec<Candidate> =
            sqlx::query_as("SELECT * FROM candidates ORDER BY id LIMIT $1 OFFSET $2")
                .bind(page.limit)
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?;
        self.attach_candidate_skills(rows).await
    }

    async fn update_candidate(
        &self,
        id: i64,
        patch: CandidatePatch,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let current: Option<Candidate> =
            sqlx::query_as("SELECT * FROM candidates WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(mut candidate) = current else {
            return Ok(None);
        };
        candidate.apply_patch(patch);
        sqlx::query(
            r#"
            UPDATE candidates SET
                first_name = $2, second_name = $3, age = $4, status = $5, city = $6,
                desired_position = $7, education_degree = $8, working_experience = $9,
                about_oneself = $10, published = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&candidate.first_name)
        .bind(&candidate.second_name)
        .bind(candidate.age)
        .bind(candidate.status)
        .bind(&candidate.city)
        .bind(&candidate.desired_position)
        .bind(candidate.education_degree)
        .bind(&candidate.working_experience)
        .bind(&candidate.about_oneself)
        .bind(candidate.published)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(self.attach_candidate_skills(vec![candidate]).await?.pop())
    }

    async fn delete_candidate(&self, id: i64) -> Result<bool, StoreError> {
        // Skills go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Candidate skills ────────────────────────────────────────────────────

    async fn add_candidate_skills(
        &self,
        candidate_id: i64,
        skills: Vec<CandidateSkillInput>,
    ) -> Result<Vec<CandidateSkill>, StoreError> {
        let skills: Vec<NewCandidateSkill> = skills
            .into_iter()
            .map(|s| NewCandidateSkill::prepare(s, &self.policy))
            .collect();

        let mut tx = self.pool.begin().await?;
        let inserted = insert_candidate_skills(&mut tx, candidate_id, skills)
            .await
            .map_err(|e| reference_error(e, || format!("candidate {candidate_id}")))?;
        tx.commit().await?;

        debug!(
            "Added {} skill(s) to candidate {candidate_id}",
            inserted.len()
        );
        Ok(inserted)
    }

    async fn list_candidate_skills(
        &self,
        candidate_id: i64,
    ) -> Result<Vec<CandidateSkill>, StoreError> {
        Ok(sqlx::query_as::<_, CandidateSkill>(
            "SELECT * FROM candidates_skills WHERE foreign_key = $1 ORDER BY id",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_candidate_skill(
        &self,
        skill_id: i64,
    ) -> Result<Option<CandidateSkill>, StoreError> {
        Ok(
            sqlx::query_as::<_, CandidateSkill>("SELECT * FROM candidates_skills WHERE id = $1")
                .bind(skill_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_candidate_skill(
        &self,
        skill_id: i64,
        patch: CandidateSkillPatch,
    ) -> Result<Option<CandidateSkill>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let current: Option<CandidateSkill> =
            sqlx::query_as("SELECT * FROM candidates_skills WHERE id = $1 FOR UPDATE")
                .bind(skill_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(mut skill) = current else {
            return Ok(None);
        };
        skill.apply_patch(patch, &self.policy);
        sqlx::query(
            r#"
            UPDATE candidates_skills SET
                name = $2, normalized_name = $3, level = $4,
                years_of_experience = $5, last_used_year = $6, score = $7
            WHERE id = $1
            "#,
        )
        .bind(skill_id)
        .bind(&skill.name)
        .bind(&skill.normalized_name)
        .bind(skill.level)
        .bind(skill.years_of_experience)
        .bind(skill.last_used_year)
        .bind(skill.score)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(skill))
    }

    async fn delete_candidate_skill(&self, skill_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM candidates_skills WHERE id = $1")
            .bind(skill_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Job openings ────────────────────────────────────────────────────────

    async fn create_job_opening(&self, job: NewJobOpening) -> Result<JobOpening, StoreError> {
        let NewJobOpening { fields, skills } = job;
        let skills: Vec<NewRequiredSkill> = skills
            .into_iter()
            .map(|s| NewRequiredSkill::prepare(s, &self.policy))
            .collect();
        let skills_quantity = i32::try_from(skills.len()).unwrap_or(i32::MAX);

        let mut tx = self.pool.begin().await?;
        let mut created: JobOpening = sqlx::query_as(
            r#"
            INSERT INTO job_openings (title, description, address, salary, skills_quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.address)
        .bind(fields.salary)
        .bind(skills_quantity)
        .fetch_one(&mut *tx)
        .await?;
        created.skills = insert_required_skills(&mut tx, created.id, skills).await?;
        tx.commit().await?;

        info!(
            "Created job opening {} requiring {} skill(s)",
            created.id, created.skills_quantity
        );
        Ok(created)
    }

    async fn get_job_opening(&self, id: i64) -> Result<Option<JobOpening>, StoreError> {
        let row: Option<JobOpening> = sqlx::query_as("SELECT * FROM job_openings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(job) => Ok(self.attach_required_skills(vec![job]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_job_openings(&self, page: Page) -> Result<Vec<JobOpening>, StoreError> {
        let rows: Vec<JobOpening> =
            sqlx::query_as("SELECT * FROM job_openings ORDER BY id LIMIT $1 OFFSET $2")
                .bind(page.limit)
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?;
        self.attach_required_skills(rows).await
    }

    async fn update_job_opening(
        &self,
        id: i64,
        patch: JobOpeningPatch,
    ) -> Result<Option<JobOpening>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let current: Option<JobOpening> =
            sqlx::query_as("SELECT * FROM job_openings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(mut job) = current else {
            return Ok(None);
        };
        job.apply_patch(patch);
        // skills_quantity is owned by the skill write paths and never set here.
        sqlx::query(
            "UPDATE job_openings SET title = $2, description = $3, address = $4, salary = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.address)
        .bind(job.salary)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(self.attach_required_skills(vec![job]).await?.pop())
    }

    async fn delete_job_opening(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM job_openings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Required skills ─────────────────────────────────────────────────────

    async fn add_required_skills(
        &self,
        job_id: i64,
        skills: Vec<RequiredSkillInput>,
    ) -> Result<Vec<RequiredSkill>, StoreError> {
        let skills: Vec<NewRequiredSkill> = skills
            .into_iter()
            .map(|s| NewRequiredSkill::prepare(s, &self.policy))
            .collect();

        let mut tx = self.pool.begin().await?;
        let inserted = insert_required_skills(&mut tx, job_id, skills)
            .await
            .map_err(|e| reference_error(e, || format!("job opening {job_id}")))?;
        let added = i32::try_from(inserted.len()).unwrap_or(i32::MAX);
        // Atomic column update so concurrent adds to the same job never lose an increment.
        sqlx::query(
            "UPDATE job_openings SET skills_quantity = skills_quantity + $1 WHERE id = $2",
        )
        .bind(added)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!("Added {added} required skill(s) to job opening {job_id}");
        Ok(inserted)
    }

    async fn list_required_skills(&self, job_id: i64) -> Result<Vec<RequiredSkill>, StoreError> {
        Ok(sqlx::query_as::<_, RequiredSkill>(
            "SELECT * FROM required_skills WHERE foreign_key = $1 ORDER BY id",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_required_skill(
        &self,
        skill_id: i64,
    ) -> Result<Option<RequiredSkill>, StoreError> {
        Ok(
            sqlx::query_as::<_, RequiredSkill>("SELECT * FROM required_skills WHERE id = $1")
                .bind(skill_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_required_skill(
        &self,
        skill_id: i64,
        patch: RequiredSkillPatch,
    ) -> Result<Option<RequiredSkill>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let current: Option<RequiredSkill> =
            sqlx::query_as("SELECT * FROM required_skills WHERE id = $1 FOR UPDATE")
                .bind(skill_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(mut skill) = current else {
            return Ok(None);
        };
        skill.apply_patch(patch, &self.policy);
        sqlx::query(
            r#"
            UPDATE required_skills SET
                name = $2, normalized_name = $3, level = $4,
                years_of_experience = $5, score = $6
            WHERE id = $1
            "#,
        )
        .bind(skill_id)
        .bind(&skill.name)
        .bind(&skill.normalized_name)
        .bind(skill.level)
        .bind(skill.years_of_experience)
        .bind(skill.score)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(skill))
    }

    async fn delete_required_skill(&self, skill_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let owner: Option<i64> =
            sqlx::query_scalar("DELETE FROM required_skills WHERE id = $1 RETURNING foreign_key")
                .bind(skill_id)
                .fetch_optional(&mut *tx)
                .await?;
        // No row, no decrement.
        let Some(job_id) = owner else {
            return Ok(false);
        };
        sqlx::query("UPDATE job_openings SET skills_quantity = skills_quantity - 1 WHERE id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!("Removed required skill {skill_id} from job opening {job_id}");
        Ok(true)
    }

    // ── Matching ────────────────────────────────────────────────────────────

    async fn candidates_for_job(
        &self,
        job_id: i64,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Ranked<Candidate>>, StoreError> {
        if !self.exists(Table::JobOpenings, job_id).await? {
            return Err(StoreError::NotFound(format!("job opening {job_id}")));
        }
        let sql = CANDIDATES_FOR_JOB_SQL.replace("{order}", order.sql_keyword());
        let ranking: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .bind(job_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        self.load_ranked_candidates(ranking).await
    }

    async fn jobs_for_candidate(
        &self,
        candidate_id: i64,
        order: SortOrder,
        page: Page,
    ) -> Result<Vec<Ranked<JobOpening>>, StoreError> {
        if !self.exists(Table::Candidates, candidate_id).await? {
            return Err(StoreError::NotFound(format!("candidate {candidate_id}")));
        }
        let sql = JOBS_FOR_CANDIDATE_SQL.replace("{order}", order.sql_keyword());
        let ranking: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .bind(candidate_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        self.load_ranked_jobs(ranking).await
    }
}
