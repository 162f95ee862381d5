//! Matching engine: ranks counterpart records against a target's skill requirements.
//!
//! A candidate qualifies for a job opening only when the number of
//! (candidate skill, required skill) pairs that meet the requirement equals the
//! job's `skills_quantity`. Pairs join on `normalized_name` and require
//! `level >= required.level` and `years >= required.years`; `last_used_year`
//! only affects the score. Duplicate names are not collapsed, so each joined
//! pair counts once towards both the gate and the score.
//!
//! The store evaluates this rule in SQL; [`rank`] is the same rule over loaded
//! aggregates and backs the in-memory store.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::{Candidate, CandidateSkill, JobOpening, RequiredSkill, SkillRecord};
use crate::pagination::{Page, SortOrder};
use crate::store::TalentStore;

// ────────────────────────────────────────────────────────────────────────────
// Aggregate traits
// ────────────────────────────────────────────────────────────────────────────

pub trait HasSkills {
    type Skill: SkillRecord;
    fn skills(&self) -> &[Self::Skill];
}

/// An aggregate that can be ranked against its counterpart type.
pub trait Matchable: HasSkills {
    type Counterpart: Matchable<Counterpart = Self>;

    fn id(&self) -> i64;

    /// Total score this record earns against `target`, or `None` when it fails
    /// the exact-match gate.
    fn fitness_against(&self, target: &Self::Counterpart) -> Option<i64>;
}

impl HasSkills for Candidate {
    type Skill = CandidateSkill;
    fn skills(&self) -> &[CandidateSkill] {
        &self.skills
    }
}

impl HasSkills for JobOpening {
    type Skill = RequiredSkill;
    fn skills(&self) -> &[RequiredSkill] {
        &self.skills
    }
}

impl Matchable for Candidate {
    type Counterpart = JobOpening;

    fn id(&self) -> i64 {
        self.id
    }

    /// Candidates are ranked by the sum of their own matched skill scores.
    fn fitness_against(&self, job: &JobOpening) -> Option<i64> {
        let tally = tally_pairs(self.skills(), job.skills());
        (tally.matched == i64::from(job.skills_quantity)).then_some(tally.offered_score)
    }
}

impl Matchable for JobOpening {
    type Counterpart = Candidate;

    fn id(&self) -> i64 {
        self.id
    }

    /// Job openings are ranked by the sum of their matched required skill scores.
    fn fitness_against(&self, candidate: &Candidate) -> Option<i64> {
        let tally = tally_pairs(candidate.skills(), self.skills());
        (tally.matched == i64::from(self.skills_quantity)).then_some(tally.required_score)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pair evaluation
// ────────────────────────────────────────────────────────────────────────────

/// Aggregate over every qualifying (offered, required) skill pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairTally {
    pub matched: i64,
    pub offered_score: i64,
    pub required_score: i64,
}

/// Whether an offered skill meets a requirement.
pub fn satisfies<O: SkillRecord, R: SkillRecord>(offered: &O, required: &R) -> bool {
    offered.normalized_name() == required.normalized_name()
        && offered.level() >= required.level()
        && offered.years_of_experience() >= required.years_of_experience()
}

pub fn tally_pairs<O: SkillRecord, R: SkillRecord>(offered: &[O], required: &[R]) -> PairTally {
    let mut tally = PairTally::default();
    for req in required {
        for skill in offered.iter().filter(|s| satisfies(*s, req)) {
            tally.matched += 1;
            // Unscorable skills count towards the gate but add nothing, like SQL SUM over NULL.
            tally.offered_score += skill.score().map(i64::from).unwrap_or(0);
            tally.required_score += req.score().map(i64::from).unwrap_or(0);
        }
    }
    tally
}

// ────────────────────────────────────────────────────────────────────────────
// Ranking
// ────────────────────────────────────────────────────────────────────────────

/// A matched record with the score it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub record: T,
    pub total_score: i64,
}

/// Orders by total score in the requested direction, then by id so pages are stable.
pub fn compare_ranked(order: SortOrder, a: (i64, i64), b: (i64, i64)) -> Ordering {
    let (a_score, a_id) = a;
    let (b_score, b_id) = b;
    let by_score = match order {
        SortOrder::Lower => a_score.cmp(&b_score),
        SortOrder::Upper => b_score.cmp(&a_score),
    };
    by_score.then(a_id.cmp(&b_id))
}

/// Filters `pool` through the exact-match gate against `target`, orders and paginates it.
pub fn rank<M, I>(target: &M::Counterpart, pool: I, order: SortOrder, page: Page) -> Vec<Ranked<M>>
where
    M: Matchable,
    I: IntoIterator<Item = M>,
{
    let mut ranked: Vec<Ranked<M>> = pool
        .into_iter()
        .filter_map(|record| {
            record
                .fitness_against(target)
                .map(|total_score| Ranked {
                    record,
                    total_score,
                })
        })
        .collect();
    ranked.sort_by(|a, b| {
        compare_ranked(
            order,
            (a.total_score, a.record.id()),
            (b.total_score, b.record.id()),
        )
    });
    page.apply(ranked)
}

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDirection {
    CandidatesForJob,
    JobsForCandidate,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchRequest {
    pub target_id: i64,
    pub direction: MatchDirection,
    pub order: SortOrder,
    pub page: Page,
}

/// Untagged so each direction serializes as a plain list of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchResults {
    Candidates(Vec<Ranked<Candidate>>),
    JobOpenings(Vec<Ranked<JobOpening>>),
}

pub async fn find_matches(
    store: &dyn TalentStore,
    request: MatchRequest,
) -> Result<MatchResults, AppError> {
    let MatchRequest {
        target_id,
        direction,
        order,
        page,
    } = request;
    match direction {
        MatchDirection::CandidatesForJob => {
            candidates_for_job(store, target_id, order, page)
                .await
                .map(MatchResults::Candidates)
        }
        MatchDirection::JobsForCandidate => {
            jobs_for_candidate(store, target_id, order, page)
                .await
                .map(MatchResults::JobOpenings)
        }
    }
}

#[instrument(skip(store))]
pub async fn candidates_for_job(
    store: &dyn TalentStore,
    job_id: i64,
    order: SortOrder,
    page: Page,
) -> Result<Vec<Ranked<Candidate>>, AppError> {
    let matches = store.candidates_for_job(job_id, order, page).await?;
    info!("{} candidate(s) qualify for job opening {job_id}", matches.len());
    if matches.is_empty() {
        return Err(no_matches());
    }
    Ok(matches)
}

#[instrument(skip(store))]
pub async fn jobs_for_candidate(
    store: &dyn TalentStore,
    candidate_id: i64,
    order: SortOrder,
    page: Page,
) -> Result<Vec<Ranked<JobOpening>>, AppError> {
    let matches = store.jobs_for_candidate(candidate_id, order, page).await?;
    info!("{} job opening(s) fit candidate {candidate_id}", matches.len());
    if matches.is_empty() {
        return Err(no_matches());
    }
    Ok(matches)
}

fn no_matches() -> AppError {
    AppError::NoMatches(
        "at this moment there are no relevant objects according to these conditions".to_string(),
    )
}
