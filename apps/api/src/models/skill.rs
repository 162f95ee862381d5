use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::matching::scoring::ScoringPolicy;

/// Lower-cased skill name used as the case-insensitive join key.
pub fn normalize_skill_name(name: &str) -> String {
    name.to_lowercase()
}

/// Read access shared by both skill variants so matching can treat them uniformly.
pub trait SkillRecord {
    fn normalized_name(&self) -> &str;
    fn level(&self) -> i32;
    fn years_of_experience(&self) -> i32;
    fn score(&self) -> Option<i32>;
}

// ────────────────────────────────────────────────────────────────────────────
// Stored rows
// ────────────────────────────────────────────────────────────────────────────

/// A row from `candidates_skills`. `foreign_key` is the owning candidate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CandidateSkill {
    pub id: i64,
    pub foreign_key: i64,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub normalized_name: String,
    pub level: i32,
    pub years_of_experience: i32,
    pub last_used_year: i32,
    pub score: Option<i32>,
}

/// A row from `required_skills`. `foreign_key` is the owning job opening id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RequiredSkill {
    pub id: i64,
    pub foreign_key: i64,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub normalized_name: String,
    pub level: i32,
    pub years_of_experience: i32,
    pub score: Option<i32>,
}

impl SkillRecord for CandidateSkill {
    fn normalized_name(&self) -> &str {
        &self.normalized_name
    }
    fn level(&self) -> i32 {
        self.level
    }
    fn years_of_experience(&self) -> i32 {
        self.years_of_experience
    }
    fn score(&self) -> Option<i32> {
        self.score
    }
}

impl SkillRecord for RequiredSkill {
    fn normalized_name(&self) -> &str {
        &self.normalized_name
    }
    fn level(&self) -> i32 {
        self.level
    }
    fn years_of_experience(&self) -> i32 {
        self.years_of_experience
    }
    fn score(&self) -> Option<i32> {
        self.score
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSkillInput {
    #[serde(alias = "skill_name")]
    pub name: String,
    pub level: i32,
    pub years_of_experience: i32,
    pub last_used_year: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateSkillPatch {
    #[serde(alias = "skill_name")]
    pub name: Option<String>,
    pub level: Option<i32>,
    pub years_of_experience: Option<i32>,
    pub last_used_year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredSkillInput {
    #[serde(alias = "skill_name")]
    pub name: String,
    pub level: i32,
    pub years_of_experience: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequiredSkillPatch {
    #[serde(alias = "skill_name")]
    pub name: Option<String>,
    pub level: Option<i32>,
    pub years_of_experience: Option<i32>,
}

impl From<CandidateSkillInput> for CandidateSkillPatch {
    fn from(input: CandidateSkillInput) -> Self {
        Self {
            name: Some(input.name),
            level: Some(input.level),
            years_of_experience: Some(input.years_of_experience),
            last_used_year: Some(input.last_used_year),
        }
    }
}

impl From<RequiredSkillInput> for RequiredSkillPatch {
    fn from(input: RequiredSkillInput) -> Self {
        Self {
            name: Some(input.name),
            level: Some(input.level),
            years_of_experience: Some(input.years_of_experience),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Insertable values with derived columns filled in
// ────────────────────────────────────────────────────────────────────────────

/// Candidate skill ready for insertion. Only constructed through
/// [`NewCandidateSkill::prepare`], which derives `normalized_name` and `score`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCandidateSkill {
    pub name: String,
    pub normalized_name: String,
    pub level: i32,
    pub years_of_experience: i32,
    pub last_used_year: i32,
    pub score: Option<i32>,
}

impl NewCandidateSkill {
    pub fn prepare(input: CandidateSkillInput, policy: &ScoringPolicy) -> Self {
        let score = policy.candidate_skill_score(
            input.level,
            input.years_of_experience,
            input.last_used_year,
        );
        Self {
            normalized_name: normalize_skill_name(&input.name),
            name: input.name,
            level: input.level,
            years_of_experience: input.years_of_experience,
            last_used_year: input.last_used_year,
            score,
        }
    }

    pub fn into_row(self, id: i64, foreign_key: i64) -> CandidateSkill {
        CandidateSkill {
            id,
            foreign_key,
            name: self.name,
            normalized_name: self.normalized_name,
            level: self.level,
            years_of_experience: self.years_of_experience,
            last_used_year: self.last_used_year,
            score: self.score,
        }
    }
}

/// Required skill ready for insertion, see [`NewCandidateSkill`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequiredSkill {
    pub name: String,
    pub normalized_name: String,
    pub level: i32,
    pub years_of_experience: i32,
    pub score: Option<i32>,
}

impl NewRequiredSkill {
    pub fn prepare(input: RequiredSkillInput, policy: &ScoringPolicy) -> Self {
        let score = policy.required_skill_score(input.level, input.years_of_experience);
        Self {
            normalized_name: normalize_skill_name(&input.name),
            name: input.name,
            level: input.level,
            years_of_experience: input.years_of_experience,
            score,
        }
    }

    pub fn into_row(self, id: i64, foreign_key: i64) -> RequiredSkill {
        RequiredSkill {
            id,
            foreign_key,
            name: self.name,
            normalized_name: self.normalized_name,
            level: self.level,
            years_of_experience: self.years_of_experience,
            score: self.score,
        }
    }
}

impl CandidateSkill {
    /// Applies a patch and re-derives `normalized_name` and `score` from the merged values.
    pub fn apply_patch(&mut self, patch: CandidateSkillPatch, policy: &ScoringPolicy) {
        if let Some(name) = patch.name {
            self.normalized_name = normalize_skill_name(&name);
            self.name = name;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(years) = patch.years_of_experience {
            self.years_of_experience = years;
        }
        if let Some(last_used_year) = patch.last_used_year {
            self.last_used_year = last_used_year;
        }
        self.score =
            policy.candidate_skill_score(self.level, self.years_of_experience, self.last_used_year);
    }
}

impl RequiredSkill {
    /// Applies a patch and re-derives `normalized_name` and `score` from the merged values.
    pub fn apply_patch(&mut self, patch: RequiredSkillPatch, policy: &ScoringPolicy) {
        if let Some(name) = patch.name {
            self.normalized_name = normalize_skill_name(&name);
            self.name = name;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(years) = patch.years_of_experience {
            self.years_of_experience = years;
        }
        self.score = policy.required_skill_score(self.level, self.years_of_experience);
    }
}
