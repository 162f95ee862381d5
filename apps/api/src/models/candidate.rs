use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::skill::{CandidateSkill, CandidateSkillInput};

/// A candidate aggregate. `skills` is loaded separately and never mapped from the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub age: i32,
    pub status: i32,
    pub city: String,
    pub desired_position: String,
    pub education_degree: i32,
    pub working_experience: String,
    pub about_oneself: String,
    pub published: bool,
    pub time_create: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub skills: Vec<CandidateSkill>,
}

/// Scalar candidate fields, used for creation and full replacement.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateFields {
    pub first_name: String,
    pub second_name: String,
    pub age: i32,
    pub status: i32,
    pub city: String,
    pub desired_position: String,
    pub education_degree: i32,
    pub working_experience: String,
    pub about_oneself: String,
    pub published: bool,
}

/// POST /api/v1/candidates body: scalar fields plus the initial skill batch.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCandidate {
    #[serde(flatten)]
    pub fields: CandidateFields,
    #[serde(default)]
    pub skills: Vec<CandidateSkillInput>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePatch {
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub age: Option<i32>,
    pub status: Option<i32>,
    pub city: Option<String>,
    pub desired_position: Option<String>,
    pub education_degree: Option<i32>,
    pub working_experience: Option<String>,
    pub about_oneself: Option<String>,
    pub published: Option<bool>,
}

impl From<CandidateFields> for CandidatePatch {
    fn from(fields: CandidateFields) -> Self {
        Self {
            first_name: Some(fields.first_name),
            second_name: Some(fields.second_name),
            age: Some(fields.age),
            status: Some(fields.status),
            city: Some(fields.city),
            desired_position: Some(fields.desired_position),
            education_degree: Some(fields.education_degree),
            working_experience: Some(fields.working_experience),
            about_oneself: Some(fields.about_oneself),
            published: Some(fields.published),
        }
    }
}

impl Candidate {
    pub fn apply_patch(&mut self, patch: CandidatePatch) {
        let CandidatePatch {
            first_name,
            second_name,
            age,
            status,
            city,
            desired_position,
            education_degree,
            working_experience,
            about_oneself,
            published,
        } = patch;
        if let Some(v) = first_name {
            self.first_name = v;
        }
        if let Some(v) = second_name {
            self.second_name = v;
        }
        if let Some(v) = age {
            self.age = v;
        }
        if let Some(v) = status {
            self.status = v;
        }
        if let Some(v) = city {
            self.city = v;
        }
        if let Some(v) = desired_position {
            self.desired_position = v;
        }
        if let Some(v) = education_degree {
            self.education_degree = v;
        }
        if let Some(v) = working_experience {
            self.working_experience = v;
        }
        if let Some(v) = about_oneself {
            self.about_oneself = v;
        }
        if let Some(v) = published {
            self.published = v;
        }
    }
}
