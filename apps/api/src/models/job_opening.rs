use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::skill::{RequiredSkill, RequiredSkillInput};

/// A job opening aggregate.
///
/// `skills_quantity` always equals the number of owned required skills; it is
/// adjusted in the same transaction as every skill insert or delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobOpening {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub address: String,
    pub salary: i32,
    pub skills_quantity: i32,
    pub time_create: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub skills: Vec<RequiredSkill>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobOpeningFields {
    pub title: String,
    pub description: String,
    pub address: String,
    pub salary: i32,
}

/// POST /api/v1/job-openings body. `skills_quantity` is derived, never accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewJobOpening {
    #[serde(flatten)]
    pub fields: JobOpeningFields,
    #[serde(default)]
    pub skills: Vec<RequiredSkillInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobOpeningPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub salary: Option<i32>,
}

impl From<JobOpeningFields> for JobOpeningPatch {
    fn from(fields: JobOpeningFields) -> Self {
        Self {
            title: Some(fields.title),
            description: Some(fields.description),
            address: Some(fields.address),
            salary: Some(fields.salary),
        }
    }
}

impl JobOpening {
    pub fn apply_patch(&mut self, patch: JobOpeningPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(salary) = patch.salary {
            self.salary = salary;
        }
    }
}
