//! Demo dataset loaded into an empty database when `SEED_DEMO_DATA` is set.

use tracing::info;

use crate::models::{
    CandidateFields, CandidateSkillInput, JobOpeningFields, NewCandidate, NewJobOpening,
    RequiredSkillInput,
};
use crate::pagination::Page;
use crate::store::{StoreError, TalentStore};

/// (name, level, years_of_experience, last_used_year)
type SkillRow = (&'static str, i32, i32, i32);

struct DemoCandidate {
    first_name: &'static str,
    second_name: &'static str,
    age: i32,
    status: i32,
    city: &'static str,
    desired_position: &'static str,
    education_degree: i32,
    skills: &'static [SkillRow],
}

struct DemoJob {
    title: &'static str,
    salary: i32,
    /// (name, level, years_of_experience)
    skills: &'static [(&'static str, i32, i32)],
}

const CANDIDATES: &[DemoCandidate] = &[
    DemoCandidate {
        first_name: "Ilya",
        second_name: "Safronov",
        age: 28,
        status: 2,
        city: "Minsk",
        desired_position: "Developer",
        education_degree: 8,
        skills: &[
            ("Python", 2, 4, 2024),
            ("Php", 0, 1, 2024),
            ("Git", 1, 1, 2021),
            ("Docker", 2, 5, 2020),
            ("SQL", 1, 2, 2023),
        ],
    },
    DemoCandidate {
        first_name: "Masha",
        second_name: "Asipova",
        age: 18,
        status: 2,
        city: "Brest",
        desired_position: "Developer",
        education_degree: 8,
        skills: &[
            ("Ruby", 1, 4, 2024),
            ("Postgresql", 0, 2, 2024),
            ("MachineLearning", 1, 1, 2021),
            ("Docker", 2, 5, 2020),
            ("Java", 1, 2, 2023),
        ],
    },
    DemoCandidate {
        first_name: "Danya",
        second_name: "Mironov",
        age: 22,
        status: 3,
        city: "Vitebsk",
        desired_position: "Developer",
        education_degree: 4,
        skills: &[
            ("Python", 0, 1, 2024),
            ("Php", 2, 7, 2024),
            ("Java", 1, 4, 2021),
            ("Docker", 0, 1, 2020),
            ("SQL", 2, 4, 2023),
        ],
    },
    DemoCandidate {
        first_name: "Dasha",
        second_name: "Ageenko",
        age: 25,
        status: 1,
        city: "Minsk",
        desired_position: "Developer",
        education_degree: 8,
        skills: &[
            ("JavaScript", 2, 4, 2024),
            ("C++", 1, 3, 2024),
            ("C", 0, 1, 2021),
            ("Spring", 2, 5, 2020),
            ("SQL", 1, 2, 2023),
        ],
    },
    DemoCandidate {
        first_name: "Pasha",
        second_name: "Hatskevich",
        age: 22,
        status: 4,
        city: "Borisow",
        desired_position: "Developer",
        education_degree: 3,
        skills: &[
            ("Python", 2, 4, 2024),
            ("Django", 1, 2, 2024),
            ("FastAPI", 1, 1, 2021),
            ("Flask", 2, 5, 2020),
            ("SQL", 1, 2, 2023),
        ],
    },
    DemoCandidate {
        first_name: "Andrew",
        second_name: "Mironenko",
        age: 35,
        status: 2,
        city: "Minsk",
        desired_position: "Developer",
        education_degree: 8,
        skills: &[
            ("JavaScript", 2, 4, 2024),
            ("Node.js", 1, 2, 2024),
            ("Git", 2, 10, 2021),
            ("Docker", 2, 5, 2020),
            ("SQL", 2, 10, 2023),
        ],
    },
    DemoCandidate {
        first_name: "Egor",
        second_name: "Ermolovich",
        age: 19,
        status: 2,
        city: "Minsk",
        desired_position: "Game Developer",
        education_degree: 8,
        skills: &[
            ("C++", 2, 4, 2024),
            ("Php", 0, 1, 2024),
            ("Git", 1, 1, 2021),
            ("Docker", 2, 5, 2020),
            ("SQL", 1, 2, 2023),
        ],
    },
];

const JOB_OPENINGS: &[DemoJob] = &[
    DemoJob {
        title: "Django developer",
        salary: 1000,
        skills: &[("Python", 1, 1), ("Django", 1, 1)],
    },
    DemoJob {
        title: "Developer",
        salary: 2000,
        skills: &[("C++", 0, 1), ("Git", 1, 1)],
    },
    DemoJob {
        title: "Java developer",
        salary: 1000,
        skills: &[("Java", 1, 2), ("Docker", 0, 1)],
    },
    DemoJob {
        title: "Junior JavaScript developer",
        salary: 500,
        skills: &[("JavaScript", 0, 1), ("SQL", 0, 1)],
    },
    DemoJob {
        title: "Ruby developer",
        salary: 500,
        skills: &[("Ruby", 0, 1), ("SQL", 0, 1)],
    },
    DemoJob {
        title: "C developer",
        salary: 1000,
        skills: &[("C++", 1, 2), ("C", 0, 1)],
    },
    DemoJob {
        title: "Junior developer",
        salary: 1500,
        skills: &[("Python", 1, 2), ("Docker", 0, 1)],
    },
    DemoJob {
        title: "JavaScript developer",
        salary: 500,
        skills: &[("JavaScript", 1, 1), ("Node.js", 0, 1)],
    },
];

impl DemoCandidate {
    fn to_new(&self) -> NewCandidate {
        NewCandidate {
            fields: CandidateFields {
                first_name: self.first_name.to_string(),
                second_name: self.second_name.to_string(),
                age: self.age,
                status: self.status,
                city: self.city.to_string(),
                desired_position: self.desired_position.to_string(),
                education_degree: self.education_degree,
                working_experience: "blablabla".to_string(),
                about_oneself: "blablabla".to_string(),
                published: true,
            },
            skills: self
                .skills
                .iter()
                .map(|&(name, level, years, last_used)| CandidateSkillInput {
                    name: name.to_string(),
                    level,
                    years_of_experience: years,
                    last_used_year: last_used,
                })
                .collect(),
        }
    }
}

impl DemoJob {
    fn to_new(&self) -> NewJobOpening {
        NewJobOpening {
            fields: JobOpeningFields {
                title: self.title.to_string(),
                description: "blablabla".to_string(),
                address: "Minsk".to_string(),
                salary: self.salary,
            },
            skills: self
                .skills
                .iter()
                .map(|&(name, level, years)| RequiredSkillInput {
                    name: name.to_string(),
                    level,
                    years_of_experience: years,
                })
                .collect(),
        }
    }
}

/// Inserts the demo dataset unless either table already holds data.
/// Returns whether anything was written.
pub async fn seed_if_empty(store: &dyn TalentStore) -> Result<bool, StoreError> {
    let probe = Page { limit: 1, page: 0 };
    if !store.list_candidates(probe).await?.is_empty()
        || !store.list_job_openings(probe).await?.is_empty()
    {
        info!("Database already holds data, skipping demo seed");
        return Ok(false);
    }

    for candidate in CANDIDATES {
        store.create_candidate(candidate.to_new()).await?;
    }
    for job in JOB_OPENINGS {
        store.create_job_opening(job.to_new()).await?;
    }
    info!(
        "Seeded {} candidates and {} job openings",
        CANDIDATES.len(),
        JOB_OPENINGS.len()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::engine;
    use crate::pagination::SortOrder;
    use crate::store::MemoryStore;

    async fn job_id(store: &MemoryStore, title: &str) -> i64 {
        store
            .list_job_openings(Page::new(100, 0).unwrap())
            .await
            .unwrap()
            .into_iter()
            .find(|j| j.title == title)
            .map(|j| j.id)
            .unwrap()
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let store = MemoryStore::default();
        assert!(seed_if_empty(&store).await.unwrap());
        assert!(!seed_if_empty(&store).await.unwrap());

        let all = Page::new(100, 0).unwrap();
        assert_eq!(store.list_candidates(all).await.unwrap().len(), 7);
        let jobs = store.list_job_openings(all).await.unwrap();
        assert_eq!(jobs.len(), 8);
        assert!(jobs.iter().all(|j| j.skills_quantity == 2));
    }

    #[tokio::test]
    async fn test_django_developer_matches_only_pasha() {
        let store = MemoryStore::default();
        seed_if_empty(&store).await.unwrap();
        let job = job_id(&store, "Django developer").await;

        let matches =
            engine::candidates_for_job(&store, job, SortOrder::Upper, Page::default())
                .await
                .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].record.first_name, "Pasha");
        assert_eq!(matches[0].total_score, 7400);
    }

    #[tokio::test]
    async fn test_java_developer_ranks_by_recency_adjusted_scores() {
        let store = MemoryStore::default();
        seed_if_empty(&store).await.unwrap();
        let job = job_id(&store, "Java developer").await;

        let matches =
            engine::candidates_for_job(&store, job, SortOrder::Upper, Page::default())
                .await
                .unwrap();
        let ranked: Vec<(&str, i64)> = matches
            .iter()
            .map(|m| (m.record.first_name.as_str(), m.total_score))
            .collect();
        // Masha: Java 2800-30, Docker 5000-480. Danya: Java 3600-270, Docker 1400-466.
        assert_eq!(ranked, vec![("Masha", 7290), ("Danya", 4264)]);
    }
}
