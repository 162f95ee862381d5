pub mod health;

use axum::{routing::get, Router};

use crate::candidates::handlers as candidates;
use crate::job_openings::handlers as job_openings;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidates
        .route(
            "/api/v1/candidates",
            get(candidates::handle_list_candidates).post(candidates::handle_create_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate)
                .put(candidates::handle_replace_candidate)
                .patch(candidates::handle_patch_candidate)
                .delete(candidates::handle_delete_candidate),
        )
        .route(
            "/api/v1/candidates/:id/skills",
            get(candidates::handle_list_candidate_skills)
                .post(candidates::handle_add_candidate_skills),
        )
        .route(
            "/api/v1/candidate-skills/:skill_id",
            get(candidates::handle_get_candidate_skill)
                .put(candidates::handle_replace_candidate_skill)
                .patch(candidates::handle_patch_candidate_skill)
                .delete(candidates::handle_delete_candidate_skill),
        )
        // Job openings
        .route(
            "/api/v1/job-openings",
            get(job_openings::handle_list_job_openings)
                .post(job_openings::handle_create_job_opening),
        )
        .route(
            "/api/v1/job-openings/:id",
            get(job_openings::handle_get_job_opening)
                .put(job_openings::handle_replace_job_opening)
                .patch(job_openings::handle_patch_job_opening)
                .delete(job_openings::handle_delete_job_opening),
        )
        .route(
            "/api/v1/job-openings/:id/skills",
            get(job_openings::handle_list_required_skills)
                .post(job_openings::handle_add_required_skills),
        )
        .route(
            "/api/v1/required-skills/:skill_id",
            get(job_openings::handle_get_required_skill)
                .put(job_openings::handle_replace_required_skill)
                .patch(job_openings::handle_patch_required_skill)
                .delete(job_openings::handle_delete_required_skill),
        )
        // Selection
        .route(
            "/api/v1/job-openings/:id/selection",
            get(matching::handle_select_candidates),
        )
        .route(
            "/api/v1/candidates/:id/selection",
            get(matching::handle_select_job_openings),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::cache::memory::MemoryCache;
    use crate::cache::NoCache;
    use crate::config::Config;
    use crate::store::MemoryStore;

    fn test_state() -> AppState {
        let config = Config::for_tests();
        AppState {
            store: Arc::new(MemoryStore::new(config.scoring)),
            cache: Arc::new(NoCache),
            config,
        }
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = build_router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    fn candidate_body(first_name: &str, skills: Value) -> Value {
        json!({
            "first_name": first_name,
            "second_name": "Tester",
            "age": 25,
            "status": 2,
            "city": "Minsk",
            "desired_position": "Developer",
            "education_degree": 8,
            "working_experience": "",
            "about_oneself": "",
            "published": true,
            "skills": skills
        })
    }

    fn job_body(title: &str, skills: Value) -> Value {
        json!({
            "title": title,
            "description": "",
            "address": "Minsk",
            "salary": 1000,
            "skills": skills
        })
    }

    /// Django developer job plus Ilya (Python only) and Pasha (Python + Django).
    /// Returns the job id and Pasha's id.
    async fn django_scenario(state: &AppState) -> (i64, i64) {
        let (status, job) = send(
            state,
            "POST",
            "/api/v1/job-openings",
            Some(job_body(
                "Django developer",
                json!([
                    {"name": "Python", "level": 1, "years_of_experience": 1},
                    {"name": "Django", "level": 1, "years_of_experience": 1}
                ]),
            )),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(job["skills_quantity"], 2);

        send(
            state,
            "POST",
            "/api/v1/candidates",
            Some(candidate_body(
                "Ilya",
                json!([
                    {"name": "Python", "level": 2, "years_of_experience": 4, "last_used_year": 2024},
                    {"name": "Flask", "level": 2, "years_of_experience": 5, "last_used_year": 2024}
                ]),
            )),
        )
        .await;
        let (_, pasha) = send(
            state,
            "POST",
            "/api/v1/candidates",
            Some(candidate_body(
                "Pasha",
                json!([
                    {"name": "Python", "level": 2, "years_of_experience": 4, "last_used_year": 2024},
                    {"name": "Django", "level": 1, "years_of_experience": 2, "last_used_year": 2024}
                ]),
            )),
        )
        .await;
        (job["id"].as_i64().unwrap(), pasha["id"].as_i64().unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&test_state(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_selection_returns_only_full_matches() {
        let state = test_state();
        let (job_id, _) = django_scenario(&state).await;

        let (status, body) = send(
            &state,
            "GET",
            &format!("/api/v1/job-openings/{job_id}/selection?sort=upper"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let matches = body.as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["first_name"], "Pasha");
        assert_eq!(matches[0]["total_score"], 7400);
        assert_eq!(matches[0]["skills"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reverse_selection_lists_jobs_for_candidate() {
        let state = test_state();
        let (job_id, pasha_id) = django_scenario(&state).await;
        let uri = format!("/api/v1/candidates/{pasha_id}/selection");
        let (status, body) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], job_id);
        assert_eq!(body[0]["total_score"], 4800);
    }

    #[tokio::test]
    async fn test_no_matches_and_missing_target_are_distinct() {
        let state = test_state();
        let (_, job) = send(
            &state,
            "POST",
            "/api/v1/job-openings",
            Some(job_body(
                "Haskell developer",
                json!([{"name": "Haskell", "level": 2, "years_of_experience": 5}]),
            )),
        )
        .await;

        let uri = format!("/api/v1/job-openings/{}/selection", job["id"]);
        let (status, body) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NO_MATCHES");

        let (status, body) = send(&state, "GET", "/api/v1/job-openings/99/selection", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_parameters_are_rejected_before_querying() {
        let state = test_state();
        let (status, _) = send(&state, "GET", "/api/v1/job-openings/0/selection", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &state,
            "GET",
            "/api/v1/job-openings/1/selection?limit=0",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &state,
            "GET",
            "/api/v1/job-openings/1/selection?sort=sideways",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(&state, "GET", "/api/v1/job-openings/abc/selection", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_ids_get_the_json_error_body() {
        let state = test_state();
        for uri in [
            "/api/v1/candidates/abc",
            "/api/v1/candidates/1.5/skills",
            "/api/v1/required-skills/x",
            "/api/v1/candidates/abc/selection",
        ] {
            let (status, body) = send(&state, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{uri}");
        }

        let (status, body) = send(&state, "GET", "/api/v1/candidates?limit=many", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_pagination_over_selection() {
        let state = test_state();
        let (job_id, _) = django_scenario(&state).await;
        send(
            &state,
            "POST",
            "/api/v1/candidates",
            Some(candidate_body(
                "Dasha",
                json!([
                    {"name": "python", "level": 1, "years_of_experience": 1, "last_used_year": 2024},
                    {"name": "DJANGO", "level": 1, "years_of_experience": 1, "last_used_year": 2024}
                ]),
            )),
        )
        .await;

        let uri = format!("/api/v1/job-openings/{job_id}/selection?sort=upper&limit=1&page=1");
        let (status, body) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["first_name"], "Dasha");
        assert_eq!(body[0]["total_score"], 4800);
    }

    #[tokio::test]
    async fn test_legacy_sorting_from_parameter() {
        let state = test_state();
        let (job_id, _) = django_scenario(&state).await;
        send(
            &state,
            "POST",
            "/api/v1/candidates",
            Some(candidate_body(
                "Dasha",
                json!([
                    {"skill_name": "Python", "level": 1, "years_of_experience": 1, "last_used_year": 2024},
                    {"skill_name": "Django", "level": 1, "years_of_experience": 1, "last_used_year": 2024}
                ]),
            )),
        )
        .await;

        let uri = format!("/api/v1/job-openings/{job_id}/selection?sorting_from=lower");
        let (status, body) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["first_name"], "Dasha");
        assert_eq!(body[1]["first_name"], "Pasha");
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_found() {
        let (status, body) = send(&test_state(), "GET", "/api/v1/candidates", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"]["message"],
            "at this moment there are no objects in database"
        );
    }

    #[tokio::test]
    async fn test_candidate_crud_round() {
        let state = test_state();
        let (status, created) = send(
            &state,
            "POST",
            "/api/v1/candidates",
            Some(candidate_body("Masha", json!([]))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/v1/candidates/{}", created["id"]);

        let (status, patched) = send(&state, "PATCH", &uri, Some(json!({"city": "Brest"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["city"], "Brest");
        assert_eq!(patched["first_name"], "Masha");

        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_required_skill_writes_keep_quantity_in_step() {
        let state = test_state();
        let (_, job) = send(
            &state,
            "POST",
            "/api/v1/job-openings",
            Some(job_body("Backend", json!([]))),
        )
        .await;
        let job_uri = format!("/api/v1/job-openings/{}", job["id"]);
        assert_eq!(job["skills_quantity"], 0);

        let (status, added) = send(
            &state,
            "POST",
            &format!("{job_uri}/skills"),
            Some(json!([
                {"name": "Rust", "level": 1, "years_of_experience": 2},
                {"name": "Tokio", "level": 0, "years_of_experience": 1},
                {"name": "SQL", "level": 0, "years_of_experience": 1}
            ])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(added.as_array().unwrap().len(), 3);
        let (_, job) = send(&state, "GET", &job_uri, None).await;
        assert_eq!(job["skills_quantity"], 3);

        let skill_uri = format!("/api/v1/required-skills/{}", added[0]["id"]);
        let (status, _) = send(&state, "DELETE", &skill_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "DELETE", &skill_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, job) = send(&state, "GET", &job_uri, None).await;
        assert_eq!(job["skills_quantity"], 2);
    }

    #[tokio::test]
    async fn test_skill_batch_validation() {
        let state = test_state();
        let (status, body) = send(
            &state,
            "POST",
            "/api/v1/job-openings/7/skills",
            Some(json!([{"name": "Go", "level": 0, "years_of_experience": 1}])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_REFERENCE");

        let (status, body) = send(&state, "POST", "/api/v1/candidates/7/skills", Some(json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_skill_put_rederives_score() {
        let state = test_state();
        let (_, candidate) = send(
            &state,
            "POST",
            "/api/v1/candidates",
            Some(candidate_body(
                "Egor",
                json!([{"name": "c++", "level": 0, "years_of_experience": 1, "last_used_year": 2024}]),
            )),
        )
        .await;
        let skill_uri = format!("/api/v1/candidate-skills/{}", candidate["skills"][0]["id"]);
        let (status, _) = send(
            &state,
            "PUT",
            &skill_uri,
            Some(json!({"name": "C++", "level": 2, "years_of_experience": 4, "last_used_year": 2024})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, skill) = send(&state, "GET", &skill_uri, None).await;
        assert_eq!(skill["name"], "C++");
        assert_eq!(skill["score"], 4600);
        assert!(skill.get("normalized_name").is_none());
    }

    #[tokio::test]
    async fn test_selection_is_served_from_cache_within_ttl() {
        let config = Config::for_tests();
        let cache = Arc::new(MemoryCache::default());
        let state = AppState {
            store: Arc::new(MemoryStore::new(config.scoring)),
            cache: cache.clone(),
            config,
        };
        let (job_id, _) = django_scenario(&state).await;
        let uri = format!("/api/v1/job-openings/{job_id}/selection");
        let (status, first) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        // A new qualifying candidate is not visible until the entry expires.
        send(
            &state,
            "POST",
            "/api/v1/candidates",
            Some(candidate_body(
                "Dasha",
                json!([
                    {"name": "Python", "level": 1, "years_of_experience": 1, "last_used_year": 2024},
                    {"name": "Django", "level": 1, "years_of_experience": 1, "last_used_year": 2024}
                ]),
            )),
        )
        .await;
        let (_, second) = send(&state, "GET", &uri, None).await;
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }
}
