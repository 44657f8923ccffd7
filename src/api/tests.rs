//! Full-flow tests against a live Postgres. They skip when no database
//! coordinates are provided in the environment.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use crate::api::router::router;
use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::test_support;

const SKIP: &str = "skipping: DATABASE_URL and POSTGRES_PASSWORD are not set";

async fn live_app() -> Option<Router> {
    let url = test_support::live_database_url()?;
    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;

    test_support::set_test_env();
    std::env::remove_var("PROMETHEUS_ENABLED");
    let settings = Settings::load().expect("settings");

    Some(router(AppState::new(settings, pool, None)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json =
        if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

fn days_from_now(days: i64) -> String {
    (OffsetDateTime::now_utc() + Duration::days(days)).format(&Rfc3339).unwrap()
}

async fn create_course(app: &Router, owner_id: &str, correlatives: Value) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/courses",
        Some(json!({
            "name": format!("Course {}", Uuid::new_v4()),
            "description": "Full-flow fixture",
            "creator_id": owner_id,
            "creator_name": "Prof. Rivera",
            "course_start_date": days_from_now(-1),
            "course_end_date": days_from_now(60),
            "enroll_date_start": days_from_now(-1),
            "enroll_date_end": days_from_now(30),
            "max_students": 10,
            "correlatives_required_id": correlatives,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("course id").to_string()
}

#[tokio::test]
async fn module_positions_stay_contiguous_through_swap_and_delete() {
    let _guard = test_support::env_lock();
    let Some(app) = live_app().await else {
        eprintln!("{SKIP}");
        return;
    };

    let owner = Uuid::new_v4().to_string();
    let course_id = create_course(&app, &owner, json!([])).await;

    let mut module_ids = Vec::new();
    for index in 1..=3 {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/courses/{course_id}/modules"),
            Some(json!({
                "title": format!("Unit {index}"),
                "description": "fixture",
                "owner_id": owner,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["position"], index);
        module_ids.push(body["id"].as_str().unwrap().to_string());
    }

    // Moving the last module to the front exchanges exactly two slots.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/courses/{course_id}/modules/{}", module_ids[2]),
        Some(json!({"modifier_id": owner, "position": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], 1);

    let (status, body) = send(&app, "GET", &format!("/courses/{course_id}/modules"), None).await;
    assert_eq!(status, StatusCode::OK);
    let positions: std::collections::HashMap<String, i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|module| {
            (module["id"].as_str().unwrap().to_string(), module["position"].as_i64().unwrap())
        })
        .collect();
    assert_eq!(positions[&module_ids[0]], 3);
    assert_eq!(positions[&module_ids[1]], 2);
    assert_eq!(positions[&module_ids[2]], 1);

    // A target beyond the end is rejected without moving anything.
    let (status, problem) = send(
        &app,
        "PUT",
        &format!("/courses/{course_id}/modules/{}", module_ids[0]),
        Some(json!({"modifier_id": owner, "position": 99})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["title"], "INVALID_FIELD");

    // Deleting the middle module closes the gap.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/courses/{course_id}/modules/{}?owner_id={owner}", module_ids[1]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/courses/{course_id}/modules"), None).await;
    assert_eq!(status, StatusCode::OK);
    let remaining: Vec<i64> =
        body.as_array().unwrap().iter().map(|module| module["position"].as_i64().unwrap()).collect();
    assert_eq!(remaining, vec![1, 2]);
}

#[tokio::test]
async fn favourite_add_and_remove_reject_duplicates() {
    let _guard = test_support::env_lock();
    let Some(app) = live_app().await else {
        eprintln!("{SKIP}");
        return;
    };

    let owner = Uuid::new_v4().to_string();
    let student = Uuid::new_v4().to_string();
    let course_id = create_course(&app, &owner, json!([])).await;

    let body = json!({"course_id": course_id, "student_id": student});

    let (status, _) = send(&app, "POST", "/courses/favourites", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, problem) = send(&app, "POST", "/courses/favourites", Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["title"], "COURSE_ALREADY_IN_FAVOURITES");

    let (status, _) = send(&app, "DELETE", "/courses/favourites", Some(body.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, problem) = send(&app, "DELETE", "/courses/favourites", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["title"], "COURSE_NOT_IN_FAVOURITES");
}

#[tokio::test]
async fn enrollment_flow_accepts_then_rejects_the_same_student() {
    let _guard = test_support::env_lock();
    let Some(app) = live_app().await else {
        eprintln!("{SKIP}");
        return;
    };

    let owner = Uuid::new_v4().to_string();
    let student = Uuid::new_v4().to_string();
    let course_id = create_course(&app, &owner, json!([])).await;

    let enroll_body = json!({"student_id": student});

    let (status, _) = send(
        &app,
        "POST",
        &format!("/courses/{course_id}/enroll"),
        Some(enroll_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, problem) =
        send(&app, "POST", &format!("/courses/{course_id}/enroll"), Some(enroll_body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(problem["title"], "UNAUTHORIZED");
}

#[tokio::test]
async fn correlatives_persist_with_the_course_and_gate_enrollment() {
    let _guard = test_support::env_lock();
    let Some(app) = live_app().await else {
        eprintln!("{SKIP}");
        return;
    };

    let owner = Uuid::new_v4().to_string();
    let prerequisite_id = create_course(&app, &owner, json!([])).await;
    let course_id = create_course(&app, &owner, json!([prerequisite_id.clone()])).await;

    let (status, body) = send(&app, "GET", &format!("/courses/{course_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correlatives_required_id"], json!([prerequisite_id]));

    let student = Uuid::new_v4().to_string();
    let (status, problem) = send(
        &app,
        "POST",
        &format!("/courses/{course_id}/enroll"),
        Some(json!({"student_id": student})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(problem["title"], "USER_HAS_NOT_ENOUGH_CORRELATIVES_APPROVED_TO_ENROLL");
}

#[tokio::test]
async fn assistant_permission_update_keeps_unmentioned_grants() {
    let _guard = test_support::env_lock();
    let Some(app) = live_app().await else {
        eprintln!("{SKIP}");
        return;
    };

    let owner = Uuid::new_v4().to_string();
    let assistant = Uuid::new_v4().to_string();
    let course_id = create_course(&app, &owner, json!([])).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/courses/assistants/{course_id}"),
        Some(json!({
            "assistant_id": assistant,
            "owner_id": owner,
            "permissions": {"exams": true},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/courses/assistants/{course_id}/{assistant}"),
        Some(json!({"owner_id": owner, "permissions": {"tasks": true}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissions"]["tasks"], true);
    assert_eq!(body["permissions"]["exams"], true);
    assert_eq!(body["permissions"]["modules_and_resources"], false);
}
