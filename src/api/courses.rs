use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::{titles, ApiError};
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::{now_ms, parse_rfc3339, primitive_now_utc};
use crate::db::types::CourseStatus;
use crate::repositories::courses as courses_repo;
use crate::schemas::course::{
    CourseCreate, CourseCreated, CourseResponse, CourseUpdate, OwnerBody, OwnerQuery, SearchQuery,
    StudentsResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/search", get(search_courses))
        .route("/paginated", get(list_paginated))
        .route("/courses_owned/:user_id", get(list_owned))
        .route(
            "/:course_id",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/:course_id/students", get(list_students))
        .route("/:course_id/open", post(open_course))
        .route("/:course_id/close", post(close_course))
}

fn parse_date(
    value: &str,
    field: &str,
    instance: &'static str,
) -> Result<time::PrimitiveDateTime, ApiError> {
    parse_rfc3339(value).ok_or_else(|| {
        ApiError::invalid_field(format!("Field '{field}' is not a valid RFC3339 date"), instance)
    })
}

async fn create_course(
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseCreated>), ApiError> {
    const INSTANCE: &str = "create_course";

    let mut missing = Vec::new();
    if payload.name.as_deref().map_or(true, str::is_empty) {
        missing.push("name");
    }
    if payload.description.as_deref().map_or(true, str::is_empty) {
        missing.push("description");
    }
    if payload.creator_id.as_deref().map_or(true, str::is_empty) {
        missing.push("creator_id");
    }
    if payload.creator_name.as_deref().map_or(true, str::is_empty) {
        missing.push("creator_name");
    }
    if payload.course_start_date.is_none() {
        missing.push("course_start_date");
    }
    if payload.course_end_date.is_none() {
        missing.push("course_end_date");
    }
    if payload.max_students.is_none() {
        missing.push("max_students");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let max_students = payload.max_students.unwrap_or_default();
    if max_students <= 0 {
        return Err(ApiError::invalid_field("Field 'max_students' must be positive", INSTANCE));
    }

    let course_start_date =
        parse_date(payload.course_start_date.as_deref().unwrap_or_default(), "course_start_date", INSTANCE)?;
    let course_end_date =
        parse_date(payload.course_end_date.as_deref().unwrap_or_default(), "course_end_date", INSTANCE)?;
    let enroll_date_start = payload
        .enroll_date_start
        .as_deref()
        .map(|raw| parse_date(raw, "enroll_date_start", INSTANCE))
        .transpose()?;
    let enroll_date_end = payload
        .enroll_date_end
        .as_deref()
        .map(|raw| parse_date(raw, "enroll_date_end", INSTANCE))
        .transpose()?;

    let id = Uuid::new_v4().to_string();
    let course = courses_repo::create(
        state.db(),
        courses_repo::CreateCourse {
            id: &id,
            name: payload.name.as_deref().unwrap_or_default(),
            description: payload.description.as_deref().unwrap_or_default(),
            max_students,
            course_start_date,
            course_end_date,
            enroll_date_start,
            enroll_date_end,
            creator_id: payload.creator_id.as_deref().unwrap_or_default(),
            creator_name: payload.creator_name.as_deref().unwrap_or_default(),
            background: payload.background.as_deref(),
            correlatives: payload.correlatives_required_id.as_deref().unwrap_or_default(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((StatusCode::CREATED, Json(CourseCreated { id: course.id })))
}

async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    const INSTANCE: &str = "get_courses";

    let courses = courses_repo::list_all(state.db())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    if courses.is_empty() {
        return Err(ApiError::not_found(titles::COURSE_NOT_FOUND, "No courses found", INSTANCE));
    }

    Ok(Json(courses.into_iter().map(CourseResponse::bare).collect()))
}

async fn search_courses(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    const INSTANCE: &str = "search_courses";

    let Some(needle) = query.q.filter(|value| !value.trim().is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'q' is required", INSTANCE));
    };

    let courses = courses_repo::search(state.db(), needle.trim())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(courses.into_iter().map(CourseResponse::bare).collect()))
}

async fn list_paginated(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<CourseResponse>>, ApiError> {
    const INSTANCE: &str = "get_courses_paginated";

    let (offset, limit) = page.clamp();
    let courses = courses_repo::list_paginated(state.db(), offset, limit)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let total_count = courses_repo::count_all(state.db())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(PaginatedResponse {
        items: courses.into_iter().map(CourseResponse::bare).collect(),
        total_count,
        offset,
        max_per_page: limit,
    }))
}

async fn list_owned(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<CourseResponse>>, ApiError> {
    const INSTANCE: &str = "get_courses_owned";

    let (offset, limit) = page.clamp();
    let courses = courses_repo::list_owned(state.db(), &user_id, offset, limit)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let total_count = courses_repo::count_owned(state.db(), &user_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(PaginatedResponse {
        items: courses.into_iter().map(CourseResponse::bare).collect(),
        total_count,
        offset,
        max_per_page: limit,
    }))
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    const INSTANCE: &str = "get_course";

    let course = courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let correlatives = courses_repo::list_correlatives(state.db(), &course.id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(CourseResponse::from_db(course, correlatives)))
}

async fn update_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(owner): Query<OwnerQuery>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    const INSTANCE: &str = "update_course";

    let Some(owner_id) = owner.owner_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'owner_id' is required", INSTANCE));
    };

    let course = courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    if course.creator_id != owner_id {
        return Err(ApiError::unauthorized("Only the course owner can update it", INSTANCE));
    }

    let update = courses_repo::UpdateCourse {
        name: payload.name,
        description: payload.description,
        max_students: payload.max_students,
        course_start_date: payload
            .course_start_date
            .as_deref()
            .map(|raw| parse_date(raw, "course_start_date", INSTANCE))
            .transpose()?,
        course_end_date: payload
            .course_end_date
            .as_deref()
            .map(|raw| parse_date(raw, "course_end_date", INSTANCE))
            .transpose()?,
        background: payload.background,
        updated_at: primitive_now_utc(),
    };

    if update.is_empty() {
        return Err(ApiError::missing_fields("No updatable fields provided", INSTANCE));
    }

    courses_repo::update(state.db(), &course_id, update)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    hydrated(&state, &course_id, INSTANCE).await.map(Json)
}

async fn delete_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "delete_course";

    let Some(owner_id) = owner.owner_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'owner_id' is required", INSTANCE));
    };

    let course = courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    if course.creator_id != owner_id {
        return Err(ApiError::unauthorized("Only the course owner can delete it", INSTANCE));
    }

    courses_repo::delete(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_students(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<StudentsResponse>, ApiError> {
    const INSTANCE: &str = "get_course_students";

    courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let students = courses_repo::list_students(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(StudentsResponse { course_id, students }))
}

async fn open_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<OwnerBody>,
) -> Result<Json<CourseResponse>, ApiError> {
    const INSTANCE: &str = "open_course";

    let course = owned_course(&state, &course_id, payload.owner_id, INSTANCE).await?;

    if course.status == CourseStatus::Open {
        return Err(ApiError::invalid_field("Course is already open", INSTANCE));
    }
    if course.course_end_date <= primitive_now_utc() {
        return Err(ApiError::invalid_field(
            "Cannot reopen a course whose end date has passed",
            INSTANCE,
        ));
    }

    courses_repo::reopen(state.db(), &course_id, primitive_now_utc(), now_ms())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    hydrated(&state, &course_id, INSTANCE).await.map(Json)
}

async fn close_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<OwnerBody>,
) -> Result<Json<CourseResponse>, ApiError> {
    const INSTANCE: &str = "close_course";

    let course = owned_course(&state, &course_id, payload.owner_id, INSTANCE).await?;

    if course.status == CourseStatus::Closed {
        return Err(ApiError::invalid_field("Course is already closed", INSTANCE));
    }

    courses_repo::close(state.db(), &course_id, primitive_now_utc(), now_ms())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    hydrated(&state, &course_id, INSTANCE).await.map(Json)
}

async fn owned_course(
    state: &AppState,
    course_id: &str,
    owner_id: Option<String>,
    instance: &'static str,
) -> Result<crate::db::models::Course, ApiError> {
    let Some(owner_id) = owner_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Field 'owner_id' is required", instance));
    };

    let course = courses_repo::find_by_id(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, instance))?
        .ok_or_else(|| ApiError::course_not_found(instance))?;

    if course.creator_id != owner_id {
        return Err(ApiError::unauthorized("Only the course owner may do this", instance));
    }

    Ok(course)
}

async fn hydrated(
    state: &AppState,
    course_id: &str,
    instance: &'static str,
) -> Result<CourseResponse, ApiError> {
    let course = courses_repo::find_by_id(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, instance))?
        .ok_or_else(|| ApiError::course_not_found(instance))?;
    let correlatives = courses_repo::list_correlatives(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, instance))?;
    Ok(CourseResponse::from_db(course, correlatives))
}
