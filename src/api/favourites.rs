use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::errors::{titles, ApiError};
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::{courses as courses_repo, users_data};
use crate::schemas::course::{CourseResponse, FavouriteRequest, SearchQuery};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(add_favourite).delete(remove_favourite))
        .route("/:student_id", get(list_favourites))
        .route("/:student_id/search", get(search_favourites))
}

fn required_ids(
    payload: FavouriteRequest,
    instance: &'static str,
) -> Result<(String, String), ApiError> {
    let mut missing = Vec::new();
    if payload.course_id.as_deref().map_or(true, str::is_empty) {
        missing.push("course_id");
    }
    if payload.student_id.as_deref().map_or(true, str::is_empty) {
        missing.push("student_id");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            instance,
        ));
    }
    Ok((payload.course_id.unwrap_or_default(), payload.student_id.unwrap_or_default()))
}

async fn add_favourite(
    State(state): State<AppState>,
    Json(payload): Json<FavouriteRequest>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "add_favourite_course";

    let (course_id, student_id) = required_ids(payload, INSTANCE)?;

    courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let added = users_data::add_favourite(state.db(), &student_id, &course_id, primitive_now_utc())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    if !added {
        return Err(ApiError::bad_request(
            titles::COURSE_ALREADY_IN_FAVOURITES,
            "Course is already in the student's favourites",
            INSTANCE,
        ));
    }

    Ok(StatusCode::CREATED)
}

async fn remove_favourite(
    State(state): State<AppState>,
    Json(payload): Json<FavouriteRequest>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "remove_favourite_course";

    let (course_id, student_id) = required_ids(payload, INSTANCE)?;

    let removed = users_data::remove_favourite(state.db(), &student_id, &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    if !removed {
        return Err(ApiError::bad_request(
            titles::COURSE_NOT_IN_FAVOURITES,
            "Course is not in the student's favourites",
            INSTANCE,
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn list_favourites(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<CourseResponse>>, ApiError> {
    const INSTANCE: &str = "get_favourite_courses";

    let (offset, limit) = page.clamp();
    let courses = users_data::list_favourites(state.db(), &student_id, offset, limit)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let total_count = users_data::count_favourites(state.db(), &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(PaginatedResponse {
        items: courses.into_iter().map(CourseResponse::bare).collect(),
        total_count,
        offset,
        max_per_page: limit,
    }))
}

async fn search_favourites(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(query): Query<SearchQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    const INSTANCE: &str = "search_favourite_courses";

    let Some(needle) = query.q.filter(|value| !value.trim().is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'q' is required", INSTANCE));
    };

    let (offset, limit) = page.clamp();
    let courses =
        users_data::search_favourites(state.db(), &student_id, needle.trim(), offset, limit)
            .await
            .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(courses.into_iter().map(CourseResponse::bare).collect()))
}
