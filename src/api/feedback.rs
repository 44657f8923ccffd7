use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::{titles, ApiError};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::{courses as courses_repo, feedback as feedback_repo};
use crate::schemas::feedback::{
    CourseFeedbackCreate, CourseFeedbackResponse, StudentFeedbackCreate, StudentFeedbackResponse,
};
use crate::services::authorization::{authorize, Capability};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/course", post(create_course_feedback))
        .route("/course/:course_id", get(list_course_feedbacks))
        .route("/student", post(create_student_feedback))
        .route("/student/:student_id/:course_id", get(get_student_feedback))
}

async fn create_course_feedback(
    State(state): State<AppState>,
    Json(payload): Json<CourseFeedbackCreate>,
) -> Result<(StatusCode, Json<CourseFeedbackResponse>), ApiError> {
    const INSTANCE: &str = "create_course_feedback";

    let mut missing = Vec::new();
    if payload.course_id.as_deref().map_or(true, str::is_empty) {
        missing.push("course_id");
    }
    if payload.feedback.as_deref().map_or(true, str::is_empty) {
        missing.push("feedback");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let course_id = payload.course_id.as_deref().unwrap_or_default();

    courses_repo::find_by_id(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    if let Some(rating) = payload.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::invalid_field("Field 'rating' must be within 1..=5", INSTANCE));
        }
    }

    let id = Uuid::new_v4().to_string();
    let feedback = feedback_repo::create_course_feedback(
        state.db(),
        &id,
        course_id,
        payload.feedback.as_deref().unwrap_or_default(),
        payload.rating,
        primitive_now_utc(),
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((StatusCode::CREATED, Json(CourseFeedbackResponse::from_db(feedback))))
}

async fn list_course_feedbacks(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<CourseFeedbackResponse>>, ApiError> {
    const INSTANCE: &str = "get_course_feedbacks";

    courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let feedbacks = feedback_repo::list_course_feedbacks(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(feedbacks.into_iter().map(CourseFeedbackResponse::from_db).collect()))
}

async fn create_student_feedback(
    State(state): State<AppState>,
    Json(payload): Json<StudentFeedbackCreate>,
) -> Result<(StatusCode, Json<StudentFeedbackResponse>), ApiError> {
    const INSTANCE: &str = "create_student_feedback";

    let mut missing = Vec::new();
    if payload.student_id.as_deref().map_or(true, str::is_empty) {
        missing.push("student_id");
    }
    if payload.course_id.as_deref().map_or(true, str::is_empty) {
        missing.push("course_id");
    }
    if payload.teacher_id.as_deref().map_or(true, str::is_empty) {
        missing.push("teacher_id");
    }
    if payload.feedback.as_deref().map_or(true, str::is_empty) {
        missing.push("feedback");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let course_id = payload.course_id.as_deref().unwrap_or_default();
    let teacher_id = payload.teacher_id.as_deref().unwrap_or_default();

    let course = courses_repo::find_by_id(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let allowed =
        authorize(state.db(), course_id, &course.creator_id, teacher_id, Capability::Feedbacks)
            .await
            .map_err(|err| ApiError::internal(err, INSTANCE))?;
    if !allowed {
        return Err(ApiError::unauthorized(
            "User may not leave student feedback for this course",
            INSTANCE,
        ));
    }

    let id = Uuid::new_v4().to_string();
    let feedback = feedback_repo::create_student_feedback(
        state.db(),
        &id,
        payload.student_id.as_deref().unwrap_or_default(),
        course_id,
        teacher_id,
        payload.feedback.as_deref().unwrap_or_default(),
        primitive_now_utc(),
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((StatusCode::CREATED, Json(StudentFeedbackResponse::from_db(feedback))))
}

async fn get_student_feedback(
    State(state): State<AppState>,
    Path((student_id, course_id)): Path<(String, String)>,
) -> Result<Json<Vec<StudentFeedbackResponse>>, ApiError> {
    const INSTANCE: &str = "get_student_feedback";

    let feedbacks = feedback_repo::list_student_feedbacks(state.db(), &student_id, &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    if feedbacks.is_empty() {
        return Err(ApiError::not_found(
            titles::NO_FEEDBACK_FOUND,
            "No feedback found for this student and course",
            INSTANCE,
        ));
    }

    Ok(Json(feedbacks.into_iter().map(StudentFeedbackResponse::from_db).collect()))
}
