use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::errors::{titles, ApiError};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories::{courses as courses_repo, users_data};
use crate::schemas::course::{ApprovalResponse, ApproveRequest, CourseResponse, EnrollRequest};
use crate::services::enrollment::{check_eligibility, EnrollmentFacts, EnrollmentRejection};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/enrolled_courses/:student_id", get(list_enrolled))
        .route("/:course_id/enroll", post(enroll))
        .route("/:course_id/approve", post(approve))
        .route("/:course_id/student/:student_id/approved", get(approval_status))
}

async fn enroll(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<EnrollRequest>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "enroll_student";

    let Some(student_id) = payload.student_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Field 'student_id' is required", INSTANCE));
    };

    let course = courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let already_enrolled = courses_repo::is_enrolled(state.db(), &course_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let enrolled_count = courses_repo::count_students(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let correlatives = courses_repo::list_correlatives(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let approved_correlatives = if correlatives.is_empty() {
        0
    } else {
        users_data::count_approved_among(state.db(), &student_id, &correlatives)
            .await
            .map_err(|err| ApiError::internal(err, INSTANCE))?
    };

    let facts = EnrollmentFacts {
        already_enrolled,
        enrolled_count,
        approved_correlatives,
        required_correlatives: correlatives.len() as i64,
    };

    if let Err(rejection) = check_eligibility(&course, primitive_now_utc(), &facts) {
        return Err(match rejection {
            EnrollmentRejection::WindowClosed => {
                ApiError::unauthorized("The inscription window is closed", INSTANCE)
            }
            EnrollmentRejection::AlreadyEnrolled => {
                ApiError::unauthorized("Student is already enrolled", INSTANCE)
            }
            EnrollmentRejection::CourseFull => ApiError::new(
                StatusCode::FORBIDDEN,
                titles::COURSE_IS_FULL,
                "The course has reached its maximum number of students",
                INSTANCE,
            ),
            EnrollmentRejection::MissingCorrelatives => ApiError::new(
                StatusCode::FORBIDDEN,
                titles::NOT_ENOUGH_CORRELATIVES,
                "Student has not approved every required correlative course",
                INSTANCE,
            ),
        });
    }

    courses_repo::add_student(state.db(), &course_id, &student_id, primitive_now_utc())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(StatusCode::OK)
}

async fn list_enrolled(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    const INSTANCE: &str = "get_enrolled_courses";

    let courses = courses_repo::list_enrolled_courses(state.db(), &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(courses.into_iter().map(CourseResponse::bare).collect()))
}

async fn approve(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<ApproveRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    const INSTANCE: &str = "approve_student";

    let Some(student_id) = payload.student_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Field 'student_id' is required", INSTANCE));
    };

    courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let enrolled = courses_repo::is_enrolled(state.db(), &course_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    if !enrolled {
        return Err(ApiError::bad_request(
            titles::USER_NOT_ENROLLED,
            "Student is not enrolled into the course",
            INSTANCE,
        ));
    }

    let approved_at = primitive_now_utc();
    users_data::approve_student(state.db(), &course_id, &student_id, payload.final_grade, approved_at)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(ApprovalResponse {
        student_id,
        course_id,
        approved: true,
        final_grade: payload.final_grade,
        approved_at: Some(format_primitive(approved_at)),
    }))
}

async fn approval_status(
    State(state): State<AppState>,
    Path((course_id, student_id)): Path<(String, String)>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    const INSTANCE: &str = "get_approval_status";

    courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let approval = users_data::find_approval(state.db(), &course_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(match approval {
        Some(row) => ApprovalResponse {
            student_id,
            course_id,
            approved: true,
            final_grade: row.final_grade,
            approved_at: Some(format_primitive(row.approved_at)),
        },
        None => ApprovalResponse {
            student_id,
            course_id,
            approved: false,
            final_grade: None,
            approved_at: None,
        },
    }))
}
