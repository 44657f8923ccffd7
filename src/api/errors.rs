use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub(crate) mod titles {
    pub(crate) const MISSING_FIELDS: &str = "MISSING_FIELDS";
    pub(crate) const INVALID_FIELD: &str = "INVALID_FIELD";
    pub(crate) const COURSE_NOT_FOUND: &str = "COURSE_NOT_FOUND";
    pub(crate) const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";
    pub(crate) const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
    pub(crate) const TASK_NOT_FOUND: &str = "TASK_NOT_FOUND";
    pub(crate) const SUBMISSION_NOT_FOUND: &str = "SUBMISSION_NOT_FOUND";
    pub(crate) const ASSISTANT_NOT_FOUND: &str = "ASSISTANT_NOT_FOUND";
    pub(crate) const NO_FEEDBACK_FOUND: &str = "NO_FEEDBACK_FOUND";
    pub(crate) const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub(crate) const COURSE_IS_FULL: &str = "COURSE_IS_FULL";
    pub(crate) const NOT_ENOUGH_CORRELATIVES: &str =
        "USER_HAS_NOT_ENOUGH_CORRELATIVES_APPROVED_TO_ENROLL";
    pub(crate) const USER_NOT_ENROLLED: &str = "USER_NOT_ENROLLED_INTO_THE_COURSE";
    pub(crate) const ASSISTANT_ALREADY_EXISTS: &str = "ASSISTANT_ALREADY_EXISTS";
    pub(crate) const CORRECTOR_ALREADY_ASSIGNED: &str = "CORRECTOR_ALREADY_ASSIGNED";
    pub(crate) const COURSE_ALREADY_IN_FAVOURITES: &str = "COURSE_ALREADY_IN_FAVOURITES";
    pub(crate) const COURSE_NOT_IN_FAVOURITES: &str = "COURSE_NOT_IN_FAVOURITES";
    pub(crate) const STORAGE_DISABLED: &str = "STORAGE_DISABLED";
    pub(crate) const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

/// RFC 7807 style body. Every error response of the service uses it.
#[derive(Debug, Serialize)]
pub(crate) struct Problem {
    #[serde(rename = "type")]
    pub(crate) kind: &'static str,
    pub(crate) title: &'static str,
    pub(crate) status: u16,
    pub(crate) detail: String,
    pub(crate) instance: String,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    title: &'static str,
    detail: String,
    instance: &'static str,
}

impl ApiError {
    pub(crate) fn new(
        status: StatusCode,
        title: &'static str,
        detail: impl Into<String>,
        instance: &'static str,
    ) -> Self {
        Self { status, title, detail: detail.into(), instance }
    }

    pub(crate) fn missing_fields(detail: impl Into<String>, instance: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, titles::MISSING_FIELDS, detail, instance)
    }

    pub(crate) fn invalid_field(detail: impl Into<String>, instance: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, titles::INVALID_FIELD, detail, instance)
    }

    pub(crate) fn not_found(
        title: &'static str,
        detail: impl Into<String>,
        instance: &'static str,
    ) -> Self {
        Self::new(StatusCode::NOT_FOUND, title, detail, instance)
    }

    pub(crate) fn course_not_found(instance: &'static str) -> Self {
        Self::not_found(titles::COURSE_NOT_FOUND, "Course not found", instance)
    }

    pub(crate) fn unauthorized(detail: impl Into<String>, instance: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, titles::UNAUTHORIZED, detail, instance)
    }

    pub(crate) fn conflict(
        title: &'static str,
        detail: impl Into<String>,
        instance: &'static str,
    ) -> Self {
        Self::new(StatusCode::CONFLICT, title, detail, instance)
    }

    pub(crate) fn bad_request(
        title: &'static str,
        detail: impl Into<String>,
        instance: &'static str,
    ) -> Self {
        Self::new(StatusCode::BAD_REQUEST, title, detail, instance)
    }

    pub(crate) fn storage_disabled(instance: &'static str) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            titles::STORAGE_DISABLED,
            "Object storage is not configured",
            instance,
        )
    }

    /// Log the underlying error with context and answer with the opaque 500.
    pub(crate) fn internal(err: impl std::fmt::Display, instance: &'static str) -> Self {
        tracing::error!(error = %err, instance, "request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            titles::INTERNAL_SERVER_ERROR,
            "Internal server error",
            instance,
        )
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Problem {
            kind: "about:blank",
            title: self.title,
            status: self.status.as_u16(),
            detail: self.detail,
            instance: format!("/courses/{}", self.instance),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_all_problem_fields() {
        let error = ApiError::course_not_found("get_course");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = read_body(response);
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["title"], "COURSE_NOT_FOUND");
        assert_eq!(body["status"], 404);
        assert_eq!(body["detail"], "Course not found");
        assert_eq!(body["instance"], "/courses/get_course");
    }

    #[test]
    fn internal_hides_the_underlying_error() {
        let error = ApiError::internal("connection refused", "create_course");
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body(error.into_response());
        assert_eq!(body["title"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["detail"], "Internal server error");
    }

    fn read_body(response: Response) -> serde_json::Value {
        let bytes = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(axum::body::to_bytes(response.into_body(), usize::MAX))
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
