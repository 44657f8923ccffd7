use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::errors::{titles, ApiError};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Course;
use crate::repositories::courses as courses_repo;
use crate::repositories::users_data::{self, AssistantFlags};
use crate::schemas::assistant::{AssistantCreate, AssistantResponse, AssistantUpdate};
use crate::schemas::course::OwnerQuery;
use crate::services::authorization::overlay_flags;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:course_id", post(create_assistant)).route(
        "/:course_id/:assistant_id",
        get(get_assistant).put(update_assistant).delete(delete_assistant),
    )
}

async fn owned_course(
    state: &AppState,
    course_id: &str,
    owner_id: &str,
    instance: &'static str,
) -> Result<Course, ApiError> {
    let course = courses_repo::find_by_id(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, instance))?
        .ok_or_else(|| ApiError::course_not_found(instance))?;

    if course.creator_id != owner_id {
        return Err(ApiError::unauthorized("Only the course owner manages assistants", instance));
    }
    Ok(course)
}

async fn create_assistant(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<AssistantCreate>,
) -> Result<(StatusCode, Json<AssistantResponse>), ApiError> {
    const INSTANCE: &str = "create_assistant";

    let mut missing = Vec::new();
    if payload.assistant_id.as_deref().map_or(true, str::is_empty) {
        missing.push("assistant_id");
    }
    if payload.owner_id.as_deref().map_or(true, str::is_empty) {
        missing.push("owner_id");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let assistant_id = payload.assistant_id.as_deref().unwrap_or_default();
    let owner_id = payload.owner_id.as_deref().unwrap_or_default();

    owned_course(&state, &course_id, owner_id, INSTANCE).await?;

    // Unknown keys are dropped on creation; the strict check only guards updates.
    let flags = match &payload.permissions {
        Some(permissions) => overlay_flags(AssistantFlags::default(), permissions, false)
            .map_err(|detail| ApiError::invalid_field(detail, INSTANCE))?,
        None => AssistantFlags::default(),
    };

    let created =
        users_data::create_assistant(state.db(), &course_id, assistant_id, flags, primitive_now_utc())
            .await
            .map_err(|err| ApiError::internal(err, INSTANCE))?;

    if !created {
        return Err(ApiError::conflict(
            titles::ASSISTANT_ALREADY_EXISTS,
            "Assistant is already registered for this course",
            INSTANCE,
        ));
    }

    let assistant = users_data::find_assistant(state.db(), &course_id, assistant_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::ASSISTANT_NOT_FOUND, "Assistant not found", INSTANCE)
        })?;

    Ok((StatusCode::CREATED, Json(AssistantResponse::from_db(assistant))))
}

async fn update_assistant(
    State(state): State<AppState>,
    Path((course_id, assistant_id)): Path<(String, String)>,
    Json(payload): Json<AssistantUpdate>,
) -> Result<Json<AssistantResponse>, ApiError> {
    const INSTANCE: &str = "update_assistant";

    let mut missing = Vec::new();
    if payload.owner_id.as_deref().map_or(true, str::is_empty) {
        missing.push("owner_id");
    }
    if payload.permissions.is_none() {
        missing.push("permissions");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let owner_id = payload.owner_id.as_deref().unwrap_or_default();
    owned_course(&state, &course_id, owner_id, INSTANCE).await?;

    let existing = users_data::find_assistant(state.db(), &course_id, &assistant_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::ASSISTANT_NOT_FOUND, "Assistant not found", INSTANCE)
        })?;

    // Strict: an unknown permission key rejects the whole update. Keys
    // the update does not mention keep their stored value.
    let flags = overlay_flags(
        AssistantFlags::from_row(&existing),
        payload.permissions.as_ref().unwrap_or(&serde_json::Value::Null),
        true,
    )
    .map_err(|detail| ApiError::invalid_field(detail, INSTANCE))?;

    let updated = users_data::update_assistant(state.db(), &course_id, &assistant_id, flags)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    if !updated {
        return Err(ApiError::not_found(
            titles::ASSISTANT_NOT_FOUND,
            "Assistant not found",
            INSTANCE,
        ));
    }

    let assistant = users_data::find_assistant(state.db(), &course_id, &assistant_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::ASSISTANT_NOT_FOUND, "Assistant not found", INSTANCE)
        })?;

    Ok(Json(AssistantResponse::from_db(assistant)))
}

async fn delete_assistant(
    State(state): State<AppState>,
    Path((course_id, assistant_id)): Path<(String, String)>,
    Query(owner): Query<OwnerQuery>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "delete_assistant";

    let Some(owner_id) = owner.owner_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'owner_id' is required", INSTANCE));
    };

    owned_course(&state, &course_id, &owner_id, INSTANCE).await?;

    let deleted = users_data::delete_assistant(state.db(), &course_id, &assistant_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    if !deleted {
        return Err(ApiError::not_found(
            titles::ASSISTANT_NOT_FOUND,
            "Assistant not found",
            INSTANCE,
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn get_assistant(
    State(state): State<AppState>,
    Path((course_id, assistant_id)): Path<(String, String)>,
) -> Result<Json<AssistantResponse>, ApiError> {
    const INSTANCE: &str = "get_assistant";

    let assistant = users_data::find_assistant(state.db(), &course_id, &assistant_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::ASSISTANT_NOT_FOUND, "Assistant not found", INSTANCE)
        })?;

    Ok(Json(AssistantResponse::from_db(assistant)))
}
