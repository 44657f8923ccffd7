use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::{titles, ApiError};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::{courses as courses_repo, modules as modules_repo};
use crate::schemas::course::OwnerQuery;
use crate::schemas::module::{
    ModuleCreate, ModuleResponse, ModuleUpdate, ResourceCreate, ResourceResponse, ResourceUpdate,
};
use crate::services::authorization::{authorize, Capability};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_modules).post(create_module))
        .route("/:module_id", get(get_module).put(update_module).delete(delete_module))
        .route("/:module_id/resources", get(list_resources).post(create_resource))
        .route(
            "/:module_id/resources/:resource_id",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
}

async fn require_capability(
    state: &AppState,
    course_id: &str,
    user_id: &str,
    instance: &'static str,
) -> Result<(), ApiError> {
    let course = courses_repo::find_by_id(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, instance))?
        .ok_or_else(|| ApiError::course_not_found(instance))?;

    let allowed = authorize(
        state.db(),
        course_id,
        &course.creator_id,
        user_id,
        Capability::ModulesAndResources,
    )
    .await
    .map_err(|err| ApiError::internal(err, instance))?;

    if !allowed {
        return Err(ApiError::unauthorized(
            "User may not manage modules and resources of this course",
            instance,
        ));
    }
    Ok(())
}

async fn list_modules(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    const INSTANCE: &str = "get_modules";

    courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let modules = modules_repo::list_modules(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(modules.into_iter().map(ModuleResponse::from_db).collect()))
}

async fn get_module(
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
) -> Result<Json<ModuleResponse>, ApiError> {
    const INSTANCE: &str = "get_module";

    let module = modules_repo::find_module(state.db(), &course_id, &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::MODULE_NOT_FOUND, "Module not found", INSTANCE)
        })?;

    Ok(Json(ModuleResponse::from_db(module)))
}

async fn create_module(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<ModuleCreate>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    const INSTANCE: &str = "create_module";

    let mut missing = Vec::new();
    if payload.title.as_deref().map_or(true, str::is_empty) {
        missing.push("title");
    }
    if payload.description.as_deref().map_or(true, str::is_empty) {
        missing.push("description");
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

    let owner_id = payload.owner_id.as_deref().unwrap_or_default();
    require_capability(&state, &course_id, owner_id, INSTANCE).await?;

    let id = Uuid::new_v4().to_string();
    let module = modules_repo::create_module(
        state.db(),
        modules_repo::CreateModule {
            id: &id,
            course_id: &course_id,
            title: payload.title.as_deref().unwrap_or_default(),
            description: payload.description.as_deref().unwrap_or_default(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((StatusCode::CREATED, Json(ModuleResponse::from_db(module))))
}

async fn update_module(
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(payload): Json<ModuleUpdate>,
) -> Result<Json<ModuleResponse>, ApiError> {
    const INSTANCE: &str = "update_module";

    let Some(modifier_id) = payload.modifier_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Field 'modifier_id' is required", INSTANCE));
    };
    if payload.title.is_none() && payload.description.is_none() && payload.position.is_none() {
        return Err(ApiError::missing_fields("No updatable fields provided", INSTANCE));
    }

    require_capability(&state, &course_id, &modifier_id, INSTANCE).await?;

    modules_repo::find_module(state.db(), &course_id, &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::MODULE_NOT_FOUND, "Module not found", INSTANCE)
        })?;

    let now = primitive_now_utc();

    if payload.title.is_some() || payload.description.is_some() {
        modules_repo::update_module_fields(
            state.db(),
            &module_id,
            payload.title.as_deref(),
            payload.description.as_deref(),
            now,
        )
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    }

    if let Some(position) = payload.position {
        if position < 1 {
            return Err(ApiError::invalid_field("Field 'position' must be >= 1", INSTANCE));
        }
        let swapped =
            modules_repo::swap_module_position(state.db(), &course_id, &module_id, position, now)
                .await
                .map_err(|err| ApiError::internal(err, INSTANCE))?;
        if !swapped {
            return Err(ApiError::invalid_field("Target position is out of range", INSTANCE));
        }
    }

    let module = modules_repo::find_module(state.db(), &course_id, &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::MODULE_NOT_FOUND, "Module not found", INSTANCE)
        })?;

    Ok(Json(ModuleResponse::from_db(module)))
}

async fn delete_module(
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
    Query(owner): Query<OwnerQuery>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "delete_module";

    let Some(owner_id) = owner.owner_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'owner_id' is required", INSTANCE));
    };

    require_capability(&state, &course_id, &owner_id, INSTANCE).await?;

    let deleted = modules_repo::delete_module(state.db(), &course_id, &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    if !deleted {
        return Err(ApiError::not_found(titles::MODULE_NOT_FOUND, "Module not found", INSTANCE));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn list_resources(
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
) -> Result<Json<Vec<ResourceResponse>>, ApiError> {
    const INSTANCE: &str = "get_resources";

    modules_repo::find_module(state.db(), &course_id, &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::MODULE_NOT_FOUND, "Module not found", INSTANCE)
        })?;

    let resources = modules_repo::list_resources(state.db(), &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(resources.into_iter().map(ResourceResponse::from_db).collect()))
}

async fn get_resource(
    State(state): State<AppState>,
    Path((course_id, module_id, resource_id)): Path<(String, String, String)>,
) -> Result<Json<ResourceResponse>, ApiError> {
    const INSTANCE: &str = "get_resource";

    modules_repo::find_module(state.db(), &course_id, &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::MODULE_NOT_FOUND, "Module not found", INSTANCE)
        })?;

    let resource = modules_repo::find_resource(state.db(), &module_id, &resource_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::RESOURCE_NOT_FOUND, "Resource not found", INSTANCE)
        })?;

    Ok(Json(ResourceResponse::from_db(resource)))
}

async fn create_resource(
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(payload): Json<ResourceCreate>,
) -> Result<(StatusCode, Json<ResourceResponse>), ApiError> {
    const INSTANCE: &str = "create_resource";

    let mut missing = Vec::new();
    if payload.title.as_deref().map_or(true, str::is_empty) {
        missing.push("title");
    }
    if payload.description.as_deref().map_or(true, str::is_empty) {
        missing.push("description");
    }
    if payload.mimetype.as_deref().map_or(true, str::is_empty) {
        missing.push("mimetype");
    }
    if payload.source.as_deref().map_or(true, str::is_empty) {
        missing.push("source");
    }
    if payload.id_creator.as_deref().map_or(true, str::is_empty) {
        missing.push("id_creator");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let creator_id = payload.id_creator.as_deref().unwrap_or_default();
    require_capability(&state, &course_id, creator_id, INSTANCE).await?;

    modules_repo::find_module(state.db(), &course_id, &module_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::MODULE_NOT_FOUND, "Module not found", INSTANCE)
        })?;

    let id = Uuid::new_v4().to_string();
    let resource = modules_repo::create_resource(
        state.db(),
        modules_repo::CreateResource {
            id: &id,
            module_id: &module_id,
            title: payload.title.as_deref().unwrap_or_default(),
            description: payload.description.as_deref().unwrap_or_default(),
            mimetype: payload.mimetype.as_deref().unwrap_or_default(),
            source: payload.source.as_deref().unwrap_or_default(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from_db(resource))))
}

async fn update_resource(
    State(state): State<AppState>,
    Path((course_id, module_id, resource_id)): Path<(String, String, String)>,
    Json(payload): Json<ResourceUpdate>,
) -> Result<Json<ResourceResponse>, ApiError> {
    const INSTANCE: &str = "update_resource";

    let Some(modifier_id) = payload.modifier_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Field 'modifier_id' is required", INSTANCE));
    };
    if payload.title.is_none()
        && payload.description.is_none()
        && payload.mimetype.is_none()
        && payload.source.is_none()
        && payload.position.is_none()
    {
        return Err(ApiError::missing_fields("No updatable fields provided", INSTANCE));
    }

    require_capability(&state, &course_id, &modifier_id, INSTANCE).await?;

    modules_repo::find_resource(state.db(), &module_id, &resource_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::RESOURCE_NOT_FOUND, "Resource not found", INSTANCE)
        })?;

    let now = primitive_now_utc();

    if payload.title.is_some()
        || payload.description.is_some()
        || payload.mimetype.is_some()
        || payload.source.is_some()
    {
        modules_repo::update_resource_fields(
            state.db(),
            &resource_id,
            payload.title.as_deref(),
            payload.description.as_deref(),
            payload.mimetype.as_deref(),
            payload.source.as_deref(),
            now,
        )
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    }

    if let Some(position) = payload.position {
        if position < 1 {
            return Err(ApiError::invalid_field("Field 'position' must be >= 1", INSTANCE));
        }
        let swapped = modules_repo::swap_resource_position(
            state.db(),
            &module_id,
            &resource_id,
            position,
            now,
        )
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
        if !swapped {
            return Err(ApiError::invalid_field("Target position is out of range", INSTANCE));
        }
    }

    let resource = modules_repo::find_resource(state.db(), &module_id, &resource_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::RESOURCE_NOT_FOUND, "Resource not found", INSTANCE)
        })?;

    Ok(Json(ResourceResponse::from_db(resource)))
}

async fn delete_resource(
    State(state): State<AppState>,
    Path((course_id, module_id, resource_id)): Path<(String, String, String)>,
    Query(owner): Query<OwnerQuery>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "delete_resource";

    let Some(owner_id) = owner.owner_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'owner_id' is required", INSTANCE));
    };

    require_capability(&state, &course_id, &owner_id, INSTANCE).await?;

    let deleted = modules_repo::delete_resource(state.db(), &module_id, &resource_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    if !deleted {
        return Err(ApiError::not_found(
            titles::RESOURCE_NOT_FOUND,
            "Resource not found",
            INSTANCE,
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
