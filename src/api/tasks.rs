use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::{titles, ApiError};
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::now_ms;
use crate::db::models::Task;
use crate::db::types::{TaskKind, TaskStatus};
use crate::repositories::{courses as courses_repo, tasks as tasks_repo};
use crate::schemas::task::{
    CorrectorAssignRequest, CourseTasksQuery, RequesterQuery, StudentTaskResponse,
    StudentTasksQuery, SubmissionFeedbackRequest, SubmissionFeedbackResponse, SubmissionResponse,
    SubmitRequest, TaskCreate, TaskResponse, TaskUpdate, UploadedAttachment,
};
use crate::services::authorization::{authorize, Capability};
use crate::services::task_status;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_task))
        .route("/course/:course_id", get(list_course_tasks))
        .route("/teacher/:teacher_id", get(list_teacher_tasks))
        .route("/student/:student_id", get(list_student_tasks))
        .route("/:task_id", get(get_task).put(update_task).delete(delete_task))
        .route("/:task_id/submit", post(submit))
        .route("/:task_id/upload", post(upload_attachment))
        .route("/:task_id/submissions", get(list_submissions))
        .route(
            "/:task_id/submissions/:student_id/corrector",
            put(assign_corrector).delete(unassign_corrector),
        )
        .route(
            "/:task_id/submissions/:student_id/feedback",
            post(leave_feedback).get(list_feedbacks),
        )
}

fn capability_for(kind: TaskKind) -> Capability {
    match kind {
        TaskKind::Task => Capability::Tasks,
        TaskKind::Exam => Capability::Exams,
    }
}

async fn require_task_capability(
    state: &AppState,
    course_id: &str,
    user_id: &str,
    kind: TaskKind,
    instance: &'static str,
) -> Result<(), ApiError> {
    let course = courses_repo::find_by_id(state.db(), course_id)
        .await
        .map_err(|err| ApiError::internal(err, instance))?
        .ok_or_else(|| ApiError::course_not_found(instance))?;

    let allowed = authorize(state.db(), course_id, &course.creator_id, user_id, capability_for(kind))
        .await
        .map_err(|err| ApiError::internal(err, instance))?;

    if !allowed {
        return Err(ApiError::unauthorized("User may not manage tasks of this course", instance));
    }
    Ok(())
}

async fn fetch_task(
    state: &AppState,
    task_id: &str,
    instance: &'static str,
) -> Result<Task, ApiError> {
    tasks_repo::find_by_id(state.db(), task_id)
        .await
        .map_err(|err| ApiError::internal(err, instance))?
        .ok_or_else(|| ApiError::not_found(titles::TASK_NOT_FOUND, "Task not found", instance))
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskCreate>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    const INSTANCE: &str = "create_task";

    let mut missing = Vec::new();
    if payload.title.as_deref().map_or(true, str::is_empty) {
        missing.push("title");
    }
    if payload.due_date.is_none() {
        missing.push("due_date");
    }
    if payload.course_id.as_deref().map_or(true, str::is_empty) {
        missing.push("course_id");
    }
    if payload.creator_id.as_deref().map_or(true, str::is_empty) {
        missing.push("creator_id");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let course_id = payload.course_id.as_deref().unwrap_or_default();
    let creator_id = payload.creator_id.as_deref().unwrap_or_default();
    let kind = payload.task_type.unwrap_or(TaskKind::Task);

    require_task_capability(&state, course_id, creator_id, kind, INSTANCE).await?;

    let id = Uuid::new_v4().to_string();
    let task = tasks_repo::create(
        state.db(),
        tasks_repo::CreateTask {
            id: &id,
            course_id,
            module_id: payload.module_id.as_deref(),
            title: payload.title.as_deref().unwrap_or_default(),
            description: payload.description.as_deref().unwrap_or_default(),
            instructions: payload.instructions.as_deref().unwrap_or_default(),
            kind,
            status: TaskStatus::Open,
            due_date_ms: payload.due_date.unwrap_or_default(),
            attachments: payload.attachments.unwrap_or_default(),
            created_at_ms: now_ms(),
        },
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from_db(task))))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    const INSTANCE: &str = "get_task";
    let task = fetch_task(&state, &task_id, INSTANCE).await?;
    Ok(Json(TaskResponse::from_db(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<TaskResponse>, ApiError> {
    const INSTANCE: &str = "update_task";

    let Some(editor_id) = payload.editor_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Field 'editor_id' is required", INSTANCE));
    };

    let task = fetch_task(&state, &task_id, INSTANCE).await?;
    require_task_capability(&state, &task.course_id, &editor_id, task.kind, INSTANCE).await?;

    let update = tasks_repo::UpdateTask {
        title: payload.title,
        description: payload.description,
        instructions: payload.instructions,
        kind: payload.task_type,
        status: payload.status,
        due_date_ms: payload.due_date,
        attachments: payload.attachments,
        updated_at_ms: now_ms(),
    };
    if update.is_empty() {
        return Err(ApiError::missing_fields("No updatable fields provided", INSTANCE));
    }

    tasks_repo::update(state.db(), &task_id, update)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    let task = fetch_task(&state, &task_id, INSTANCE).await?;
    Ok(Json(TaskResponse::from_db(task)))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<RequesterQuery>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "delete_task";

    let Some(editor_id) = query.requester_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'requester_id' is required", INSTANCE));
    };

    let task = fetch_task(&state, &task_id, INSTANCE).await?;
    require_task_capability(&state, &task.course_id, &editor_id, task.kind, INSTANCE).await?;

    tasks_repo::delete(state.db(), &task_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_course_tasks(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<CourseTasksQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, ApiError> {
    const INSTANCE: &str = "get_course_tasks";

    courses_repo::find_by_id(state.db(), &course_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| ApiError::course_not_found(INSTANCE))?;

    let page = PageQuery { offset: query.offset, max_per_page: query.max_per_page };
    let (offset, limit) = page.clamp();
    let filter = tasks_repo::TaskFilter {
        status: query.status,
        due_after_ms: query.due_after,
        due_before_ms: query.due_before,
    };

    let tasks = tasks_repo::list_by_course(state.db(), &course_id, &filter, offset, limit)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let total_count = tasks_repo::count_by_course(state.db(), &course_id, &filter)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(PaginatedResponse {
        items: tasks.into_iter().map(TaskResponse::from_db).collect(),
        total_count,
        offset,
        max_per_page: limit,
    }))
}

async fn list_teacher_tasks(
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<TaskResponse>>, ApiError> {
    const INSTANCE: &str = "get_teacher_tasks";

    let (offset, limit) = page.clamp();
    let tasks = tasks_repo::list_by_teacher(state.db(), &teacher_id, offset, limit)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    let total_count = tasks_repo::count_by_teacher(state.db(), &teacher_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(PaginatedResponse {
        items: tasks.into_iter().map(TaskResponse::from_db).collect(),
        total_count,
        offset,
        max_per_page: limit,
    }))
}

async fn list_student_tasks(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(query): Query<StudentTasksQuery>,
) -> Result<Json<Vec<StudentTaskResponse>>, ApiError> {
    const INSTANCE: &str = "get_student_tasks";

    let tasks = tasks_repo::list_for_student(state.db(), &student_id, query.course_id.as_deref())
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    let now = now_ms();
    let mut response = Vec::with_capacity(tasks.len());
    for task in tasks {
        let submission = tasks_repo::find_submission(state.db(), &task.id, &student_id)
            .await
            .map_err(|err| ApiError::internal(err, INSTANCE))?;
        let student_status = task_status::derive(now, task.due_date_ms, submission.is_some());
        response.push(StudentTaskResponse {
            task: TaskResponse::from_db(task),
            student_status,
            submission: submission.map(SubmissionResponse::from_db),
        });
    }

    Ok(Json(response))
}

async fn submit(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    const INSTANCE: &str = "submit_task";

    let Some(student_id) = payload.student_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Field 'student_id' is required", INSTANCE));
    };

    let task = fetch_task(&state, &task_id, INSTANCE).await?;
    if task.status == TaskStatus::Inactive {
        return Err(ApiError::invalid_field("Task is not accepting submissions", INSTANCE));
    }

    let enrolled = courses_repo::is_enrolled(state.db(), &task.course_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;
    if !enrolled {
        return Err(ApiError::bad_request(
            titles::USER_NOT_ENROLLED,
            "Student is not enrolled into the course",
            INSTANCE,
        ));
    }

    let submitted_at = now_ms();
    let submission = tasks_repo::upsert_submission(
        state.db(),
        &task_id,
        &student_id,
        payload.attachments.unwrap_or_default(),
        submitted_at <= task.due_date_ms,
        submitted_at,
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(SubmissionResponse::from_db(submission)))
}

async fn upload_attachment(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedAttachment>), ApiError> {
    const INSTANCE: &str = "upload_attachment";

    let Some(storage) = state.storage() else {
        return Err(ApiError::storage_disabled(INSTANCE));
    };

    let task = fetch_task(&state, &task_id, INSTANCE).await?;

    let (filename, content_type, bytes) = read_upload(multipart, INSTANCE).await?;

    let extension = filename.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    let allowed = &state.settings().storage().allowed_attachment_extensions;
    if !allowed.iter().any(|candidate| candidate == &extension) {
        return Err(ApiError::invalid_field(
            format!("File extension '{extension}' is not allowed"),
            INSTANCE,
        ));
    }

    let max_bytes = state.settings().storage().max_upload_size_mb * 1024 * 1024;
    if bytes.len() as u64 > max_bytes {
        return Err(ApiError::invalid_field("File exceeds the maximum upload size", INSTANCE));
    }

    let prefix = format!("tasks/{}", task.id);
    let url = storage
        .upload_attachment(&prefix, &filename, &content_type, bytes)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((
        StatusCode::CREATED,
        Json(UploadedAttachment { title: filename, url, mimetype: content_type }),
    ))
}

async fn read_upload(
    mut multipart: Multipart,
    instance: &'static str,
) -> Result<(String, String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::invalid_field(err.to_string(), instance))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::missing_fields("File part must carry a filename", instance))?;
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::invalid_field(err.to_string(), instance))?;
        return Ok((filename, content_type, bytes.to_vec()));
    }

    Err(ApiError::missing_fields("Multipart field 'file' is required", instance))
}

async fn list_submissions(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    const INSTANCE: &str = "get_task_submissions";

    fetch_task(&state, &task_id, INSTANCE).await?;

    let submissions = tasks_repo::list_submissions(state.db(), &task_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(submissions.into_iter().map(SubmissionResponse::from_db).collect()))
}

async fn assign_corrector(
    State(state): State<AppState>,
    Path((task_id, student_id)): Path<(String, String)>,
    Json(payload): Json<CorrectorAssignRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    const INSTANCE: &str = "assign_corrector";

    let mut missing = Vec::new();
    if payload.corrector_id.as_deref().map_or(true, str::is_empty) {
        missing.push("corrector_id");
    }
    if payload.requester_id.as_deref().map_or(true, str::is_empty) {
        missing.push("requester_id");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let corrector_id = payload.corrector_id.as_deref().unwrap_or_default();
    let requester_id = payload.requester_id.as_deref().unwrap_or_default();

    let task = fetch_task(&state, &task_id, INSTANCE).await?;
    require_task_capability(&state, &task.course_id, requester_id, task.kind, INSTANCE).await?;

    let submission = tasks_repo::find_submission(state.db(), &task_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::SUBMISSION_NOT_FOUND, "Submission not found", INSTANCE)
        })?;

    match submission.corrector_id.as_deref() {
        Some(current) if current == corrector_id => {}
        Some(_) => {
            return Err(ApiError::conflict(
                titles::CORRECTOR_ALREADY_ASSIGNED,
                "Another corrector is already assigned to this submission",
                INSTANCE,
            ));
        }
        None => {
            tasks_repo::set_corrector(state.db(), &task_id, &student_id, Some(corrector_id))
                .await
                .map_err(|err| ApiError::internal(err, INSTANCE))?;
        }
    }

    let submission = tasks_repo::find_submission(state.db(), &task_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::SUBMISSION_NOT_FOUND, "Submission not found", INSTANCE)
        })?;

    Ok(Json(SubmissionResponse::from_db(submission)))
}

async fn unassign_corrector(
    State(state): State<AppState>,
    Path((task_id, student_id)): Path<(String, String)>,
    Query(query): Query<RequesterQuery>,
) -> Result<StatusCode, ApiError> {
    const INSTANCE: &str = "unassign_corrector";

    let Some(requester_id) = query.requester_id.filter(|value| !value.is_empty()) else {
        return Err(ApiError::missing_fields("Query parameter 'requester_id' is required", INSTANCE));
    };

    let task = fetch_task(&state, &task_id, INSTANCE).await?;
    require_task_capability(&state, &task.course_id, &requester_id, task.kind, INSTANCE).await?;

    tasks_repo::find_submission(state.db(), &task_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::SUBMISSION_NOT_FOUND, "Submission not found", INSTANCE)
        })?;

    tasks_repo::set_corrector(state.db(), &task_id, &student_id, None)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn leave_feedback(
    State(state): State<AppState>,
    Path((task_id, student_id)): Path<(String, String)>,
    Json(payload): Json<SubmissionFeedbackRequest>,
) -> Result<(StatusCode, Json<SubmissionFeedbackResponse>), ApiError> {
    const INSTANCE: &str = "leave_submission_feedback";

    let mut missing = Vec::new();
    if payload.corrector_id.as_deref().map_or(true, str::is_empty) {
        missing.push("corrector_id");
    }
    if payload.comment.as_deref().map_or(true, str::is_empty) {
        missing.push("comment");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(
            format!("Missing required fields: {}", missing.join(", ")),
            INSTANCE,
        ));
    }

    let corrector_id = payload.corrector_id.as_deref().unwrap_or_default();

    fetch_task(&state, &task_id, INSTANCE).await?;

    let submission = tasks_repo::find_submission(state.db(), &task_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?
        .ok_or_else(|| {
            ApiError::not_found(titles::SUBMISSION_NOT_FOUND, "Submission not found", INSTANCE)
        })?;

    if submission.corrector_id.as_deref() != Some(corrector_id) {
        return Err(ApiError::unauthorized(
            "Only the assigned corrector may leave feedback",
            INSTANCE,
        ));
    }

    let feedback = tasks_repo::upsert_feedback(
        state.db(),
        &task_id,
        &student_id,
        corrector_id,
        payload.grade,
        payload.comment.as_deref().unwrap_or_default(),
        now_ms(),
    )
    .await
    .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok((StatusCode::CREATED, Json(SubmissionFeedbackResponse::from_db(feedback))))
}

async fn list_feedbacks(
    State(state): State<AppState>,
    Path((task_id, student_id)): Path<(String, String)>,
) -> Result<Json<Vec<SubmissionFeedbackResponse>>, ApiError> {
    const INSTANCE: &str = "get_submission_feedbacks";

    fetch_task(&state, &task_id, INSTANCE).await?;

    let feedbacks = tasks_repo::list_feedbacks(state.db(), &task_id, &student_id)
        .await
        .map_err(|err| ApiError::internal(err, INSTANCE))?;

    Ok(Json(feedbacks.into_iter().map(SubmissionFeedbackResponse::from_db).collect()))
}
