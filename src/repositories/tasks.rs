use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::{SubmissionFeedback, Task, TaskSubmission};
use crate::db::types::{TaskKind, TaskStatus};

const TASK_COLUMNS: &str = "id, course_id, module_id, title, description, instructions, kind, \
     status, due_date_ms, attachments, created_at_ms, updated_at_ms";
const SUBMISSION_COLUMNS: &str =
    "task_id, student_id, attachments, on_time, corrector_id, submitted_at_ms";
const FEEDBACK_COLUMNS: &str = "task_id, student_id, corrector_id, grade, comment, created_at_ms";

pub(crate) struct CreateTask<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) module_id: Option<&'a str>,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) instructions: &'a str,
    pub(crate) kind: TaskKind,
    pub(crate) status: TaskStatus,
    pub(crate) due_date_ms: i64,
    pub(crate) attachments: Vec<serde_json::Value>,
    pub(crate) created_at_ms: i64,
}

pub(crate) struct UpdateTask {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) instructions: Option<String>,
    pub(crate) kind: Option<TaskKind>,
    pub(crate) status: Option<TaskStatus>,
    pub(crate) due_date_ms: Option<i64>,
    pub(crate) attachments: Option<Vec<serde_json::Value>>,
    pub(crate) updated_at_ms: i64,
}

impl UpdateTask {
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.instructions.is_none()
            && self.kind.is_none()
            && self.status.is_none()
            && self.due_date_ms.is_none()
            && self.attachments.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TaskFilter {
    pub(crate) status: Option<TaskStatus>,
    pub(crate) due_after_ms: Option<i64>,
    pub(crate) due_before_ms: Option<i64>,
}

pub(crate) async fn create(pool: &PgPool, params: CreateTask<'_>) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (
            id, course_id, module_id, title, description, instructions, kind, status,
            due_date_ms, attachments, created_at_ms, updated_at_ms
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.module_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.instructions)
    .bind(params.kind)
    .bind(params.status)
    .bind(params.due_date_ms)
    .bind(Json(params.attachments))
    .bind(params.created_at_ms)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, task_id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
        .bind(task_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    task_id: &str,
    params: UpdateTask,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE tasks SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            instructions = COALESCE($3, instructions),
            kind = COALESCE($4, kind),
            status = COALESCE($5, status),
            due_date_ms = COALESCE($6, due_date_ms),
            attachments = COALESCE($7, attachments),
            updated_at_ms = $8
         WHERE id = $9",
    )
    .bind(params.title)
    .bind(params.description)
    .bind(params.instructions)
    .bind(params.kind)
    .bind(params.status)
    .bind(params.due_date_ms)
    .bind(params.attachments.map(Json))
    .bind(params.updated_at_ms)
    .bind(task_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, task_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1").bind(task_id).execute(pool).await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
    filter: &TaskFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE course_id = $1
           AND ($2::taskstatus IS NULL OR status = $2)
           AND ($3::bigint IS NULL OR due_date_ms >= $3)
           AND ($4::bigint IS NULL OR due_date_ms <= $4)
         ORDER BY due_date_ms
         OFFSET $5 LIMIT $6"
    ))
    .bind(course_id)
    .bind(filter.status)
    .bind(filter.due_after_ms)
    .bind(filter.due_before_ms)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_course(
    pool: &PgPool,
    course_id: &str,
    filter: &TaskFilter,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tasks
         WHERE course_id = $1
           AND ($2::taskstatus IS NULL OR status = $2)
           AND ($3::bigint IS NULL OR due_date_ms >= $3)
           AND ($4::bigint IS NULL OR due_date_ms <= $4)",
    )
    .bind(course_id)
    .bind(filter.status)
    .bind(filter.due_after_ms)
    .bind(filter.due_before_ms)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_teacher(
    pool: &PgPool,
    teacher_id: &str,
    offset: i64,
    limit: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE course_id IN (SELECT id FROM courses WHERE creator_id = $1)
         ORDER BY due_date_ms
         OFFSET $2 LIMIT $3"
    ))
    .bind(teacher_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_teacher(pool: &PgPool, teacher_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tasks
         WHERE course_id IN (SELECT id FROM courses WHERE creator_id = $1)",
    )
    .bind(teacher_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
    course_id: Option<&str>,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE course_id IN (SELECT course_id FROM course_students WHERE student_id = $1)
           AND ($2::text IS NULL OR course_id = $2)
         ORDER BY due_date_ms"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Resubmission replaces the attachments but keeps any assigned corrector.
pub(crate) async fn upsert_submission(
    pool: &PgPool,
    task_id: &str,
    student_id: &str,
    attachments: Vec<serde_json::Value>,
    on_time: bool,
    submitted_at_ms: i64,
) -> Result<TaskSubmission, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(&format!(
        "INSERT INTO task_submissions (
            task_id, student_id, attachments, on_time, submitted_at_ms
         ) VALUES ($1,$2,$3,$4,$5)
         ON CONFLICT (task_id, student_id)
         DO UPDATE SET attachments = EXCLUDED.attachments,
                       on_time = EXCLUDED.on_time,
                       submitted_at_ms = EXCLUDED.submitted_at_ms
         RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(task_id)
    .bind(student_id)
    .bind(Json(attachments))
    .bind(on_time)
    .bind(submitted_at_ms)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_submission(
    pool: &PgPool,
    task_id: &str,
    student_id: &str,
) -> Result<Option<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM task_submissions
         WHERE task_id = $1 AND student_id = $2"
    ))
    .bind(task_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_submissions(
    pool: &PgPool,
    task_id: &str,
) -> Result<Vec<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM task_submissions
         WHERE task_id = $1
         ORDER BY submitted_at_ms"
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_corrector(
    pool: &PgPool,
    task_id: &str,
    student_id: &str,
    corrector_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE task_submissions SET corrector_id = $1
         WHERE task_id = $2 AND student_id = $3",
    )
    .bind(corrector_id)
    .bind(task_id)
    .bind(student_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn upsert_feedback(
    pool: &PgPool,
    task_id: &str,
    student_id: &str,
    corrector_id: &str,
    grade: Option<f64>,
    comment: &str,
    created_at_ms: i64,
) -> Result<SubmissionFeedback, sqlx::Error> {
    sqlx::query_as::<_, SubmissionFeedback>(&format!(
        "INSERT INTO submission_feedbacks (
            task_id, student_id, corrector_id, grade, comment, created_at_ms
         ) VALUES ($1,$2,$3,$4,$5,$6)
         ON CONFLICT (task_id, student_id, corrector_id)
         DO UPDATE SET grade = EXCLUDED.grade,
                       comment = EXCLUDED.comment,
                       created_at_ms = EXCLUDED.created_at_ms
         RETURNING {FEEDBACK_COLUMNS}"
    ))
    .bind(task_id)
    .bind(student_id)
    .bind(corrector_id)
    .bind(grade)
    .bind(comment)
    .bind(created_at_ms)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_feedbacks(
    pool: &PgPool,
    task_id: &str,
    student_id: &str,
) -> Result<Vec<SubmissionFeedback>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionFeedback>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM submission_feedbacks
         WHERE task_id = $1 AND student_id = $2
         ORDER BY created_at_ms"
    ))
    .bind(task_id)
    .bind(student_id)
    .fetch_all(pool)
    .await
}
