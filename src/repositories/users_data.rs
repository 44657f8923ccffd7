use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{ApprovedCourse, Course, CourseAssistant};

const COURSE_COLUMNS: &str = "id, name, description, max_students, course_start_date, \
     course_end_date, enroll_date_start, enroll_date_end, creator_id, creator_name, \
     background, status, created_at, updated_at";
const ASSISTANT_COLUMNS: &str = "course_id, assistant_id, can_modules_and_resources, can_exams, \
     can_tasks, can_feedbacks, added_at";

#[derive(Debug, Clone, Default)]
pub(crate) struct AssistantFlags {
    pub(crate) modules_and_resources: bool,
    pub(crate) exams: bool,
    pub(crate) tasks: bool,
    pub(crate) feedbacks: bool,
}

impl AssistantFlags {
    pub(crate) fn from_row(row: &CourseAssistant) -> Self {
        Self {
            modules_and_resources: row.can_modules_and_resources,
            exams: row.can_exams,
            tasks: row.can_tasks,
            feedbacks: row.can_feedbacks,
        }
    }
}

pub(crate) async fn add_favourite(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
    added_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO favourite_courses (student_id, course_id, added_at)
         VALUES ($1, $2, $3)
         ON CONFLICT DO NOTHING",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(added_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn remove_favourite(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM favourite_courses WHERE student_id = $1 AND course_id = $2")
            .bind(student_id)
            .bind(course_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_favourites(
    pool: &PgPool,
    student_id: &str,
    offset: i64,
    limit: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE id IN (SELECT course_id FROM favourite_courses WHERE student_id = $1)
         ORDER BY created_at DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(student_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_favourites(pool: &PgPool, student_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM favourite_courses WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn search_favourites(
    pool: &PgPool,
    student_id: &str,
    query: &str,
    offset: i64,
    limit: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE id IN (SELECT course_id FROM favourite_courses WHERE student_id = $1)
           AND (name ILIKE $2 OR description ILIKE $2 OR creator_name ILIKE $2)
         ORDER BY created_at DESC
         OFFSET $3 LIMIT $4"
    ))
    .bind(student_id)
    .bind(pattern)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Approval and the roster removal are one atomic step.
pub(crate) async fn approve_student(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
    final_grade: Option<f64>,
    approved_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO approved_courses (student_id, course_id, final_grade, approved_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (student_id, course_id)
         DO UPDATE SET final_grade = EXCLUDED.final_grade,
                       approved_at = EXCLUDED.approved_at",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(final_grade)
    .bind(approved_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM course_students WHERE course_id = $1 AND student_id = $2")
        .bind(course_id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

pub(crate) async fn find_approval(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
) -> Result<Option<ApprovedCourse>, sqlx::Error> {
    sqlx::query_as::<_, ApprovedCourse>(
        "SELECT student_id, course_id, final_grade, approved_at
         FROM approved_courses
         WHERE course_id = $1 AND student_id = $2",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_approved_among(
    pool: &PgPool,
    student_id: &str,
    course_ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM approved_courses
         WHERE student_id = $1 AND course_id = ANY($2)",
    )
    .bind(student_id)
    .bind(course_ids)
    .fetch_one(pool)
    .await
}

pub(crate) async fn create_assistant(
    pool: &PgPool,
    course_id: &str,
    assistant_id: &str,
    flags: AssistantFlags,
    added_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO course_assistants (
            course_id, assistant_id, can_modules_and_resources, can_exams,
            can_tasks, can_feedbacks, added_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         ON CONFLICT DO NOTHING",
    )
    .bind(course_id)
    .bind(assistant_id)
    .bind(flags.modules_and_resources)
    .bind(flags.exams)
    .bind(flags.tasks)
    .bind(flags.feedbacks)
    .bind(added_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn update_assistant(
    pool: &PgPool,
    course_id: &str,
    assistant_id: &str,
    flags: AssistantFlags,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE course_assistants SET
            can_modules_and_resources = $1,
            can_exams = $2,
            can_tasks = $3,
            can_feedbacks = $4
         WHERE course_id = $5 AND assistant_id = $6",
    )
    .bind(flags.modules_and_resources)
    .bind(flags.exams)
    .bind(flags.tasks)
    .bind(flags.feedbacks)
    .bind(course_id)
    .bind(assistant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_assistant(
    pool: &PgPool,
    course_id: &str,
    assistant_id: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM course_assistants WHERE course_id = $1 AND assistant_id = $2")
            .bind(course_id)
            .bind(assistant_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_assistant(
    pool: &PgPool,
    course_id: &str,
    assistant_id: &str,
) -> Result<Option<CourseAssistant>, sqlx::Error> {
    sqlx::query_as::<_, CourseAssistant>(&format!(
        "SELECT {ASSISTANT_COLUMNS} FROM course_assistants
         WHERE course_id = $1 AND assistant_id = $2"
    ))
    .bind(course_id)
    .bind(assistant_id)
    .fetch_optional(pool)
    .await
}
