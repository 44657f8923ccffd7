use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Course;
use crate::db::types::{CourseStatus, TaskStatus};

const COURSE_COLUMNS: &str = "id, name, description, max_students, course_start_date, \
     course_end_date, enroll_date_start, enroll_date_end, creator_id, creator_name, \
     background, status, created_at, updated_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: &'a str,
    pub(crate) max_students: i32,
    pub(crate) course_start_date: PrimitiveDateTime,
    pub(crate) course_end_date: PrimitiveDateTime,
    pub(crate) enroll_date_start: Option<PrimitiveDateTime>,
    pub(crate) enroll_date_end: Option<PrimitiveDateTime>,
    pub(crate) creator_id: &'a str,
    pub(crate) creator_name: &'a str,
    pub(crate) background: Option<&'a str>,
    pub(crate) correlatives: &'a [String],
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct UpdateCourse {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) max_students: Option<i32>,
    pub(crate) course_start_date: Option<PrimitiveDateTime>,
    pub(crate) course_end_date: Option<PrimitiveDateTime>,
    pub(crate) background: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl UpdateCourse {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.max_students.is_none()
            && self.course_start_date.is_none()
            && self.course_end_date.is_none()
            && self.background.is_none()
    }
}

/// The course row and its correlative rows commit together.
pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, name, description, max_students, course_start_date, course_end_date,
            enroll_date_start, enroll_date_end, creator_id, creator_name, background,
            status, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,'open',$12,$12)
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.max_students)
    .bind(params.course_start_date)
    .bind(params.course_end_date)
    .bind(params.enroll_date_start)
    .bind(params.enroll_date_end)
    .bind(params.creator_id)
    .bind(params.creator_name)
    .bind(params.background)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    for correlative_id in params.correlatives {
        sqlx::query(
            "INSERT INTO course_correlatives (course_id, correlative_course_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(&course.id)
        .bind(correlative_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(course)
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_paginated(
    pool: &PgPool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         ORDER BY created_at DESC
         OFFSET $1 LIMIT $2"
    ))
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses").fetch_one(pool).await
}

pub(crate) async fn search(pool: &PgPool, query: &str) -> Result<Vec<Course>, sqlx::Error> {
    let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE name ILIKE $1 OR description ILIKE $1 OR creator_name ILIKE $1
         ORDER BY created_at DESC"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_owned(
    pool: &PgPool,
    creator_id: &str,
    offset: i64,
    limit: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE creator_id = $1
         ORDER BY created_at DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(creator_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_owned(pool: &PgPool, creator_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses WHERE creator_id = $1")
        .bind(creator_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    course_id: &str,
    params: UpdateCourse,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE courses SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            max_students = COALESCE($3, max_students),
            course_start_date = COALESCE($4, course_start_date),
            course_end_date = COALESCE($5, course_end_date),
            background = COALESCE($6, background),
            updated_at = $7
         WHERE id = $8",
    )
    .bind(params.name)
    .bind(params.description)
    .bind(params.max_students)
    .bind(params.course_start_date)
    .bind(params.course_end_date)
    .bind(params.background)
    .bind(params.updated_at)
    .bind(course_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, course_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1").bind(course_id).execute(pool).await?;
    Ok(result.rows_affected())
}

/// Reopening wipes the roster and reactivates the course's tasks; both
/// writes ride the same transaction as the status flip.
pub(crate) async fn reopen(
    pool: &PgPool,
    course_id: &str,
    updated_at: PrimitiveDateTime,
    task_updated_at_ms: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE courses SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(CourseStatus::Open)
        .bind(updated_at)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM course_students WHERE course_id = $1")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE tasks SET status = $1, updated_at_ms = $2 WHERE course_id = $3")
        .bind(TaskStatus::Open)
        .bind(task_updated_at_ms)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

pub(crate) async fn close(
    pool: &PgPool,
    course_id: &str,
    updated_at: PrimitiveDateTime,
    task_updated_at_ms: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE courses SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(CourseStatus::Closed)
        .bind(updated_at)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE tasks SET status = $1, updated_at_ms = $2 WHERE course_id = $3")
        .bind(TaskStatus::Closed)
        .bind(task_updated_at_ms)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

pub(crate) async fn list_correlatives(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT correlative_course_id FROM course_correlatives WHERE course_id = $1",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_students(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT student_id FROM course_students
         WHERE course_id = $1
         ORDER BY enrolled_at",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_students(pool: &PgPool, course_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM course_students WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn is_enrolled(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM course_students WHERE course_id = $1 AND student_id = $2
         )",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn add_student(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
    enrolled_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO course_students (course_id, student_id, enrolled_at)
         VALUES ($1, $2, $3)",
    )
    .bind(course_id)
    .bind(student_id)
    .bind(enrolled_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list_enrolled_courses(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE id IN (SELECT course_id FROM course_students WHERE student_id = $1)
         ORDER BY created_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}
