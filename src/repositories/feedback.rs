use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{CourseFeedback, StudentFeedback};

pub(crate) async fn create_course_feedback(
    pool: &PgPool,
    id: &str,
    course_id: &str,
    feedback: &str,
    rating: Option<i32>,
    created_at: PrimitiveDateTime,
) -> Result<CourseFeedback, sqlx::Error> {
    sqlx::query_as::<_, CourseFeedback>(
        "INSERT INTO course_feedbacks (id, course_id, feedback, rating, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING id, course_id, feedback, rating, created_at",
    )
    .bind(id)
    .bind(course_id)
    .bind(feedback)
    .bind(rating)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_course_feedbacks(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<CourseFeedback>, sqlx::Error> {
    sqlx::query_as::<_, CourseFeedback>(
        "SELECT id, course_id, feedback, rating, created_at
         FROM course_feedbacks
         WHERE course_id = $1
         ORDER BY created_at DESC",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn create_student_feedback(
    pool: &PgPool,
    id: &str,
    student_id: &str,
    course_id: &str,
    teacher_id: &str,
    feedback: &str,
    created_at: PrimitiveDateTime,
) -> Result<StudentFeedback, sqlx::Error> {
    sqlx::query_as::<_, StudentFeedback>(
        "INSERT INTO student_feedbacks (id, student_id, course_id, teacher_id, feedback, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING id, student_id, course_id, teacher_id, feedback, created_at",
    )
    .bind(id)
    .bind(student_id)
    .bind(course_id)
    .bind(teacher_id)
    .bind(feedback)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_student_feedbacks(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<StudentFeedback>, sqlx::Error> {
    sqlx::query_as::<_, StudentFeedback>(
        "SELECT id, student_id, course_id, teacher_id, feedback, created_at
         FROM student_feedbacks
         WHERE student_id = $1 AND course_id = $2
         ORDER BY created_at DESC",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}
