use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{CourseStatus, TaskKind, TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) max_students: i32,
    pub(crate) course_start_date: PrimitiveDateTime,
    pub(crate) course_end_date: PrimitiveDateTime,
    pub(crate) enroll_date_start: Option<PrimitiveDateTime>,
    pub(crate) enroll_date_end: Option<PrimitiveDateTime>,
    pub(crate) creator_id: String,
    pub(crate) creator_name: String,
    pub(crate) background: Option<String>,
    pub(crate) status: CourseStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Module {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Resource {
    pub(crate) id: String,
    pub(crate) module_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) mimetype: String,
    pub(crate) source: String,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Task {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) module_id: Option<String>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) instructions: String,
    pub(crate) kind: TaskKind,
    pub(crate) status: TaskStatus,
    pub(crate) due_date_ms: i64,
    pub(crate) attachments: Json<Vec<serde_json::Value>>,
    pub(crate) created_at_ms: i64,
    pub(crate) updated_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TaskSubmission {
    pub(crate) task_id: String,
    pub(crate) student_id: String,
    pub(crate) attachments: Json<Vec<serde_json::Value>>,
    pub(crate) on_time: bool,
    pub(crate) corrector_id: Option<String>,
    pub(crate) submitted_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubmissionFeedback {
    pub(crate) task_id: String,
    pub(crate) student_id: String,
    pub(crate) corrector_id: String,
    pub(crate) grade: Option<f64>,
    pub(crate) comment: String,
    pub(crate) created_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseAssistant {
    pub(crate) course_id: String,
    pub(crate) assistant_id: String,
    pub(crate) can_modules_and_resources: bool,
    pub(crate) can_exams: bool,
    pub(crate) can_tasks: bool,
    pub(crate) can_feedbacks: bool,
    pub(crate) added_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseFeedback {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) feedback: String,
    pub(crate) rating: Option<i32>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentFeedback {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) teacher_id: String,
    pub(crate) feedback: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ApprovedCourse {
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) final_grade: Option<f64>,
    pub(crate) approved_at: PrimitiveDateTime,
}
