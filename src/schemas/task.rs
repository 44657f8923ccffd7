use serde::{Deserialize, Serialize};

use crate::db::models::{SubmissionFeedback, Task, TaskSubmission};
use crate::db::types::{StudentTaskStatus, TaskKind, TaskStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct TaskCreate {
    pub(crate) title: Option<String>,
    pub(crate) due_date: Option<i64>,
    pub(crate) course_id: Option<String>,
    pub(crate) creator_id: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) instructions: Option<String>,
    #[serde(default)]
    pub(crate) module_id: Option<String>,
    #[serde(default)]
    pub(crate) task_type: Option<TaskKind>,
    #[serde(default)]
    pub(crate) attachments: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskUpdate {
    pub(crate) editor_id: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) instructions: Option<String>,
    #[serde(default)]
    pub(crate) due_date: Option<i64>,
    #[serde(default)]
    pub(crate) task_type: Option<TaskKind>,
    #[serde(default)]
    pub(crate) status: Option<TaskStatus>,
    #[serde(default)]
    pub(crate) attachments: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) module_id: Option<String>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) instructions: String,
    pub(crate) task_type: TaskKind,
    pub(crate) status: TaskStatus,
    pub(crate) due_date: i64,
    pub(crate) attachments: Vec<serde_json::Value>,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}

impl TaskResponse {
    pub(crate) fn from_db(task: Task) -> Self {
        Self {
            id: task.id,
            course_id: task.course_id,
            module_id: task.module_id,
            title: task.title,
            description: task.description,
            instructions: task.instructions,
            task_type: task.kind,
            status: task.status,
            due_date: task.due_date_ms,
            attachments: task.attachments.0,
            created_at: task.created_at_ms,
            updated_at: task.updated_at_ms,
        }
    }
}

/// Task as a student sees it: the derived status plus only that
/// student's submission.
#[derive(Debug, Serialize)]
pub(crate) struct StudentTaskResponse {
    #[serde(flatten)]
    pub(crate) task: TaskResponse,
    pub(crate) student_status: StudentTaskStatus,
    pub(crate) submission: Option<SubmissionResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) attachments: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) task_id: String,
    pub(crate) student_id: String,
    pub(crate) attachments: Vec<serde_json::Value>,
    pub(crate) on_time: bool,
    pub(crate) corrector_id: Option<String>,
    pub(crate) submitted_at: i64,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: TaskSubmission) -> Self {
        Self {
            task_id: submission.task_id,
            student_id: submission.student_id,
            attachments: submission.attachments.0,
            on_time: submission.on_time,
            corrector_id: submission.corrector_id,
            submitted_at: submission.submitted_at_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CorrectorAssignRequest {
    pub(crate) corrector_id: Option<String>,
    pub(crate) requester_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequesterQuery {
    pub(crate) requester_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionFeedbackRequest {
    pub(crate) corrector_id: Option<String>,
    #[serde(default)]
    pub(crate) grade: Option<f64>,
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionFeedbackResponse {
    pub(crate) task_id: String,
    pub(crate) student_id: String,
    pub(crate) corrector_id: String,
    pub(crate) grade: Option<f64>,
    pub(crate) comment: String,
    pub(crate) created_at: i64,
}

impl SubmissionFeedbackResponse {
    pub(crate) fn from_db(feedback: SubmissionFeedback) -> Self {
        Self {
            task_id: feedback.task_id,
            student_id: feedback.student_id,
            corrector_id: feedback.corrector_id,
            grade: feedback.grade,
            comment: feedback.comment,
            created_at: feedback.created_at_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseTasksQuery {
    #[serde(default)]
    pub(crate) status: Option<TaskStatus>,
    #[serde(default)]
    pub(crate) due_after: Option<i64>,
    #[serde(default)]
    pub(crate) due_before: Option<i64>,
    #[serde(default)]
    pub(crate) offset: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) max_per_page: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentTasksQuery {
    #[serde(default)]
    pub(crate) course_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadedAttachment {
    pub(crate) title: String,
    pub(crate) url: String,
    pub(crate) mimetype: String,
}
