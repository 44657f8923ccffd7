use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{CourseFeedback, StudentFeedback};

#[derive(Debug, Deserialize)]
pub(crate) struct CourseFeedbackCreate {
    pub(crate) course_id: Option<String>,
    pub(crate) feedback: Option<String>,
    #[serde(default)]
    pub(crate) rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseFeedbackResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) feedback: String,
    pub(crate) rating: Option<i32>,
    pub(crate) created_at: String,
}

impl CourseFeedbackResponse {
    pub(crate) fn from_db(feedback: CourseFeedback) -> Self {
        Self {
            id: feedback.id,
            course_id: feedback.course_id,
            feedback: feedback.feedback,
            rating: feedback.rating,
            created_at: format_primitive(feedback.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentFeedbackCreate {
    pub(crate) student_id: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentFeedbackResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) teacher_id: String,
    pub(crate) feedback: String,
    pub(crate) created_at: String,
}

impl StudentFeedbackResponse {
    pub(crate) fn from_db(feedback: StudentFeedback) -> Self {
        Self {
            id: feedback.id,
            student_id: feedback.student_id,
            course_id: feedback.course_id,
            teacher_id: feedback.teacher_id,
            feedback: feedback.feedback,
            created_at: format_primitive(feedback.created_at),
        }
    }
}
