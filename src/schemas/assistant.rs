use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::CourseAssistant;

#[derive(Debug, Deserialize)]
pub(crate) struct AssistantCreate {
    pub(crate) assistant_id: Option<String>,
    pub(crate) owner_id: Option<String>,
    #[serde(default)]
    pub(crate) permissions: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssistantUpdate {
    pub(crate) owner_id: Option<String>,
    pub(crate) permissions: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssistantResponse {
    pub(crate) course_id: String,
    pub(crate) assistant_id: String,
    pub(crate) permissions: AssistantPermissions,
    pub(crate) added_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssistantPermissions {
    pub(crate) modules_and_resources: bool,
    pub(crate) exams: bool,
    pub(crate) tasks: bool,
    pub(crate) feedbacks: bool,
}

impl AssistantResponse {
    pub(crate) fn from_db(assistant: CourseAssistant) -> Self {
        Self {
            course_id: assistant.course_id,
            assistant_id: assistant.assistant_id,
            permissions: AssistantPermissions {
                modules_and_resources: assistant.can_modules_and_resources,
                exams: assistant.can_exams,
                tasks: assistant.can_tasks,
                feedbacks: assistant.can_feedbacks,
            },
            added_at: format_primitive(assistant.added_at),
        }
    }
}
