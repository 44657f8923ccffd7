use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Course;
use crate::db::types::CourseStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct CourseCreate {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) creator_id: Option<String>,
    pub(crate) creator_name: Option<String>,
    pub(crate) course_start_date: Option<String>,
    pub(crate) course_end_date: Option<String>,
    pub(crate) max_students: Option<i32>,
    #[serde(default)]
    pub(crate) enroll_date_start: Option<String>,
    #[serde(default)]
    pub(crate) enroll_date_end: Option<String>,
    #[serde(default)]
    pub(crate) correlatives_required_id: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) background: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) course_start_date: Option<String>,
    #[serde(default)]
    pub(crate) course_end_date: Option<String>,
    #[serde(default)]
    pub(crate) max_students: Option<i32>,
    #[serde(default)]
    pub(crate) background: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) max_students: i32,
    pub(crate) course_start_date: String,
    pub(crate) course_end_date: String,
    pub(crate) enroll_date_start: Option<String>,
    pub(crate) enroll_date_end: Option<String>,
    pub(crate) creator_id: String,
    pub(crate) creator_name: String,
    pub(crate) background: Option<String>,
    pub(crate) status: CourseStatus,
    pub(crate) correlatives_required_id: Vec<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course, correlatives: Vec<String>) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            max_students: course.max_students,
            course_start_date: format_primitive(course.course_start_date),
            course_end_date: format_primitive(course.course_end_date),
            enroll_date_start: course.enroll_date_start.map(format_primitive),
            enroll_date_end: course.enroll_date_end.map(format_primitive),
            creator_id: course.creator_id,
            creator_name: course.creator_name,
            background: course.background,
            status: course.status,
            correlatives_required_id: correlatives,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }

    pub(crate) fn bare(course: Course) -> Self {
        Self::from_db(course, Vec::new())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseCreated {
    pub(crate) id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerBody {
    pub(crate) owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerQuery {
    pub(crate) owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollRequest {
    pub(crate) student_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApproveRequest {
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) final_grade: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApprovalResponse {
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) approved: bool,
    pub(crate) final_grade: Option<f64>,
    pub(crate) approved_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentsResponse {
    pub(crate) course_id: String,
    pub(crate) students: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    pub(crate) q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FavouriteRequest {
    pub(crate) course_id: Option<String>,
    pub(crate) student_id: Option<String>,
}
