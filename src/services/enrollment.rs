use time::PrimitiveDateTime;

use crate::db::models::Course;
use crate::db::types::CourseStatus;

/// Why an enrollment attempt was turned down. Checks run in this order
/// and the first failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnrollmentRejection {
    WindowClosed,
    AlreadyEnrolled,
    CourseFull,
    MissingCorrelatives,
}

pub(crate) struct EnrollmentFacts {
    pub(crate) already_enrolled: bool,
    pub(crate) enrolled_count: i64,
    pub(crate) approved_correlatives: i64,
    pub(crate) required_correlatives: i64,
}

pub(crate) fn inscription_window_open(course: &Course, now: PrimitiveDateTime) -> bool {
    if course.status != CourseStatus::Open {
        return false;
    }
    if let Some(start) = course.enroll_date_start {
        if now < start {
            return false;
        }
    }
    if let Some(end) = course.enroll_date_end {
        if now > end {
            return false;
        }
    }
    true
}

pub(crate) fn check_eligibility(
    course: &Course,
    now: PrimitiveDateTime,
    facts: &EnrollmentFacts,
) -> Result<(), EnrollmentRejection> {
    if !inscription_window_open(course, now) {
        return Err(EnrollmentRejection::WindowClosed);
    }
    if facts.already_enrolled {
        return Err(EnrollmentRejection::AlreadyEnrolled);
    }
    if facts.enrolled_count >= i64::from(course.max_students) {
        return Err(EnrollmentRejection::CourseFull);
    }
    if facts.approved_correlatives < facts.required_correlatives {
        return Err(EnrollmentRejection::MissingCorrelatives);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn course(status: CourseStatus, max_students: i32) -> Course {
        Course {
            id: "c1".to_string(),
            name: "Algebra".to_string(),
            description: "Linear algebra".to_string(),
            max_students,
            course_start_date: datetime!(2025-03-01 00:00),
            course_end_date: datetime!(2025-07-01 00:00),
            enroll_date_start: Some(datetime!(2025-02-01 00:00)),
            enroll_date_end: Some(datetime!(2025-02-28 00:00)),
            creator_id: "t1".to_string(),
            creator_name: "Prof. Rivera".to_string(),
            background: None,
            status,
            created_at: datetime!(2025-01-01 00:00),
            updated_at: datetime!(2025-01-01 00:00),
        }
    }

    fn clean_facts() -> EnrollmentFacts {
        EnrollmentFacts {
            already_enrolled: false,
            enrolled_count: 0,
            approved_correlatives: 0,
            required_correlatives: 0,
        }
    }

    #[test]
    fn eligible_inside_window() {
        let course = course(CourseStatus::Open, 10);
        let now = datetime!(2025-02-15 12:00);
        assert_eq!(check_eligibility(&course, now, &clean_facts()), Ok(()));
    }

    #[test]
    fn window_not_yet_open() {
        let course = course(CourseStatus::Open, 10);
        let now = datetime!(2025-01-15 12:00);
        assert_eq!(
            check_eligibility(&course, now, &clean_facts()),
            Err(EnrollmentRejection::WindowClosed)
        );
    }

    #[test]
    fn window_already_over() {
        let course = course(CourseStatus::Open, 10);
        let now = datetime!(2025-03-15 12:00);
        assert_eq!(
            check_eligibility(&course, now, &clean_facts()),
            Err(EnrollmentRejection::WindowClosed)
        );
    }

    #[test]
    fn closed_course_never_enrollable() {
        let course = course(CourseStatus::Closed, 10);
        let now = datetime!(2025-02-15 12:00);
        assert_eq!(
            check_eligibility(&course, now, &clean_facts()),
            Err(EnrollmentRejection::WindowClosed)
        );
    }

    #[test]
    fn missing_window_bounds_mean_always_open() {
        let mut course = course(CourseStatus::Open, 10);
        course.enroll_date_start = None;
        course.enroll_date_end = None;
        let now = datetime!(2026-01-01 00:00);
        assert_eq!(check_eligibility(&course, now, &clean_facts()), Ok(()));
    }

    #[test]
    fn duplicate_enrollment_rejected() {
        let course = course(CourseStatus::Open, 10);
        let now = datetime!(2025-02-15 12:00);
        let facts = EnrollmentFacts { already_enrolled: true, ..clean_facts() };
        assert_eq!(
            check_eligibility(&course, now, &facts),
            Err(EnrollmentRejection::AlreadyEnrolled)
        );
    }

    #[test]
    fn full_course_rejected() {
        let course = course(CourseStatus::Open, 2);
        let now = datetime!(2025-02-15 12:00);
        let facts = EnrollmentFacts { enrolled_count: 2, ..clean_facts() };
        assert_eq!(check_eligibility(&course, now, &facts), Err(EnrollmentRejection::CourseFull));
    }

    #[test]
    fn missing_correlatives_rejected() {
        let course = course(CourseStatus::Open, 10);
        let now = datetime!(2025-02-15 12:00);
        let facts = EnrollmentFacts {
            approved_correlatives: 1,
            required_correlatives: 2,
            ..clean_facts()
        };
        assert_eq!(
            check_eligibility(&course, now, &facts),
            Err(EnrollmentRejection::MissingCorrelatives)
        );
    }

    #[test]
    fn rejection_order_window_beats_duplicate_and_capacity() {
        let course = course(CourseStatus::Closed, 1);
        let now = datetime!(2025-02-15 12:00);
        let facts = EnrollmentFacts {
            already_enrolled: true,
            enrolled_count: 5,
            approved_correlatives: 0,
            required_correlatives: 3,
        };
        assert_eq!(
            check_eligibility(&course, now, &facts),
            Err(EnrollmentRejection::WindowClosed)
        );
    }
}
