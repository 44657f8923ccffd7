use crate::db::types::StudentTaskStatus;

/// Pure function of the clock, the deadline and whether the student
/// submitted. A submission wins even after the deadline.
pub(crate) fn derive(now_ms: i64, due_date_ms: i64, has_submission: bool) -> StudentTaskStatus {
    if has_submission {
        StudentTaskStatus::Completed
    } else if now_ms > due_date_ms {
        StudentTaskStatus::Overdue
    } else {
        StudentTaskStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUE: i64 = 1_700_000_000_000;

    #[test]
    fn pending_before_deadline_without_submission() {
        assert_eq!(derive(DUE - 1, DUE, false), StudentTaskStatus::Pending);
    }

    #[test]
    fn pending_exactly_at_deadline() {
        assert_eq!(derive(DUE, DUE, false), StudentTaskStatus::Pending);
    }

    #[test]
    fn overdue_after_deadline_without_submission() {
        assert_eq!(derive(DUE + 1, DUE, false), StudentTaskStatus::Overdue);
    }

    #[test]
    fn completed_with_submission_before_deadline() {
        assert_eq!(derive(DUE - 1, DUE, true), StudentTaskStatus::Completed);
    }

    #[test]
    fn completed_with_submission_after_deadline() {
        assert_eq!(derive(DUE + 100_000, DUE, true), StudentTaskStatus::Completed);
    }
}
