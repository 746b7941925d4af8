use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::error::AppError;
use crate::models::AvailableSlot;
use crate::store::AvailabilityStore;

/// Computes a tutor's bookable windows for a concrete date: the enabled
/// weekly rules for that weekday, minus any rule that overlaps a pending or
/// confirmed lesson on the date. A booking anywhere inside a rule's window
/// removes the whole rule for that date; windows are never carved into
/// remaining free sub-intervals.
pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        tutor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AvailableSlot>, AppError> {
        // ISO 8601 weekday, Monday=1 ... Sunday=7, applied uniformly.
        let day_of_week = date.weekday().number_from_monday() as i32;

        let rules = self.store.day_rules(tutor_id, day_of_week).await?;
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let booked = self.store.occupying_lessons(tutor_id, date).await?;

        let slots = rules
            .into_iter()
            .filter(|rule| {
                !booked.iter().any(|lesson| {
                    overlaps(
                        rule.start_time,
                        rule.end_time,
                        lesson.start_time,
                        lesson.end_time,
                    )
                })
            })
            .map(|rule| AvailableSlot {
                id: rule.id,
                date,
                start_time: rule.start_time,
                end_time: rule.end_time,
            })
            .collect();

        Ok(slots)
    }
}

/// Overlap of the half-open intervals [s1,e1) and [s2,e2). Touching
/// boundaries (e.g. 09:00-10:00 and 10:00-11:00) do not overlap.
pub fn overlaps(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::models::{AvailabilityRule, Lesson, LessonStatus};

    /// In-memory double holding raw rows; filters the same way the real
    /// store queries do (weekday + enabled, occupying statuses only).
    struct StubStore {
        rules: Vec<AvailabilityRule>,
        lessons: Vec<Lesson>,
    }

    #[async_trait]
    impl AvailabilityStore for StubStore {
        async fn day_rules(
            &self,
            tutor_id: &str,
            day_of_week: i32,
        ) -> Result<Vec<AvailabilityRule>, AppError> {
            Ok(self
                .rules
                .iter()
                .filter(|r| r.tutor_id == tutor_id && r.day_of_week == day_of_week && r.is_enabled)
                .cloned()
                .collect())
        }

        async fn occupying_lessons(
            &self,
            tutor_id: &str,
            date: NaiveDate,
        ) -> Result<Vec<Lesson>, AppError> {
            Ok(self
                .lessons
                .iter()
                .filter(|l| l.tutor_id == tutor_id && l.date == date && l.status.is_occupying())
                .cloned()
                .collect())
        }
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rule(id: &str, day_of_week: i32, start: NaiveTime, end: NaiveTime, enabled: bool) -> AvailabilityRule {
        let now = Utc::now().to_rfc3339();
        AvailabilityRule {
            id: id.to_string(),
            tutor_id: "tutor-1".to_string(),
            day_of_week,
            start_time: start,
            end_time: end,
            is_enabled: enabled,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn lesson(date: NaiveDate, start: NaiveTime, end: NaiveTime, status: LessonStatus) -> Lesson {
        let now = Utc::now().to_rfc3339();
        Lesson {
            id: "lesson-1".to_string(),
            tutor_id: "tutor-1".to_string(),
            student_id: "student-1".to_string(),
            date,
            start_time: start,
            end_time: end,
            status,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn service(rules: Vec<AvailabilityRule>, lessons: Vec<Lesson>) -> AvailabilityService {
        AvailabilityService::new(Arc::new(StubStore { rules, lessons }))
    }

    // 2024-05-15 is a Wednesday (ISO weekday 3).
    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    #[test]
    fn boundary_touching_is_not_overlap() {
        assert!(!overlaps(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!overlaps(t(10, 0), t(11, 0), t(9, 0), t(10, 0)));
        assert!(overlaps(t(9, 0), t(10, 30), t(10, 0), t(11, 0)));
        assert!(overlaps(t(10, 0), t(11, 0), t(9, 0), t(10, 30)));
        assert!(overlaps(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
    }

    #[tokio::test]
    async fn no_bookings_returns_all_enabled_day_rules() {
        let service = service(
            vec![
                rule("r1", 3, t(9, 0), t(10, 0), true),
                rule("r2", 3, t(14, 0), t(15, 0), true),
                rule("r3", 4, t(9, 0), t(10, 0), true), // Thursday, wrong day
            ],
            vec![],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].id, "r1");
        assert_eq!(slots[1].id, "r2");
        assert_eq!(slots[0].date, wednesday());
        assert_eq!(slots[0].start_time, t(9, 0));
        assert_eq!(slots[0].end_time, t(10, 0));
    }

    #[tokio::test]
    async fn no_rules_yields_empty_result() {
        let service = service(
            vec![],
            vec![lesson(wednesday(), t(10, 0), t(11, 0), LessonStatus::Confirmed)],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn disabled_rule_is_never_offered() {
        let service = service(vec![rule("r1", 1, t(8, 0), t(9, 0), false)], vec![]);

        // 2024-05-13 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
        let slots = service.resolve("tutor-1", monday).await.unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn booking_inside_rule_excludes_whole_rule() {
        // No carving: 09:00-12:00 with a booking at 10:00-11:00 disappears
        // entirely instead of splitting into 09-10 and 11-12.
        let service = service(
            vec![rule("r1", 3, t(9, 0), t(12, 0), true)],
            vec![lesson(wednesday(), t(10, 0), t(11, 0), LessonStatus::Confirmed)],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn rule_contained_in_booking_is_excluded() {
        let service = service(
            vec![rule("r1", 3, t(10, 0), t(10, 30), true)],
            vec![lesson(wednesday(), t(9, 0), t(12, 0), LessonStatus::Pending)],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn touching_booking_does_not_block_rule() {
        let service = service(
            vec![rule("r1", 3, t(9, 0), t(10, 0), true)],
            vec![lesson(wednesday(), t(10, 0), t(11, 0), LessonStatus::Confirmed)],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].id, "r1");
    }

    #[tokio::test]
    async fn non_occupying_statuses_do_not_block() {
        let service = service(
            vec![rule("r1", 3, t(9, 0), t(12, 0), true)],
            vec![
                lesson(wednesday(), t(9, 0), t(10, 0), LessonStatus::Cancelled),
                lesson(wednesday(), t(10, 0), t(11, 0), LessonStatus::Rejected),
                lesson(wednesday(), t(11, 0), t(12, 0), LessonStatus::Completed),
            ],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[tokio::test]
    async fn booking_on_other_date_does_not_block() {
        let other_wednesday = NaiveDate::from_ymd_opt(2024, 5, 22).unwrap();
        let service = service(
            vec![rule("r1", 3, t(9, 0), t(10, 0), true)],
            vec![lesson(other_wednesday, t(9, 0), t(10, 0), LessonStatus::Confirmed)],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[tokio::test]
    async fn unknown_tutor_yields_empty_result() {
        let service = service(vec![rule("r1", 3, t(9, 0), t(10, 0), true)], vec![]);

        let slots = service.resolve("nobody", wednesday()).await.unwrap();
        assert!(slots.is_empty());
    }

    /// Store double whose reads fail, for the propagation path.
    struct BrokenStore {
        rules_fail: bool,
        rules: Vec<AvailabilityRule>,
    }

    #[async_trait]
    impl AvailabilityStore for BrokenStore {
        async fn day_rules(
            &self,
            _tutor_id: &str,
            _day_of_week: i32,
        ) -> Result<Vec<AvailabilityRule>, AppError> {
            if self.rules_fail {
                Err(AppError::Database(sqlx::Error::PoolClosed))
            } else {
                Ok(self.rules.clone())
            }
        }

        async fn occupying_lessons(
            &self,
            _tutor_id: &str,
            _date: NaiveDate,
        ) -> Result<Vec<Lesson>, AppError> {
            Err(AppError::Database(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn rule_fetch_failure_is_surfaced() {
        let service = AvailabilityService::new(Arc::new(BrokenStore {
            rules_fail: true,
            rules: vec![],
        }));

        let err = service.resolve("tutor-1", wednesday()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn lesson_fetch_failure_is_surfaced() {
        // Rules load fine, the occupying-lesson read fails
        let service = AvailabilityService::new(Arc::new(BrokenStore {
            rules_fail: false,
            rules: vec![rule("r1", 3, t(9, 0), t(10, 0), true)],
        }));

        let err = service.resolve("tutor-1", wednesday()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn blocked_and_free_rules_mix() {
        let service = service(
            vec![
                rule("r1", 3, t(9, 0), t(10, 0), true),
                rule("r2", 3, t(10, 0), t(11, 0), true),
                rule("r3", 3, t(11, 0), t(12, 0), true),
            ],
            vec![lesson(wednesday(), t(10, 15), t(10, 45), LessonStatus::Pending)],
        );

        let slots = service.resolve("tutor-1", wednesday()).await.unwrap();
        let ids: Vec<&str> = slots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r3"]);
    }
}
