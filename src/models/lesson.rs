use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a lesson request. Only `Pending` and `Confirmed` occupy a
/// tutor's time; the other states never block new bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LessonStatus {
    Pending,
    Confirmed,
    Cancelled,
    Rejected,
    Completed,
}

impl LessonStatus {
    pub fn is_occupying(self) -> bool {
        matches!(self, LessonStatus::Pending | LessonStatus::Confirmed)
    }

    /// Pending requests can be answered or withdrawn; confirmed lessons can
    /// still be cancelled, or completed once held. Terminal states stay put.
    pub fn can_transition_to(self, next: LessonStatus) -> bool {
        use LessonStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: String,
    pub tutor_id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: LessonStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLessonRequest {
    pub tutor_id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLessonStatusRequest {
    pub status: LessonStatus,
}
