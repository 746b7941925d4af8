use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{
    AvailabilityRule, Lesson, LessonStatus, NewLessonRequest, NewRuleRequest, UpdateRuleRequest,
};

const RULE_COLUMNS: &str =
    "id, tutor_id, day_of_week, start_time, end_time, is_enabled, created_at, updated_at";

const LESSON_COLUMNS: &str =
    "id, tutor_id, student_id, date, start_time, end_time, status, created_at, updated_at";

pub async fn fetch_rules(
    db: &SqlitePool,
    tutor_id: &str,
) -> Result<Vec<AvailabilityRule>, sqlx::Error> {
    sqlx::query_as::<_, AvailabilityRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM availability_rules WHERE tutor_id = ? ORDER BY day_of_week, start_time"
    ))
    .bind(tutor_id)
    .fetch_all(db)
    .await
}

/// Enabled rules for one tutor on one ISO weekday (Monday=1 ... Sunday=7),
/// in stable start-time order.
pub async fn fetch_day_rules(
    db: &SqlitePool,
    tutor_id: &str,
    day_of_week: i32,
) -> Result<Vec<AvailabilityRule>, sqlx::Error> {
    sqlx::query_as::<_, AvailabilityRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM availability_rules WHERE tutor_id = ? AND day_of_week = ? AND is_enabled = 1 ORDER BY start_time"
    ))
    .bind(tutor_id)
    .bind(day_of_week)
    .fetch_all(db)
    .await
}

pub async fn find_rule_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<AvailabilityRule>, sqlx::Error> {
    sqlx::query_as::<_, AvailabilityRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM availability_rules WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_rule(
    db: &SqlitePool,
    tutor_id: &str,
    req: NewRuleRequest,
) -> Result<AvailabilityRule, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO availability_rules (id, tutor_id, day_of_week, start_time, end_time, is_enabled, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&id)
    .bind(tutor_id)
    .bind(req.day_of_week)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(req.is_enabled)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(AvailabilityRule {
        id,
        tutor_id: tutor_id.to_string(),
        day_of_week: req.day_of_week,
        start_time: req.start_time,
        end_time: req.end_time,
        is_enabled: req.is_enabled,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn update_rule(
    db: &SqlitePool,
    id: &str,
    req: UpdateRuleRequest,
) -> Result<Option<AvailabilityRule>, sqlx::Error> {
    let mut current = match find_rule_by_id(db, id).await? {
        Some(rule) => rule,
        None => return Ok(None),
    };

    if let Some(day_of_week) = req.day_of_week {
        current.day_of_week = day_of_week;
    }
    if let Some(start_time) = req.start_time {
        current.start_time = start_time;
    }
    if let Some(end_time) = req.end_time {
        current.end_time = end_time;
    }
    if let Some(is_enabled) = req.is_enabled {
        current.is_enabled = is_enabled;
    }
    current.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE availability_rules SET day_of_week = ?, start_time = ?, end_time = ?, is_enabled = ?, updated_at = ? WHERE id = ?"
    )
    .bind(current.day_of_week)
    .bind(current.start_time)
    .bind(current.end_time)
    .bind(current.is_enabled)
    .bind(&current.updated_at)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_rule(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM availability_rules WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_lessons(db: &SqlitePool, tutor_id: &str) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE tutor_id = ? ORDER BY date, start_time"
    ))
    .bind(tutor_id)
    .fetch_all(db)
    .await
}

/// Lessons that block new bookings for (tutor, date): pending or confirmed.
/// Cancelled, rejected and completed lessons never occupy time.
pub async fn fetch_occupying_lessons(
    db: &SqlitePool,
    tutor_id: &str,
    date: NaiveDate,
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE tutor_id = ? AND date = ? AND status IN ('pending', 'confirmed') ORDER BY start_time"
    ))
    .bind(tutor_id)
    .bind(date)
    .fetch_all(db)
    .await
}

pub async fn find_lesson_by_id(db: &SqlitePool, id: &str) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Inserts a lesson request unless an occupying lesson already overlaps the
/// requested range. The overlap re-check and the insert run in one
/// transaction, so two racing requests cannot both claim the same window.
/// Returns `None` when the range is already taken.
pub async fn insert_lesson(
    db: &SqlitePool,
    req: NewLessonRequest,
) -> Result<Option<Lesson>, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let mut tx = db.begin().await?;

    // Half-open intervals: touching boundaries do not conflict.
    let conflicts = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM lessons WHERE tutor_id = ? AND date = ? AND status IN ('pending', 'confirmed') AND start_time < ? AND ? < end_time"
    )
    .bind(&req.tutor_id)
    .bind(req.date)
    .bind(req.end_time)
    .bind(req.start_time)
    .fetch_one(&mut *tx)
    .await?;

    if conflicts > 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    sqlx::query(
        "INSERT INTO lessons (id, tutor_id, student_id, date, start_time, end_time, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?)"
    )
    .bind(&id)
    .bind(&req.tutor_id)
    .bind(&req.student_id)
    .bind(req.date)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(Lesson {
        id,
        tutor_id: req.tutor_id,
        student_id: req.student_id,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
        status: LessonStatus::Pending,
        created_at: now.clone(),
        updated_at: now,
    }))
}

pub async fn update_lesson_status(
    db: &SqlitePool,
    id: &str,
    status: LessonStatus,
) -> Result<Option<Lesson>, sqlx::Error> {
    let mut current = match find_lesson_by_id(db, id).await? {
        Some(lesson) => lesson,
        None => return Ok(None),
    };

    current.status = status;
    current.updated_at = Utc::now().to_rfc3339();

    sqlx::query("UPDATE lessons SET status = ?, updated_at = ? WHERE id = ?")
        .bind(current.status)
        .bind(&current.updated_at)
        .bind(id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

/// Cancels pending requests whose date has already passed. They still count
/// as occupying until expired, which would block windows nobody can book.
pub async fn expire_stale_requests(
    db: &SqlitePool,
    today: NaiveDate,
) -> Result<u64, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE lessons SET status = 'cancelled', updated_at = ? WHERE status = 'pending' AND date < ?"
    )
    .bind(&now)
    .bind(today)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result)
}
