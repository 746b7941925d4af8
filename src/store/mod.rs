use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{AvailabilityRule, Lesson};

/// Read access the availability resolver needs from the backing store.
/// Kept behind a trait so the resolver can be exercised against an
/// in-memory double without a database.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Enabled weekly rules for the tutor on an ISO weekday (Monday=1 ... Sunday=7).
    async fn day_rules(
        &self,
        tutor_id: &str,
        day_of_week: i32,
    ) -> Result<Vec<AvailabilityRule>, AppError>;

    /// Pending and confirmed lessons for the tutor on the given date.
    async fn occupying_lessons(
        &self,
        tutor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Lesson>, AppError>;
}

pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AvailabilityStore for SqliteStore {
    async fn day_rules(
        &self,
        tutor_id: &str,
        day_of_week: i32,
    ) -> Result<Vec<AvailabilityRule>, AppError> {
        Ok(repository::fetch_day_rules(&self.db, tutor_id, day_of_week).await?)
    }

    async fn occupying_lessons(
        &self,
        tutor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Lesson>, AppError> {
        Ok(repository::fetch_occupying_lessons(&self.db, tutor_id, date).await?)
    }
}
