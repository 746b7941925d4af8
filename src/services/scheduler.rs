use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository;

/// Periodic maintenance loop. Pending lesson requests whose date has passed
/// still count as occupying, so they are expired (cancelled) on an interval
/// to stop them from blocking windows nobody can book anymore.
pub struct MaintenanceScheduler {
    db: SqlitePool,
    interval: Duration,
}

impl MaintenanceScheduler {
    pub fn new(db: SqlitePool, interval_secs: u64) -> Self {
        Self {
            db,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn start(self) {
        info!("Starting maintenance scheduler (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match repository::expire_stale_requests(&self.db, Utc::now().date_naive()).await {
                Ok(expired) => {
                    if expired > 0 {
                        info!("Maintenance pass expired {} stale lesson requests", expired);
                    }
                }
                Err(e) => {
                    tracing::warn!("Maintenance pass failed: {:?}", e);
                    // Keep the loop alive on errors
                }
            }
        }
    }
}
