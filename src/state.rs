use std::sync::Arc;

use sqlx::SqlitePool;

use crate::notifier::NotifierClient;
use crate::store::AvailabilityStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: Arc<dyn AvailabilityStore>,
    pub notifier: Arc<dyn NotifierClient>,
}
