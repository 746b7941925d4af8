use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutorhub::api::router;
use tutorhub::notifier::{HttpNotifierClient, NoopNotifierClient, NotifierClient, NotifierConfig};
use tutorhub::services::MaintenanceScheduler;
use tutorhub::state::AppState;
use tutorhub::store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tutorhub=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://tutorhub.db".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let notifier: Arc<dyn NotifierClient> = match NotifierConfig::new_from_env() {
        Some(config) => Arc::new(HttpNotifierClient::new(config)?),
        None => {
            info!("WEBHOOK_URL not set, notifications disabled");
            Arc::new(NoopNotifierClient)
        }
    };

    let state = AppState {
        db: pool.clone(),
        store: Arc::new(SqliteStore::new(pool.clone())),
        notifier,
    };

    let expiry_interval = std::env::var("EXPIRY_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);
    tokio::spawn(MaintenanceScheduler::new(pool.clone(), expiry_interval).start());

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
