use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::AppError;
use crate::models::Lesson;

#[derive(Clone, Debug)]
pub struct NotifierConfig {
    pub webhook_url: String,
}

impl NotifierConfig {
    /// Reads `WEBHOOK_URL`; absent means notifications stay disabled and the
    /// caller should fall back to [`NoopNotifierClient`].
    pub fn new_from_env() -> Option<Self> {
        env::var("WEBHOOK_URL")
            .ok()
            .map(|webhook_url| Self { webhook_url })
    }
}

/// Outbound notification collaborator. Delivery is best-effort: callers log
/// failures and never fail the originating request over them.
#[async_trait]
pub trait NotifierClient: Send + Sync {
    async fn lesson_requested(&self, lesson: &Lesson) -> Result<(), AppError>;
    async fn lesson_updated(&self, lesson: &Lesson) -> Result<(), AppError>;
}

#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    event: &'a str,
    lesson: &'a Lesson,
}

pub struct HttpNotifierClient {
    client: Client,
    config: NotifierConfig,
}

impl HttpNotifierClient {
    pub fn new(config: NotifierConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Notify(format!("failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn post_event(&self, event: &str, lesson: &Lesson) -> Result<(), AppError> {
        let payload = NotificationPayload { event, lesson };

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("failed to reach webhook: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Notify(format!(
                "webhook rejected {} notification: {}",
                event, status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl NotifierClient for HttpNotifierClient {
    async fn lesson_requested(&self, lesson: &Lesson) -> Result<(), AppError> {
        self.post_event("lesson_requested", lesson).await
    }

    async fn lesson_updated(&self, lesson: &Lesson) -> Result<(), AppError> {
        self.post_event("lesson_updated", lesson).await
    }
}

/// Used when no webhook is configured, and as the test double.
pub struct NoopNotifierClient;

#[async_trait]
impl NotifierClient for NoopNotifierClient {
    async fn lesson_requested(&self, _lesson: &Lesson) -> Result<(), AppError> {
        Ok(())
    }

    async fn lesson_updated(&self, _lesson: &Lesson) -> Result<(), AppError> {
        Ok(())
    }
}
