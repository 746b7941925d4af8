use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::models::LessonStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Requested time range is already booked")]
    SlotTaken,

    #[error("Cannot move lesson from {from:?} to {to:?}")]
    IllegalTransition { from: LessonStatus, to: LessonStatus },

    #[error("Notification failed: {0}")]
    Notify(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::SlotTaken | AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::Notify(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(ref e) => {
                error!("database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Storage internals stay out of responses
        let message = match &self {
            AppError::Database(_) => "Database error occurred".to_string(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
