use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::services::AvailabilityService;
use crate::state::AppState;

#[derive(Deserialize)]
struct AvailabilityQueryParams {
    date: NaiveDate,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tutors/{id}/rules", get(list_rules).post(create_rule))
        .route("/rules/{id}", patch(update_rule).delete(delete_rule))
        .route("/tutors/{id}/availability", get(get_availability))
        .route("/tutors/{id}/lessons", get(list_lessons))
        .route("/lessons", post(create_lesson))
        .route("/lessons/{id}/status", patch(update_lesson_status))
        .with_state(state)
}

fn check_time_window(
    start: chrono::NaiveTime,
    end: chrono::NaiveTime,
) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::Validation(
            "start_time must be before end_time".to_string(),
        ));
    }
    Ok(())
}

fn check_day_of_week(day_of_week: i32) -> Result<(), AppError> {
    if !(1..=7).contains(&day_of_week) {
        return Err(AppError::Validation(
            "day_of_week must be 1 (Monday) through 7 (Sunday)".to_string(),
        ));
    }
    Ok(())
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_rules(
    State(state): State<AppState>,
    Path(tutor_id): Path<String>,
) -> Result<Json<Vec<AvailabilityRule>>, AppError> {
    let rules = repository::fetch_rules(&state.db, &tutor_id).await?;
    Ok(Json(rules))
}

async fn create_rule(
    State(state): State<AppState>,
    Path(tutor_id): Path<String>,
    Json(req): Json<NewRuleRequest>,
) -> Result<Json<AvailabilityRule>, AppError> {
    check_day_of_week(req.day_of_week)?;
    check_time_window(req.start_time, req.end_time)?;

    let rule = repository::insert_rule(&state.db, &tutor_id, req).await?;
    Ok(Json(rule))
}

async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<Json<AvailabilityRule>, AppError> {
    let current = repository::find_rule_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    // Validate the patched result, not just the patch.
    check_day_of_week(req.day_of_week.unwrap_or(current.day_of_week))?;
    check_time_window(
        req.start_time.unwrap_or(current.start_time),
        req.end_time.unwrap_or(current.end_time),
    )?;

    let rule = repository::update_rule(&state.db, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(rule))
}

async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let ok = repository::delete_rule(&state.db, &id).await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn get_availability(
    State(state): State<AppState>,
    Path(tutor_id): Path<String>,
    Query(params): Query<AvailabilityQueryParams>,
) -> Result<Json<Vec<AvailableSlot>>, AppError> {
    let service = AvailabilityService::new(state.store.clone());
    let slots = service.resolve(&tutor_id, params.date).await?;
    Ok(Json(slots))
}

async fn list_lessons(
    State(state): State<AppState>,
    Path(tutor_id): Path<String>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = repository::fetch_lessons(&state.db, &tutor_id).await?;
    Ok(Json(lessons))
}

async fn create_lesson(
    State(state): State<AppState>,
    Json(req): Json<NewLessonRequest>,
) -> Result<Json<Lesson>, AppError> {
    check_time_window(req.start_time, req.end_time)?;

    let lesson = repository::insert_lesson(&state.db, req)
        .await?
        .ok_or(AppError::SlotTaken)?;

    if let Err(e) = state.notifier.lesson_requested(&lesson).await {
        warn!("Failed to notify lesson request {}: {}", lesson.id, e);
    }

    Ok(Json(lesson))
}

async fn update_lesson_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLessonStatusRequest>,
) -> Result<Json<Lesson>, AppError> {
    let current = repository::find_lesson_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !current.status.can_transition_to(req.status) {
        return Err(AppError::IllegalTransition {
            from: current.status,
            to: req.status,
        });
    }

    let lesson = repository::update_lesson_status(&state.db, &id, req.status)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Err(e) = state.notifier.lesson_updated(&lesson).await {
        warn!("Failed to notify lesson update {}: {}", lesson.id, e);
    }

    Ok(Json(lesson))
}
