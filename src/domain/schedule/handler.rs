use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use validator::Validate;

use super::dto::{
    CanPostResponse, CreateScheduleRequest, ScheduleResult, TriggeredRequest, TriggeredResponse,
};
use super::service::ScheduleService;
use super::webhook::{verify_webhook_key, TriggeredOutcome, WebhookService};
use crate::state::AppState;
use crate::utils::{auth::AuthUser, error::AppError, response::ErrorResponse, BaseResponse};

/// Schedule a note for publishing at a future time.
#[utoipa::path(
    post,
    path = "/api/notes/{id}/schedule",
    params(("id" = i64, Path, description = "Note id")),
    request_body = CreateScheduleRequest,
    responses(
        (status = 200, body = ScheduleResult),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse),
        (status = 502, body = ErrorResponse)
    )
)]
pub async fn create_schedule_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<i64>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let user_id = auth.user_id()?;

    let schedule = ScheduleService::create(
        &state.db,
        state.scheduler.as_ref(),
        user_id,
        note_id,
        req.scheduled_at,
        req.delete_if_exists,
        state.config.min_schedule_lead_minutes,
        &state.config.callback_base_url,
    )
    .await?;

    Ok(Json(BaseResponse::success(ScheduleResult::from(schedule))))
}

/// Remove a note's live schedule and return the note to draft.
#[utoipa::path(
    delete,
    path = "/api/notes/{id}/schedule",
    params(("id" = i64, Path, description = "Note id")),
    responses(
        (status = 200),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
pub async fn delete_schedule_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = auth.user_id()?;

    ScheduleService::delete_for_note(&state.db, state.scheduler.as_ref(), user_id, note_id)
        .await?;

    Ok(Json(BaseResponse::success(())))
}

/// The caller's live schedules, soonest first.
#[utoipa::path(
    get,
    path = "/api/schedules",
    responses(
        (status = 200, body = [ScheduleResult]),
        (status = 401, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn list_schedules_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user_id = auth.user_id()?;

    let schedules = ScheduleService::list_for_user(&state.db, user_id).await?;
    let results: Vec<ScheduleResult> = schedules.into_iter().map(ScheduleResult::from).collect();

    Ok(Json(BaseResponse::success(results)))
}

/// Pre-publish staleness gate, called by the scheduler at fire time.
///
/// Authenticated by shared secret, not a user token; the response is the
/// raw contract the extension expects, without the envelope.
#[utoipa::path(
    post,
    path = "/api/schedule/{id}/can-post",
    params(("id" = i64, Path, description = "Scheduled note id")),
    responses(
        (status = 200, body = CanPostResponse),
        (status = 401, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
pub async fn can_post_handler(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    verify_webhook_key(&headers, &state.config.webhook_api_key)?;

    let now = Utc::now().naive_utc();
    let response = WebhookService::evaluate_can_post(
        &state.db,
        schedule_id,
        now,
        state.config.stale_window_minutes,
    )
    .await?;

    Ok(Json(response))
}

/// Publish-outcome report from the extension after a fire.
#[utoipa::path(
    post,
    path = "/api/schedule/{id}/triggered",
    params(("id" = i64, Path, description = "Scheduled note id")),
    request_body = TriggeredRequest,
    responses(
        (status = 200, body = TriggeredResponse),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
pub async fn triggered_handler(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    headers: HeaderMap,
    payload: Result<Json<TriggeredRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    verify_webhook_key(&headers, &state.config.webhook_api_key)?;
    let Json(req) = payload?;

    let now = Utc::now().naive_utc();
    let outcome = WebhookService::apply_triggered(&state.db, schedule_id, &req, now).await?;

    // Soft failures are acknowledged with an empty body; only a reconciled
    // publish answers `{ok: true}`.
    let body = match outcome {
        TriggeredOutcome::Reconciled { .. } => serde_json::json!(TriggeredResponse { ok: true }),
        TriggeredOutcome::Ignored => serde_json::json!({}),
    };
    Ok(Json(body))
}
