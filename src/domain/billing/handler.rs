use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use super::dto::{CreditBalanceResult, PlanPreviewQuery, PlanPreviewResult};
use super::service::{next_refill_at, CreditLedger};
use crate::state::AppState;
use crate::utils::{auth::AuthUser, error::AppError, response::ErrorResponse, BaseResponse};

/// Current balance for the caller.
///
/// Runs the lazy credit rollover first (reconcile-on-read), so any request
/// landing here eventually triggers a due reset.
#[utoipa::path(
    get,
    path = "/api/billing/credits",
    responses(
        (status = 200, body = CreditBalanceResult),
        (status = 401, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn credits_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user_id = auth.user_id()?;

    let sub = CreditLedger::check_and_reset_credits(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription.".to_string()))?;

    let result = CreditBalanceResult {
        plan: sub.plan,
        credits_per_period: sub.credits_per_period,
        credits_remaining: sub.credits_remaining,
        next_refill: sub.last_credit_reset.and_then(next_refill_at),
    };

    Ok(Json(BaseResponse::success(result)))
}

/// Credit carry-forward preview for a prospective plan change.
#[utoipa::path(
    get,
    path = "/api/billing/plan-preview",
    params(PlanPreviewQuery),
    responses(
        (status = 200, body = PlanPreviewResult),
        (status = 401, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn plan_preview_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PlanPreviewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = auth.user_id()?;

    let preview = CreditLedger::plan_change_preview(&state.db, user_id, &query.plan).await?;

    Ok(Json(BaseResponse::success(PlanPreviewResult {
        credits_left: preview.credits_left,
        credits_for_plan: preview.credits_for_plan,
    })))
}
