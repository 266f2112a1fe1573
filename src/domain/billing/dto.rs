use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::entity::subscription::Plan;

/// Current credit balance, returned after the lazy rollover check.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalanceResult {
    pub plan: Plan,
    pub credits_per_period: i32,
    pub credits_remaining: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_refill: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreviewQuery {
    pub plan: Plan,
}

/// Carry-forward preview for a plan change. `creditsLeft` may be negative
/// when current-period usage exceeds the new plan's allotment.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreviewResult {
    pub credits_left: i32,
    pub credits_for_plan: i32,
}
