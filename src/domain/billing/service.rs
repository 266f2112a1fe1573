use chrono::{Months, NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{info, warn};

use super::costs;
use super::entity::ai_usage::{self, UsageType};
use super::entity::subscription::{self, Plan, SubscriptionStatus};
use crate::utils::error::AppError;

/// Outcome of an affordability check. `status` carries the HTTP status a
/// caller should surface on refusal (403 no subscription, 404 unknown usage
/// type, 429 daily cap, 402 insufficient balance).
#[derive(Debug, Clone, PartialEq)]
pub struct CreditCheck {
    pub allowed: bool,
    pub status: u16,
    pub next_refill: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreditDebit {
    pub credits_used: i32,
    pub credits_remaining: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanCredits {
    pub credits_left: i32,
    pub credits_for_plan: i32,
}

/// The single authority over the credit balance.
///
/// `can_use_ai` is a pure read; `use_credits`/`undo_use_credits` are the
/// debit and its compensating transaction. Callers MUST check `can_use_ai`
/// before `use_credits`: the debit does not re-check affordability.
pub struct CreditLedger;

/// One calendar month after the last rollover.
pub fn next_refill_at(last_reset: NaiveDateTime) -> Option<NaiveDateTime> {
    last_reset.checked_add_months(Months::new(1))
}

/// Decide affordability from already-loaded state. Fails closed: missing
/// subscription or cost refuses with a distinct status per cause.
pub fn evaluate_credit_check(
    sub: Option<&subscription::Model>,
    cost: Option<i32>,
    daily_cap_exhausted: bool,
) -> CreditCheck {
    let Some(sub) = sub else {
        return CreditCheck {
            allowed: false,
            status: 403,
            next_refill: None,
        };
    };
    let Some(cost) = cost else {
        return CreditCheck {
            allowed: false,
            status: 404,
            next_refill: None,
        };
    };
    if daily_cap_exhausted {
        return CreditCheck {
            allowed: false,
            status: 429,
            next_refill: None,
        };
    }
    if sub.credits_remaining < cost {
        return CreditCheck {
            allowed: false,
            status: 402,
            next_refill: sub.last_credit_reset.and_then(next_refill_at),
        };
    }
    CreditCheck {
        allowed: true,
        status: 200,
        next_refill: None,
    }
}

/// A rollover is due when there was never one, when a new billing period has
/// started since, or when a full calendar month has elapsed.
pub fn reset_due(sub: &subscription::Model, now: NaiveDateTime) -> bool {
    match sub.last_credit_reset {
        None => true,
        Some(last_reset) => {
            sub.current_period_start > last_reset
                || next_refill_at(last_reset).map(|due| due <= now).unwrap_or(false)
        }
    }
}

/// Plan-change carry-forward: usage in the current period follows the user
/// to the new plan rather than granting a fresh allotment. The result can be
/// negative when the user already consumed more than the new plan allows.
pub fn carry_forward(
    old_credits_per_period: i32,
    credits_remaining: i32,
    new_credits_for_plan: i32,
) -> PlanCredits {
    let credits_used = (old_credits_per_period - credits_remaining).max(0);
    PlanCredits {
        credits_left: new_credits_for_plan - credits_used,
        credits_for_plan: new_credits_for_plan,
    }
}

fn resolve_cost(usage_type: &UsageType, preset_credits: Option<i32>) -> Option<i32> {
    preset_credits.or_else(|| costs::credit_cost(usage_type))
}

impl CreditLedger {
    /// The caller's current ACTIVE/TRIALING subscription, if any.
    pub async fn find_active_subscription(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Option<subscription::Model>, AppError> {
        subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(
                subscription::Column::Status
                    .is_in([SubscriptionStatus::Active, SubscriptionStatus::Trialing]),
            )
            .order_by_desc(subscription::Column::Id)
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn daily_cap_exhausted(
        db: &DatabaseConnection,
        user_id: i64,
        usage_type: &UsageType,
    ) -> Result<bool, AppError> {
        let Some(cap) = costs::daily_cap(usage_type) else {
            return Ok(false);
        };

        let day_start = Utc::now().date_naive().and_time(chrono::NaiveTime::MIN);

        let used_today = ai_usage::Entity::find()
            .filter(ai_usage::Column::UserId.eq(user_id))
            .filter(ai_usage::Column::UsageType.eq(usage_type.clone()))
            .filter(ai_usage::Column::CreatedAt.gte(day_start))
            .count(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(used_today >= cap)
    }

    /// Read-only affordability check. No side effects; must run before any
    /// externally-billable action because the LLM call cannot be rolled back.
    pub async fn can_use_ai(
        db: &DatabaseConnection,
        user_id: i64,
        usage_type: &UsageType,
        preset_credits: Option<i32>,
    ) -> Result<CreditCheck, AppError> {
        let sub = Self::find_active_subscription(db, user_id).await?;
        let cost = resolve_cost(usage_type, preset_credits);

        let capped = if sub.is_some() && cost.is_some() {
            Self::daily_cap_exhausted(db, user_id, usage_type).await?
        } else {
            false
        };

        Ok(evaluate_credit_check(sub.as_ref(), cost, capped))
    }

    /// Debit the cost from the balance. Assumes `can_use_ai` passed; does not
    /// re-check affordability. The decrement is a single atomic UPDATE so
    /// concurrent debits cannot lose updates.
    ///
    /// A zeroed result means the subscription or cost was missing; callers
    /// must treat that as a failure signal for their own flow.
    pub async fn use_credits(
        db: &DatabaseConnection,
        user_id: i64,
        usage_type: &UsageType,
        preset_credits: Option<i32>,
    ) -> Result<CreditDebit, AppError> {
        let sub = Self::find_active_subscription(db, user_id).await?;
        let cost = resolve_cost(usage_type, preset_credits);

        let (Some(sub), Some(cost)) = (sub, cost) else {
            warn!(
                user_id,
                usage_type = usage_type.as_str(),
                "use_credits called without subscription or known cost"
            );
            return Ok(CreditDebit {
                credits_used: 0,
                credits_remaining: 0,
            });
        };

        let now = Utc::now().naive_utc();
        subscription::Entity::update_many()
            .col_expr(
                subscription::Column::CreditsRemaining,
                Expr::col(subscription::Column::CreditsRemaining).sub(cost),
            )
            .col_expr(subscription::Column::UpdatedAt, Expr::value(now))
            .filter(subscription::Column::Id.eq(sub.id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(CreditDebit {
            credits_used: cost,
            credits_remaining: sub.credits_remaining - cost,
        })
    }

    /// Compensating transaction for `use_credits`, called when the paired
    /// external action fails after the debit. Missing subscription or cost is
    /// logged, not raised.
    pub async fn undo_use_credits(
        db: &DatabaseConnection,
        user_id: i64,
        usage_type: &UsageType,
        preset_credits: Option<i32>,
    ) -> Result<(), AppError> {
        let sub = Self::find_active_subscription(db, user_id).await?;
        let cost = resolve_cost(usage_type, preset_credits);

        let (Some(sub), Some(cost)) = (sub, cost) else {
            warn!(
                user_id,
                usage_type = usage_type.as_str(),
                "undo_use_credits called without subscription or known cost"
            );
            return Ok(());
        };

        let now = Utc::now().naive_utc();
        subscription::Entity::update_many()
            .col_expr(
                subscription::Column::CreditsRemaining,
                Expr::col(subscription::Column::CreditsRemaining).add(cost),
            )
            .col_expr(subscription::Column::UpdatedAt, Expr::value(now))
            .filter(subscription::Column::Id.eq(sub.id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            user_id,
            usage_type = usage_type.as_str(),
            credits = cost,
            "Restored credits after downstream failure"
        );
        Ok(())
    }

    /// Lazy rollover: resets the balance when a new period has started or a
    /// calendar month has elapsed since the last reset. Idempotent within a
    /// period. Returns the (possibly refreshed) subscription.
    pub async fn check_and_reset_credits(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Option<subscription::Model>, AppError> {
        let Some(sub) = Self::find_active_subscription(db, user_id).await? else {
            return Ok(None);
        };

        let now = Utc::now().naive_utc();
        if !reset_due(&sub, now) {
            return Ok(Some(sub));
        }

        subscription::Entity::update_many()
            .col_expr(
                subscription::Column::CreditsRemaining,
                Expr::value(sub.credits_per_period),
            )
            .col_expr(subscription::Column::LastCreditReset, Expr::value(now))
            .col_expr(subscription::Column::UpdatedAt, Expr::value(now))
            .filter(subscription::Column::Id.eq(sub.id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(user_id, subscription_id = sub.id, "Reset period credits");

        Ok(Some(subscription::Model {
            credits_remaining: sub.credits_per_period,
            last_credit_reset: Some(now),
            updated_at: now,
            ..sub
        }))
    }

    /// Carry-forward preview for a plan change. The raw value may be
    /// negative; nothing is persisted here.
    pub async fn plan_change_preview(
        db: &DatabaseConnection,
        user_id: i64,
        new_plan: &Plan,
    ) -> Result<PlanCredits, AppError> {
        let sub = Self::find_active_subscription(db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active subscription.".to_string()))?;

        Ok(carry_forward(
            sub.credits_per_period,
            sub.credits_remaining,
            costs::credits_for_plan(new_plan),
        ))
    }
}
