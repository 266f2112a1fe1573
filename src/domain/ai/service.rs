use async_openai::types::ChatCompletionRequestMessage;
use chrono::Utc;
use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait};
use tracing::{error, warn};

use super::client::AiClientTrait;
use crate::domain::billing::entity::ai_usage::{self, UsageType};
use crate::domain::billing::service::{CreditCheck, CreditLedger};
use crate::utils::error::AppError;

/// Result of a gated AI action. The credit fields let the client confirm its
/// optimistic balance update.
#[derive(Debug, Clone, PartialEq)]
pub struct GatedCompletion {
    pub text: String,
    pub credits_used: i32,
    pub credits_remaining: i32,
}

fn refusal_error(check: &CreditCheck, usage_type: &UsageType) -> AppError {
    match check.status {
        403 => AppError::NoActiveSubscription,
        404 => AppError::UnknownUsageType(usage_type.as_str().to_string()),
        429 => AppError::DailyLimitReached(usage_type.as_str().to_string()),
        402 => AppError::InsufficientCredits {
            next_refill: check.next_refill,
        },
        status => AppError::InternalError(format!("Unexpected credit check status {}", status)),
    }
}

pub struct AiService;

impl AiService {
    /// The mandatory gate around every AI action:
    /// check affordability, debit, call the LLM, compensate on failure,
    /// record usage on success.
    ///
    /// The debit and the LLM call are not transactionally linked; the
    /// compensating `undo_use_credits` is the only recovery path, so it runs
    /// for every post-debit failure.
    pub async fn run_gated(
        db: &DatabaseConnection,
        ai: &dyn AiClientTrait,
        model: &str,
        user_id: i64,
        usage_type: UsageType,
        messages: Vec<ChatCompletionRequestMessage>,
        caller_tag: &str,
    ) -> Result<GatedCompletion, AppError> {
        let check = CreditLedger::can_use_ai(db, user_id, &usage_type, None).await?;
        if !check.allowed {
            return Err(refusal_error(&check, &usage_type));
        }

        let debit = CreditLedger::use_credits(db, user_id, &usage_type, None).await?;
        if debit.credits_used == 0 {
            // Zeroed debit means the subscription vanished between check and
            // debit; nothing was spent, so fail without compensation.
            warn!(user_id, caller_tag, "Debit returned zero after passing check");
            return Err(AppError::InternalError(
                "Credit debit failed after affordability check".to_string(),
            ));
        }

        let text = match ai.complete(messages, model, caller_tag).await {
            Ok(text) => text,
            Err(llm_error) => {
                if let Err(undo_error) =
                    CreditLedger::undo_use_credits(db, user_id, &usage_type, None).await
                {
                    error!(
                        user_id,
                        caller_tag,
                        error = %undo_error,
                        "Failed to restore credits after LLM failure"
                    );
                }
                return Err(llm_error);
            }
        };

        let usage_row = ai_usage::ActiveModel {
            user_id: Set(user_id),
            usage_type: Set(usage_type.clone()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        if let Err(e) = ai_usage::Entity::insert(usage_row).exec(db).await {
            // The action already succeeded and was billed; losing one usage
            // log row only loosens the daily cap.
            error!(user_id, caller_tag, error = %e, "Failed to record AI usage");
        }

        Ok(GatedCompletion {
            text,
            credits_used: debit.credits_used,
            credits_remaining: debit.credits_remaining,
        })
    }
}
