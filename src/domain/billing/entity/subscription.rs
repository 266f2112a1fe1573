use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "plan")]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[sea_orm(string_value = "FREE")]
    Free,
    #[sea_orm(string_value = "HOBBYIST")]
    Hobbyist,
    #[sea_orm(string_value = "STANDARD")]
    Standard,
    #[sea_orm(string_value = "PREMIUM")]
    Premium,
}

/// Cache of the billing provider's subscription status. The provider is the
/// source of truth; webhooks elsewhere keep this in sync.
#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "subscription_status")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "TRIALING")]
    Trialing,
    #[sea_orm(string_value = "PAST_DUE")]
    PastDue,
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
}

/// One active row per user. The ledger is the only writer of the credit
/// columns; debits are unconditional, so the gate in front of them is what
/// keeps `credits_remaining` non-negative.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub credits_per_period: i32,
    pub credits_remaining: i32,
    pub last_credit_reset: Option<DateTime>,
    pub current_period_start: DateTime,
    pub current_period_end: DateTime,
    pub cancel_at_period_end: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
