use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "usage_type")]
#[serde(rename_all = "camelCase")]
pub enum UsageType {
    #[sea_orm(string_value = "IDEA_GENERATION")]
    IdeaGeneration,
    #[sea_orm(string_value = "TEXT_ENHANCEMENT")]
    TextEnhancement,
    #[sea_orm(string_value = "TITLE_OR_SUBTITLE_REFINEMENT")]
    TitleOrSubtitleRefinement,
    #[sea_orm(string_value = "SEO")]
    Seo,
    #[sea_orm(string_value = "NOTES_GENERATION")]
    NotesGeneration,
    /// Variable-cost action; the cost always comes from a preset, never the
    /// static table.
    #[sea_orm(string_value = "CREDIT_PURCHASE")]
    CreditPurchase,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::IdeaGeneration => "ideaGeneration",
            UsageType::TextEnhancement => "textEnhancement",
            UsageType::TitleOrSubtitleRefinement => "titleOrSubtitleRefinement",
            UsageType::Seo => "seo",
            UsageType::NotesGeneration => "notesGeneration",
            UsageType::CreditPurchase => "creditPurchase",
        }
    }
}

/// Append-only usage log, one row per successful AI action. Never updated;
/// read for daily-cap aggregation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_usage")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub usage_type: UsageType,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
