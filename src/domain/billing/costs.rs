use super::entity::ai_usage::UsageType;
use super::entity::subscription::Plan;

/// Static cost table: credits debited per AI action. `None` means the type
/// has no fixed cost and a preset must be supplied by the caller.
pub fn credit_cost(usage_type: &UsageType) -> Option<i32> {
    match usage_type {
        UsageType::TextEnhancement => Some(1),
        UsageType::TitleOrSubtitleRefinement => Some(1),
        UsageType::Seo => Some(2),
        UsageType::IdeaGeneration => Some(2),
        UsageType::NotesGeneration => Some(3),
        UsageType::CreditPurchase => None,
    }
}

/// Per-type daily cap, independent of the credit balance. Types without a
/// cap skip the usage-log aggregation entirely.
pub fn daily_cap(usage_type: &UsageType) -> Option<u64> {
    match usage_type {
        UsageType::IdeaGeneration => Some(20),
        UsageType::NotesGeneration => Some(10),
        _ => None,
    }
}

/// Credit allotment per billing period for each plan.
pub fn credits_for_plan(plan: &Plan) -> i32 {
    match plan {
        Plan::Free => 5,
        Plan::Hobbyist => 50,
        Plan::Standard => 150,
        Plan::Premium => 500,
    }
}
