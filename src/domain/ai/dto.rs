use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Improve the body of a short-form note.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImproveNoteRequest {
    #[validate(length(min = 1, max = 10000))]
    pub note_body: String,
}

/// Refine (or produce) a title/subtitle pair for an article draft.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefineTitleRequest {
    #[validate(length(max = 300))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50000))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeoRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(min = 1, max = 50000))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdeasRequest {
    #[validate(length(min = 1, max = 500))]
    pub topic: String,
    #[validate(range(min = 1, max = 10))]
    pub count: Option<u8>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateNotesRequest {
    #[validate(length(min = 1, max = 500))]
    pub topic: String,
    #[validate(range(min = 1, max = 5))]
    pub count: Option<u8>,
}

/// Completion text plus the confirmed credit movement, so clients can settle
/// their optimistic balance display.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiCompletionResult {
    pub text: String,
    pub credits_used: i32,
    pub credits_remaining: i32,
}
