use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::entity::note::{self, NoteStatus};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
    pub body_json: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResult {
    pub id: i64,
    pub user_id: i64,
    pub body: String,
    pub status: NoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_to: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_via_schedule_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substack_note_id: Option<String>,
    pub is_archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<note::Model> for NoteResult {
    fn from(model: note::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            body: model.body,
            status: model.status,
            scheduled_to: model.scheduled_to,
            sent_via_schedule_at: model.sent_via_schedule_at,
            substack_note_id: model.substack_note_id,
            is_archived: model.is_archived,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
