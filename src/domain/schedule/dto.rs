use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::entity::scheduled_note;
use crate::domain::note::entity::note::NoteStatus;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    /// Publish time, UTC.
    pub scheduled_at: NaiveDateTime,
    /// Replace an existing live schedule instead of rejecting with 409.
    #[serde(default)]
    pub delete_if_exists: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub id: i64,
    pub note_id: i64,
    pub user_id: i64,
    pub scheduled_at: NaiveDateTime,
    pub cron_expression: String,
    pub schedule_id: String,
    pub created_at: NaiveDateTime,
}

impl From<scheduled_note::Model> for ScheduleResult {
    fn from(model: scheduled_note::Model) -> Self {
        Self {
            id: model.id,
            note_id: model.note_id,
            user_id: model.user_id,
            scheduled_at: model.scheduled_at,
            cron_expression: model.cron_expression,
            schedule_id: model.schedule_id,
            created_at: model.created_at,
        }
    }
}

/// Answer for the extension's pre-publish check.
#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanPostResponse {
    pub can_post: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Publish outcome reported by the extension after a fire.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredRequest {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Substack sends this as a string or a number depending on client
    /// version; normalized to a string either way.
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(value_type = Option<String>)]
    pub substack_note_id: Option<String>,
    #[serde(default)]
    pub new_status: Option<NoteStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TriggeredResponse {
    pub ok: bool,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}
