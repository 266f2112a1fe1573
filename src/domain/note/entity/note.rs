use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "note_status")]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,
    #[sea_orm(string_value = "PUBLISHED")]
    Published,
    #[sea_orm(string_value = "ARCHIVED")]
    Archived,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "note")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// Rich-text representation, kept alongside the plain body.
    pub body_json: Option<Json>,
    pub status: NoteStatus,
    pub scheduled_to: Option<DateTime>,
    /// Actual publish time when the note went out via a schedule.
    pub sent_via_schedule_at: Option<DateTime>,
    /// External id assigned by Substack once published.
    pub substack_note_id: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::domain::schedule::entity::scheduled_note::Entity")]
    ScheduledNote,
    #[sea_orm(has_many = "super::substack_published_note::Entity")]
    SubstackPublishedNote,
}

impl Related<crate::domain::schedule::entity::scheduled_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduledNote.def()
    }
}

impl Related<super::substack_published_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubstackPublishedNote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
