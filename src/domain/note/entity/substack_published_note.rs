use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit row written when a scheduled publish is reconciled back from the
/// extension. Unique on (note_id, substack_note_id) so duplicate webhook
/// fires cannot double-record.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "substack_published_note")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub note_id: i64,
    pub user_id: i64,
    pub substack_note_id: String,
    pub published_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::note::Entity",
        from = "Column::NoteId",
        to = "super::note::Column::Id"
    )]
    Note,
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Note.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
