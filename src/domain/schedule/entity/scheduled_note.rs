use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Durable link between a note and a future publish time.
///
/// Rows are never hard-deleted; `is_deleted` is the identity predicate and
/// at most one live row may exist per note. `schedule_id` is the external
/// scheduler's resource name.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scheduled_note")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub note_id: i64,
    pub user_id: i64,
    pub scheduled_at: DateTime,
    pub cron_expression: String,
    pub schedule_id: String,
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::note::entity::note::Entity",
        from = "Column::NoteId",
        to = "crate::domain::note::entity::note::Column::Id"
    )]
    Note,
}

impl Related<crate::domain::note::entity::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Note.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
