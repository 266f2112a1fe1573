use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use tracing::info;

use super::entity::ghostwriter_access::{self, AccessLevel};
use super::entity::note::{self, NoteStatus};
use crate::utils::error::AppError;

pub struct NoteService;

impl NoteService {
    /// Load a note and verify the actor may touch it.
    ///
    /// The actor must own the note or hold an active ghostwriter grant from
    /// the owner (WRITE or FULL for mutations). Ownership never transfers.
    pub async fn resolve_for_actor(
        db: &DatabaseConnection,
        actor_id: i64,
        note_id: i64,
        write: bool,
    ) -> Result<note::Model, AppError> {
        let note = note::Entity::find_by_id(note_id)
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Note not found.".to_string()))?;

        if note.user_id == actor_id {
            return Ok(note);
        }

        let mut grant_query = ghostwriter_access::Entity::find()
            .filter(ghostwriter_access::Column::GhostwriterId.eq(actor_id))
            .filter(ghostwriter_access::Column::OwnerId.eq(note.user_id))
            .filter(ghostwriter_access::Column::IsActive.eq(true));
        if write {
            grant_query = grant_query.filter(
                ghostwriter_access::Column::AccessLevel
                    .is_in([AccessLevel::Write, AccessLevel::Full]),
            );
        }

        let grant = grant_query
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if grant.is_none() {
            return Err(AppError::Forbidden(
                "You do not have access to this note.".to_string(),
            ));
        }

        Ok(note)
    }

    pub async fn create(
        db: &DatabaseConnection,
        user_id: i64,
        body: String,
        body_json: Option<serde_json::Value>,
    ) -> Result<note::Model, AppError> {
        let now = Utc::now().naive_utc();
        let draft = note::ActiveModel {
            user_id: Set(user_id),
            body: Set(body),
            body_json: Set(body_json),
            status: Set(NoteStatus::Draft),
            scheduled_to: Set(None),
            sent_via_schedule_at: Set(None),
            substack_note_id: Set(None),
            is_archived: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = draft
            .insert(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(user_id, note_id = created.id, "Created draft note");
        Ok(created)
    }

    /// The caller's own notes, newest first. Archived notes are hidden.
    pub async fn list(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Vec<note::Model>, AppError> {
        note::Entity::find()
            .filter(note::Column::UserId.eq(user_id))
            .filter(note::Column::IsArchived.eq(false))
            .order_by_desc(note::Column::UpdatedAt)
            .all(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    pub async fn archive(
        db: &DatabaseConnection,
        actor_id: i64,
        note_id: i64,
    ) -> Result<(), AppError> {
        let note = Self::resolve_for_actor(db, actor_id, note_id, true).await?;

        let now = Utc::now().naive_utc();
        note::Entity::update_many()
            .col_expr(note::Column::Status, Expr::value(NoteStatus::Archived))
            .col_expr(note::Column::IsArchived, Expr::value(true))
            .col_expr(note::Column::UpdatedAt, Expr::value(now))
            .filter(note::Column::Id.eq(note.id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(())
    }

    /// Stamp a note as scheduled for the given time.
    pub async fn mark_scheduled(
        db: &DatabaseConnection,
        note_id: i64,
        scheduled_to: NaiveDateTime,
    ) -> Result<(), AppError> {
        let now = Utc::now().naive_utc();
        note::Entity::update_many()
            .col_expr(note::Column::Status, Expr::value(NoteStatus::Scheduled))
            .col_expr(note::Column::ScheduledTo, Expr::value(scheduled_to))
            .col_expr(note::Column::UpdatedAt, Expr::value(now))
            .filter(note::Column::Id.eq(note_id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        Ok(())
    }

    /// Return a note to draft after its schedule is removed.
    pub async fn mark_unscheduled(
        db: &DatabaseConnection,
        note_id: i64,
    ) -> Result<(), AppError> {
        let now = Utc::now().naive_utc();
        note::Entity::update_many()
            .col_expr(note::Column::Status, Expr::value(NoteStatus::Draft))
            .col_expr(note::Column::ScheduledTo, Expr::value(Option::<NaiveDateTime>::None))
            .col_expr(note::Column::UpdatedAt, Expr::value(now))
            .filter(note::Column::Id.eq(note_id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        Ok(())
    }
}
