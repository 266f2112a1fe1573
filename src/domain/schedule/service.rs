use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::entity::scheduled_note;
use super::trigger::{ScheduleDefinition, SchedulerClientTrait};
use crate::domain::note::service::NoteService;
use crate::utils::error::AppError;

/// One-shot cron expression for a UTC instant, EventBridge Scheduler style.
pub fn cron_for(at: NaiveDateTime) -> String {
    format!(
        "cron({} {} {} {} ? {})",
        at.minute(),
        at.hour(),
        at.day(),
        at.month(),
        at.year()
    )
}

/// A fire is stale once it arrives more than `window_minutes` after the
/// planned time. Stale fires must not publish.
pub fn is_stale(scheduled_at: NaiveDateTime, now: NaiveDateTime, window_minutes: i64) -> bool {
    now - scheduled_at > Duration::minutes(window_minutes)
}

/// New schedules need enough lead time for registration to settle.
pub fn has_lead_time(scheduled_at: NaiveDateTime, now: NaiveDateTime, min_minutes: i64) -> bool {
    scheduled_at - now >= Duration::minutes(min_minutes)
}

pub struct ScheduleService;

impl ScheduleService {
    /// The single live schedule for a note, if any.
    pub async fn find_live_for_note(
        db: &DatabaseConnection,
        note_id: i64,
    ) -> Result<Option<scheduled_note::Model>, AppError> {
        scheduled_note::Entity::find()
            .filter(scheduled_note::Column::NoteId.eq(note_id))
            .filter(scheduled_note::Column::IsDeleted.eq(false))
            .order_by_desc(scheduled_note::Column::Id)
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    pub async fn find_live_by_id(
        db: &DatabaseConnection,
        schedule_id: i64,
    ) -> Result<Option<scheduled_note::Model>, AppError> {
        scheduled_note::Entity::find_by_id(schedule_id)
            .filter(scheduled_note::Column::IsDeleted.eq(false))
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// The caller's live schedules, soonest first.
    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Vec<scheduled_note::Model>, AppError> {
        scheduled_note::Entity::find()
            .filter(scheduled_note::Column::UserId.eq(user_id))
            .filter(scheduled_note::Column::IsDeleted.eq(false))
            .order_by_asc(scheduled_note::Column::ScheduledAt)
            .all(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn soft_delete(db: &DatabaseConnection, schedule_id: i64) -> Result<(), AppError> {
        let now = Utc::now().naive_utc();
        scheduled_note::Entity::update_many()
            .col_expr(scheduled_note::Column::IsDeleted, Expr::value(true))
            .col_expr(scheduled_note::Column::UpdatedAt, Expr::value(now))
            .filter(scheduled_note::Column::Id.eq(schedule_id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        Ok(())
    }

    /// Schedule a note for publishing.
    ///
    /// Persists the row first, then registers the external schedule; if
    /// registration fails the row is soft-deleted so no orphan stays live.
    /// An existing live schedule is either a 409 or, with
    /// `delete_if_exists`, superseded.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &DatabaseConnection,
        scheduler: &dyn SchedulerClientTrait,
        actor_id: i64,
        note_id: i64,
        scheduled_at: NaiveDateTime,
        delete_if_exists: bool,
        min_lead_minutes: i64,
        callback_base_url: &str,
    ) -> Result<scheduled_note::Model, AppError> {
        let note = NoteService::resolve_for_actor(db, actor_id, note_id, true).await?;

        let now = Utc::now().naive_utc();
        if !has_lead_time(scheduled_at, now, min_lead_minutes) {
            return Err(AppError::validation_error(format!(
                "Schedule time must be at least {min_lead_minutes} minutes from now."
            )));
        }

        if let Some(existing) = Self::find_live_for_note(db, note_id).await? {
            if !delete_if_exists {
                return Err(AppError::Conflict(
                    "Note already has a live schedule.".to_string(),
                ));
            }
            Self::soft_delete(db, existing.id).await?;
            if let Err(e) = scheduler.delete_schedule(&existing.schedule_id).await {
                warn!(
                    schedule = %existing.schedule_id,
                    error = %e,
                    "Failed to remove superseded external schedule"
                );
            }
            info!(note_id, superseded = existing.id, "Superseded live schedule");
        }

        let name = format!("writestack-note-{}-{}", note_id, Uuid::new_v4());
        let cron_expression = cron_for(scheduled_at);

        let row = scheduled_note::ActiveModel {
            note_id: Set(note_id),
            user_id: Set(note.user_id),
            scheduled_at: Set(scheduled_at),
            cron_expression: Set(cron_expression.clone()),
            schedule_id: Set(name.clone()),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let definition = ScheduleDefinition {
            name,
            cron_expression,
            target_url: format!("{callback_base_url}/api/schedule/{}/can-post", row.id),
            payload: json!({
                "scheduledNoteId": row.id,
                "noteId": note_id,
                "userId": note.user_id,
            }),
        };

        if let Err(register_error) = scheduler.create_schedule(&definition).await {
            // No orphan live rows: a schedule that was never registered
            // upstream must not survive as pending.
            Self::soft_delete(db, row.id).await?;
            warn!(
                note_id,
                schedule_row = row.id,
                error = %register_error,
                "Schedule registration failed; row soft-deleted"
            );
            return Err(register_error);
        }

        NoteService::mark_scheduled(db, note_id, scheduled_at).await?;

        info!(
            note_id,
            schedule_row = row.id,
            scheduled_at = %scheduled_at,
            "Scheduled note for publishing"
        );
        Ok(row)
    }

    /// Remove the live schedule for a note and return it to draft.
    pub async fn delete_for_note(
        db: &DatabaseConnection,
        scheduler: &dyn SchedulerClientTrait,
        actor_id: i64,
        note_id: i64,
    ) -> Result<(), AppError> {
        NoteService::resolve_for_actor(db, actor_id, note_id, true).await?;

        let existing = Self::find_live_for_note(db, note_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No live schedule for this note.".to_string()))?;

        Self::soft_delete(db, existing.id).await?;
        if let Err(e) = scheduler.delete_schedule(&existing.schedule_id).await {
            // The row is already dead; the fire would hit a 404 on can-post.
            warn!(
                schedule = %existing.schedule_id,
                error = %e,
                "Failed to remove external schedule"
            );
        }
        NoteService::mark_unscheduled(db, note_id).await?;

        info!(note_id, schedule_row = existing.id, "Deleted schedule");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::note::entity::note::{self, NoteStatus};
    use crate::domain::schedule::trigger::MockSchedulerClientTrait;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn note_model(id: i64, user_id: i64) -> note::Model {
        note::Model {
            id,
            user_id,
            body: "draft body".to_string(),
            body_json: None,
            status: NoteStatus::Draft,
            scheduled_to: None,
            sent_via_schedule_at: None,
            substack_note_id: None,
            is_archived: false,
            created_at: dt(2026, 1, 1, 0, 0),
            updated_at: dt(2026, 1, 1, 0, 0),
        }
    }

    fn schedule_model(id: i64, note_id: i64, schedule_id: &str) -> scheduled_note::Model {
        scheduled_note::Model {
            id,
            note_id,
            user_id: 1,
            scheduled_at: dt(2026, 3, 10, 12, 30),
            cron_expression: cron_for(dt(2026, 3, 10, 12, 30)),
            schedule_id: schedule_id.to_string(),
            is_deleted: false,
            created_at: dt(2026, 3, 1, 0, 0),
            updated_at: dt(2026, 3, 1, 0, 0),
        }
    }

    #[test]
    fn cron_for_should_emit_one_shot_expression() {
        let at = dt(2026, 3, 10, 12, 30);

        assert_eq!(cron_for(at), "cron(30 12 10 3 ? 2026)");
    }

    #[test]
    fn is_stale_should_reject_fires_past_the_window() {
        let planned = dt(2026, 3, 10, 12, 0);

        assert!(is_stale(planned, dt(2026, 3, 10, 12, 25), 20));
        assert!(!is_stale(planned, dt(2026, 3, 10, 12, 5), 20));
        assert!(!is_stale(planned, dt(2026, 3, 10, 12, 20), 20));
    }

    #[test]
    fn has_lead_time_should_require_minimum_gap() {
        let now = dt(2026, 3, 10, 12, 0);

        assert!(has_lead_time(dt(2026, 3, 10, 12, 15), now, 15));
        assert!(!has_lead_time(dt(2026, 3, 10, 12, 10), now, 15));
        assert!(!has_lead_time(dt(2026, 3, 10, 11, 0), now, 15));
    }

    #[tokio::test]
    async fn create_should_supersede_existing_live_schedule() {
        // Arrange
        let old = schedule_model(7, 5, "writestack-note-5-old");
        let new_row = schedule_model(42, 5, "writestack-note-5-new");
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![note_model(5, 1)]])
            .append_query_results([vec![old]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_exec_results([MockExecResult {
                last_insert_id: 42,
                rows_affected: 1,
            }])
            .append_query_results([vec![new_row]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let mut scheduler = MockSchedulerClientTrait::new();
        scheduler
            .expect_delete_schedule()
            .withf(|name| name == "writestack-note-5-old")
            .times(1)
            .returning(|_| Ok(()));
        scheduler
            .expect_create_schedule()
            .times(1)
            .returning(|_| Ok(()));

        let far_future = Utc::now().naive_utc() + Duration::days(30);

        // Act
        let result = ScheduleService::create(
            &db,
            &scheduler,
            1,
            5,
            far_future,
            true,
            15,
            "https://api.writestack.test",
        )
        .await;

        // Assert
        let row = result.unwrap();
        assert_eq!(row.id, 42);
        assert_eq!(row.note_id, 5);
    }

    #[tokio::test]
    async fn create_should_conflict_when_live_schedule_exists() {
        // Arrange
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![note_model(5, 1)]])
            .append_query_results([vec![schedule_model(7, 5, "writestack-note-5-old")]])
            .into_connection();

        let scheduler = MockSchedulerClientTrait::new();
        let far_future = Utc::now().naive_utc() + Duration::days(30);

        // Act
        let result = ScheduleService::create(
            &db,
            &scheduler,
            1,
            5,
            far_future,
            false,
            15,
            "https://api.writestack.test",
        )
        .await;

        // Assert
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_should_reject_insufficient_lead_time() {
        // Arrange
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![note_model(5, 1)]])
            .into_connection();

        let scheduler = MockSchedulerClientTrait::new();
        let too_soon = Utc::now().naive_utc() + Duration::minutes(5);

        // Act
        let result =
            ScheduleService::create(&db, &scheduler, 1, 5, too_soon, false, 15, "https://x").await;

        // Assert
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn create_should_soft_delete_row_when_registration_fails() {
        // Arrange
        let new_row = schedule_model(42, 5, "writestack-note-5-new");
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![note_model(5, 1)]])
            .append_query_results([Vec::<scheduled_note::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 42,
                rows_affected: 1,
            }])
            .append_query_results([vec![new_row]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let mut scheduler = MockSchedulerClientTrait::new();
        scheduler
            .expect_create_schedule()
            .times(1)
            .returning(|_| Err(AppError::SchedulerError("HTTP 400".to_string())));

        let far_future = Utc::now().naive_utc() + Duration::days(30);

        // Act
        let result = ScheduleService::create(
            &db,
            &scheduler,
            1,
            5,
            far_future,
            false,
            15,
            "https://api.writestack.test",
        )
        .await;

        // Assert
        assert!(matches!(result, Err(AppError::SchedulerError(_))));
        let log = db.into_transaction_log();
        let updates = log
            .iter()
            .filter(|stmt| format!("{stmt:?}").contains("UPDATE"))
            .count();
        assert_eq!(updates, 1, "compensating soft delete must run");
    }
}
