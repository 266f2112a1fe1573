use axum::http::HeaderMap;
use chrono::NaiveDateTime;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::dto::{CanPostResponse, TriggeredRequest};
use super::service::{is_stale, ScheduleService};
use crate::domain::note::entity::note::{self, NoteStatus};
use crate::domain::note::entity::substack_published_note;
use crate::utils::error::AppError;

/// Constant-time check of the scheduler's shared secret.
pub fn verify_webhook_key(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let presented = headers
        .get("X-Api-Key")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook call without X-Api-Key header");
            AppError::Unauthorized("Missing API key.".to_string())
        })?;

    if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        warn!("Webhook call with invalid API key");
        return Err(AppError::Unauthorized("Invalid API key.".to_string()));
    }
    Ok(())
}

/// How a triggered report was handled.
#[derive(Debug, PartialEq)]
pub enum TriggeredOutcome {
    /// Failure report or no-op; nothing was mutated.
    Ignored,
    Reconciled { note_id: i64, status: NoteStatus },
}

pub struct WebhookService;

impl WebhookService {
    /// Pre-publish gate the extension calls at fire time.
    ///
    /// A fire past the staleness window answers `canPost: false` and mutates
    /// nothing; the schedule stays as-is for later inspection.
    pub async fn evaluate_can_post(
        db: &DatabaseConnection,
        schedule_id: i64,
        now: NaiveDateTime,
        stale_window_minutes: i64,
    ) -> Result<CanPostResponse, AppError> {
        let schedule = ScheduleService::find_live_by_id(db, schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Schedule not found.".to_string()))?;

        if is_stale(schedule.scheduled_at, now, stale_window_minutes) {
            warn!(
                schedule_row = schedule.id,
                note_id = schedule.note_id,
                scheduled_at = %schedule.scheduled_at,
                fired_at = %now,
                "Stale schedule fire; publish declined"
            );
            return Ok(CanPostResponse {
                can_post: false,
                error: Some("Schedule fire is stale.".to_string()),
            });
        }

        Ok(CanPostResponse {
            can_post: true,
            error: None,
        })
    }

    /// Reconcile the note after the extension reports a publish attempt.
    ///
    /// Failure reports are logged and ignored; success updates the note and
    /// records an audit row. A replayed success for the same
    /// (note, substack note) pair is a no-op on the audit table.
    pub async fn apply_triggered(
        db: &DatabaseConnection,
        schedule_id: i64,
        request: &TriggeredRequest,
        now: NaiveDateTime,
    ) -> Result<TriggeredOutcome, AppError> {
        let schedule = ScheduleService::find_live_by_id(db, schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Schedule not found.".to_string()))?;

        let target = note::Entity::find_by_id(schedule.note_id)
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Note not found.".to_string()))?;

        if !request.ok {
            warn!(
                schedule_row = schedule.id,
                note_id = target.id,
                error = request.error.as_deref().unwrap_or("unknown"),
                "Extension reported publish failure"
            );
            return Ok(TriggeredOutcome::Ignored);
        }

        let status = request.new_status.clone().unwrap_or(NoteStatus::Published);

        let mut update = note::Entity::update_many()
            .col_expr(note::Column::Status, Expr::value(status.clone()))
            .col_expr(note::Column::SentViaScheduleAt, Expr::value(now))
            .col_expr(note::Column::UpdatedAt, Expr::value(now));
        if let Some(substack_note_id) = &request.substack_note_id {
            update = update.col_expr(
                note::Column::SubstackNoteId,
                Expr::value(substack_note_id.clone()),
            );
        }
        update
            .filter(note::Column::Id.eq(target.id))
            .exec(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if let Some(substack_note_id) = &request.substack_note_id {
            Self::record_published(db, target.id, target.user_id, substack_note_id, now).await?;
        }

        info!(
            schedule_row = schedule.id,
            note_id = target.id,
            status = ?status,
            "Reconciled note after schedule fire"
        );
        Ok(TriggeredOutcome::Reconciled {
            note_id: target.id,
            status,
        })
    }

    async fn record_published(
        db: &DatabaseConnection,
        note_id: i64,
        user_id: i64,
        substack_note_id: &str,
        now: NaiveDateTime,
    ) -> Result<(), AppError> {
        let existing = substack_published_note::Entity::find()
            .filter(substack_published_note::Column::NoteId.eq(note_id))
            .filter(substack_published_note::Column::SubstackNoteId.eq(substack_note_id))
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if existing.is_some() {
            info!(note_id, substack_note_id, "Publish already recorded; replay ignored");
            return Ok(());
        }

        substack_published_note::Entity::insert(substack_published_note::ActiveModel {
            note_id: Set(note_id),
            user_id: Set(user_id),
            substack_note_id: Set(substack_note_id.to_string()),
            published_at: Set(now),
            ..Default::default()
        })
        .exec(db)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::entity::scheduled_note;
    use crate::domain::schedule::service::cron_for;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn dt(h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn schedule_model(id: i64, note_id: i64, scheduled_at: NaiveDateTime) -> scheduled_note::Model {
        scheduled_note::Model {
            id,
            note_id,
            user_id: 1,
            scheduled_at,
            cron_expression: cron_for(scheduled_at),
            schedule_id: format!("writestack-note-{note_id}-x"),
            is_deleted: false,
            created_at: dt(0, 0),
            updated_at: dt(0, 0),
        }
    }

    fn note_model(id: i64) -> note::Model {
        note::Model {
            id,
            user_id: 1,
            body: "scheduled body".to_string(),
            body_json: None,
            status: NoteStatus::Scheduled,
            scheduled_to: Some(dt(12, 0)),
            sent_via_schedule_at: None,
            substack_note_id: None,
            is_archived: false,
            created_at: dt(0, 0),
            updated_at: dt(0, 0),
        }
    }

    fn auth_headers(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", key.parse().unwrap());
        headers
    }

    #[test]
    fn verify_webhook_key_should_accept_matching_key() {
        assert!(verify_webhook_key(&auth_headers("secret"), "secret").is_ok());
    }

    #[test]
    fn verify_webhook_key_should_reject_mismatch_and_absence() {
        assert!(matches!(
            verify_webhook_key(&auth_headers("wrong"), "secret"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            verify_webhook_key(&HeaderMap::new(), "secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn evaluate_can_post_should_allow_on_time_fire() {
        // Arrange
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![schedule_model(7, 5, dt(12, 0))]])
            .into_connection();

        // Act
        let response = WebhookService::evaluate_can_post(&db, 7, dt(12, 5), 20)
            .await
            .unwrap();

        // Assert
        assert!(response.can_post);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn evaluate_can_post_should_decline_stale_fire_without_mutation() {
        // Arrange
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![schedule_model(7, 5, dt(12, 0))]])
            .into_connection();

        // Act
        let response = WebhookService::evaluate_can_post(&db, 7, dt(12, 25), 20)
            .await
            .unwrap();

        // Assert
        assert!(!response.can_post);
        assert!(response.error.is_some());
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1, "only the lookup query may run");
    }

    #[tokio::test]
    async fn evaluate_can_post_should_404_for_soft_deleted_schedule() {
        // Arrange
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([Vec::<scheduled_note::Model>::new()])
            .into_connection();

        // Act
        let result = WebhookService::evaluate_can_post(&db, 7, dt(12, 5), 20).await;

        // Assert
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn apply_triggered_should_reconcile_success_report() {
        // Arrange
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![schedule_model(7, 5, dt(12, 0))]])
            .append_query_results([vec![note_model(5)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([Vec::<substack_published_note::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();

        let request = TriggeredRequest {
            ok: true,
            error: None,
            text: Some("published text".to_string()),
            substack_note_id: Some("987654".to_string()),
            new_status: None,
        };

        // Act
        let outcome = WebhookService::apply_triggered(&db, 7, &request, dt(12, 3))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            outcome,
            TriggeredOutcome::Reconciled {
                note_id: 5,
                status: NoteStatus::Published
            }
        );
    }

    #[tokio::test]
    async fn apply_triggered_should_ignore_failure_report() {
        // Arrange
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![schedule_model(7, 5, dt(12, 0))]])
            .append_query_results([vec![note_model(5)]])
            .into_connection();

        let request = TriggeredRequest {
            ok: false,
            error: Some("login expired".to_string()),
            text: None,
            substack_note_id: None,
            new_status: None,
        };

        // Act
        let outcome = WebhookService::apply_triggered(&db, 7, &request, dt(12, 3))
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, TriggeredOutcome::Ignored);
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2, "failure reports must not write anything");
    }

    #[tokio::test]
    async fn apply_triggered_should_skip_duplicate_audit_row() {
        // Arrange
        let already = substack_published_note::Model {
            id: 1,
            note_id: 5,
            user_id: 1,
            substack_note_id: "987654".to_string(),
            published_at: dt(12, 3),
        };
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![schedule_model(7, 5, dt(12, 0))]])
            .append_query_results([vec![note_model(5)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![already]])
            .into_connection();

        let request = TriggeredRequest {
            ok: true,
            error: None,
            text: None,
            substack_note_id: Some("987654".to_string()),
            new_status: Some(NoteStatus::Published),
        };

        // Act
        let outcome = WebhookService::apply_triggered(&db, 7, &request, dt(12, 3))
            .await
            .unwrap();

        // Assert
        assert!(matches!(outcome, TriggeredOutcome::Reconciled { .. }));
        let log = db.into_transaction_log();
        let inserts = log
            .iter()
            .filter(|stmt| format!("{stmt:?}").contains("INSERT"))
            .count();
        assert_eq!(inserts, 0, "replayed fire must not insert a second audit row");
    }
}
