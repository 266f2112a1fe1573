use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use tower::ServiceExt;

use writestack_server::config::AppConfig;
use writestack_server::domain::ai::client::AiClientTrait;
use writestack_server::domain::schedule::entity::scheduled_note;
use writestack_server::domain::schedule::service::cron_for;
use writestack_server::domain::schedule::trigger::{
    ScheduleDefinition, ScheduleResource, SchedulerClientTrait,
};
use writestack_server::state::AppState;
use writestack_server::utils::error::AppError;

struct StubAiClient;

#[async_trait::async_trait]
impl AiClientTrait for StubAiClient {
    async fn complete(
        &self,
        _messages: Vec<async_openai::types::ChatCompletionRequestMessage>,
        _model: &str,
        _caller_tag: &str,
    ) -> Result<String, AppError> {
        Ok("stub completion".to_string())
    }
}

struct StubSchedulerClient;

#[async_trait::async_trait]
impl SchedulerClientTrait for StubSchedulerClient {
    async fn create_schedule(&self, _definition: &ScheduleDefinition) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_schedule(&self, _name: &str) -> Result<Option<ScheduleResource>, AppError> {
        Ok(None)
    }

    async fn update_schedule(&self, _definition: &ScheduleDefinition) -> Result<(), AppError> {
        Ok(())
    }

    async fn delete_schedule(&self, _name: &str) -> Result<(), AppError> {
        Ok(())
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server_port: 0,
        database_url: "mysql://unused".to_string(),
        jwt_secret: "test-secret".to_string(),
        openrouter_api_key: "test-key".to_string(),
        llm_model: "openai/gpt-4o-mini".to_string(),
        scheduler_base_url: "http://localhost:9090".to_string(),
        scheduler_api_key: "scheduler-key".to_string(),
        webhook_api_key: "webhook-secret".to_string(),
        callback_base_url: "http://localhost:8080".to_string(),
        min_schedule_lead_minutes: 15,
        stale_window_minutes: 20,
    }
}

fn app_with(db: DatabaseConnection) -> axum::Router {
    writestack_server::app(AppState {
        db: Arc::new(db),
        config: test_config(),
        ai: Arc::new(StubAiClient),
        scheduler: Arc::new(StubSchedulerClient),
    })
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::MySql).into_connection()
}

#[tokio::test]
async fn health_check_responds_ok() {
    let app = app_with(empty_db());

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn user_endpoints_require_a_bearer_token() {
    let app = app_with(empty_db());

    let response = app
        .oneshot(Request::get("/api/notes").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["isSuccess"], false);
    assert_eq!(json["code"], "COMMON401");
}

#[tokio::test]
async fn webhooks_reject_a_missing_shared_secret() {
    let app = app_with(empty_db());

    let response = app
        .oneshot(
            Request::post("/api/schedule/1/can-post")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn can_post_allows_a_timely_fire() {
    // Arrange: a live schedule planned for right now.
    let now = Utc::now().naive_utc();
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![scheduled_note::Model {
            id: 1,
            note_id: 5,
            user_id: 7,
            scheduled_at: now,
            cron_expression: cron_for(now),
            schedule_id: "writestack-note-5-x".to_string(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }]])
        .into_connection();
    let app = app_with(db);

    // Act
    let response = app
        .oneshot(
            Request::post("/api/schedule/1/can-post")
                .header("X-Api-Key", "webhook-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert: raw contract body, no envelope.
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"canPost": true}));
}

#[tokio::test]
async fn can_post_answers_404_for_unknown_schedule() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<scheduled_note::Model>::new()])
        .into_connection();
    let app = app_with(db);

    let response = app
        .oneshot(
            Request::post("/api/schedule/99/can-post")
                .header("X-Api-Key", "webhook-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
