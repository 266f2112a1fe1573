use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::utils::error::AppError;
use crate::utils::retry::with_retry;

/// Retry attempts configured on the external schedule itself.
const SCHEDULE_MAX_RETRY_ATTEMPTS: u32 = 2;

/// A one-shot HTTP callback to register with the external scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDefinition {
    /// External resource name; also stored on the scheduled_note row.
    pub name: String,
    pub cron_expression: String,
    /// Webhook URL the scheduler will POST to at fire time.
    pub target_url: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResource {
    pub name: String,
    pub schedule_expression: String,
}

/// Scheduler API interface, mockable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SchedulerClientTrait: Send + Sync {
    async fn create_schedule(&self, definition: &ScheduleDefinition) -> Result<(), AppError>;
    /// "Not found" is a `None`, not an error.
    async fn get_schedule(&self, name: &str) -> Result<Option<ScheduleResource>, AppError>;
    async fn update_schedule(&self, definition: &ScheduleDefinition) -> Result<(), AppError>;
    /// Deleting a missing schedule succeeds; the resource auto-deletes after
    /// firing anyway.
    async fn delete_schedule(&self, name: &str) -> Result<(), AppError>;
}

/// Arc-wrapped scheduler client (Clone support).
pub type SchedulerClient = Arc<dyn SchedulerClientTrait>;

/// REST adapter for the EventBridge-Scheduler-shaped API.
#[derive(Clone)]
pub struct HttpSchedulerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Shared secret the scheduler presents back to our webhooks.
    callback_api_key: String,
}

impl HttpSchedulerClient {
    pub fn new(base_url: &str, api_key: &str, callback_api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            callback_api_key: callback_api_key.to_string(),
        }
    }

    fn schedule_url(&self, name: &str) -> String {
        format!("{}/schedules/{}", self.base_url, name)
    }

    fn definition_body(&self, definition: &ScheduleDefinition) -> serde_json::Value {
        json!({
            "scheduleExpression": definition.cron_expression,
            "actionAfterCompletion": "DELETE",
            "retryPolicy": { "maximumRetryAttempts": SCHEDULE_MAX_RETRY_ATTEMPTS },
            "target": {
                "url": definition.target_url,
                "method": "POST",
                "headers": { "X-Api-Key": self.callback_api_key },
                "input": definition.payload,
            },
        })
    }

    async fn put_schedule(&self, definition: &ScheduleDefinition) -> Result<(), AppError> {
        let response = self
            .http
            .put(self.schedule_url(&definition.name))
            .bearer_auth(&self.api_key)
            .json(&self.definition_body(definition))
            .send()
            .await
            .map_err(|e| AppError::SchedulerError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SchedulerError(format!(
                "PUT schedule {} failed with {}: {}",
                definition.name, status, body
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SchedulerClientTrait for HttpSchedulerClient {
    async fn create_schedule(&self, definition: &ScheduleDefinition) -> Result<(), AppError> {
        with_retry(|| self.put_schedule(definition)).await?;
        info!(schedule = %definition.name, "Registered external schedule");
        Ok(())
    }

    async fn get_schedule(&self, name: &str) -> Result<Option<ScheduleResource>, AppError> {
        let response = with_retry(|| async {
            self.http
                .get(self.schedule_url(name))
                .bearer_auth(&self.api_key)
                .send()
                .await
                .map_err(|e| AppError::SchedulerError(e.to_string()))
        })
        .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SchedulerError(format!(
                "GET schedule {} failed with {}",
                name, status
            )));
        }

        let resource = response
            .json::<ScheduleResource>()
            .await
            .map_err(|e| AppError::SchedulerError(e.to_string()))?;
        Ok(Some(resource))
    }

    async fn update_schedule(&self, definition: &ScheduleDefinition) -> Result<(), AppError> {
        with_retry(|| self.put_schedule(definition)).await?;
        info!(schedule = %definition.name, "Updated external schedule");
        Ok(())
    }

    async fn delete_schedule(&self, name: &str) -> Result<(), AppError> {
        let response = with_retry(|| async {
            self.http
                .delete(self.schedule_url(name))
                .bearer_auth(&self.api_key)
                .send()
                .await
                .map_err(|e| AppError::SchedulerError(e.to_string()))
        })
        .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(schedule = %name, "External schedule already gone");
            return Ok(());
        }
        if !status.is_success() {
            return Err(AppError::SchedulerError(format!(
                "DELETE schedule {} failed with {}",
                name, status
            )));
        }
        Ok(())
    }
}
