use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::app_config::AppConfig;
use crate::domain::ai::client::AiClient;
use crate::domain::schedule::trigger::SchedulerClient;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub ai: AiClient,
    pub scheduler: SchedulerClient,
}
