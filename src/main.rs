use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use writestack_server::config::{database, AppConfig};
use writestack_server::domain::ai::client::OpenRouterClient;
use writestack_server::domain::schedule::trigger::HttpSchedulerClient;
use writestack_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let db = database::establish_connection(&config.database_url).await?;

    let ai = Arc::new(OpenRouterClient::new(&config.openrouter_api_key));
    let scheduler = Arc::new(HttpSchedulerClient::new(
        &config.scheduler_base_url,
        &config.scheduler_api_key,
        &config.webhook_api_key,
    ));

    let server_port = config.server_port;
    let state = AppState {
        db: Arc::new(db),
        config,
        ai,
        scheduler,
    };

    let app = writestack_server::app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server_port)).await?;
    tracing::info!("WriteStack server listening on port {server_port}");
    axum::serve(listener, app).await?;

    Ok(())
}
