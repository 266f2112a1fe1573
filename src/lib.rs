pub mod config;
pub mod domain;
pub mod state;
pub mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        domain::ai::handler::improve_note_handler,
        domain::ai::handler::refine_title_handler,
        domain::ai::handler::seo_handler,
        domain::ai::handler::ideas_handler,
        domain::ai::handler::generate_notes_handler,
        domain::billing::handler::credits_handler,
        domain::billing::handler::plan_preview_handler,
        domain::note::handler::create_note_handler,
        domain::note::handler::list_notes_handler,
        domain::note::handler::get_note_handler,
        domain::note::handler::archive_note_handler,
        domain::schedule::handler::create_schedule_handler,
        domain::schedule::handler::delete_schedule_handler,
        domain::schedule::handler::list_schedules_handler,
        domain::schedule::handler::can_post_handler,
        domain::schedule::handler::triggered_handler,
    ),
    components(schemas(
        domain::ai::dto::ImproveNoteRequest,
        domain::ai::dto::RefineTitleRequest,
        domain::ai::dto::SeoRequest,
        domain::ai::dto::IdeasRequest,
        domain::ai::dto::GenerateNotesRequest,
        domain::ai::dto::AiCompletionResult,
        domain::billing::dto::CreditBalanceResult,
        domain::billing::dto::PlanPreviewResult,
        domain::billing::entity::subscription::Plan,
        domain::billing::entity::subscription::SubscriptionStatus,
        domain::note::dto::CreateNoteRequest,
        domain::note::dto::NoteResult,
        domain::note::entity::note::NoteStatus,
        domain::schedule::dto::CreateScheduleRequest,
        domain::schedule::dto::ScheduleResult,
        domain::schedule::dto::CanPostResponse,
        domain::schedule::dto::TriggeredRequest,
        domain::schedule::dto::TriggeredResponse,
        utils::response::ErrorResponse,
    )),
    tags(
        (name = "writestack", description = "Substack creator toolkit API")
    )
)]
pub struct ApiDoc;

async fn health_check() -> &'static str {
    "OK"
}

/// Build the application router on top of shared state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .route(
            "/api/ai/note/improve",
            post(domain::ai::handler::improve_note_handler),
        )
        .route(
            "/api/ai/note/title",
            post(domain::ai::handler::refine_title_handler),
        )
        .route("/api/ai/seo", post(domain::ai::handler::seo_handler))
        .route("/api/ai/ideas", post(domain::ai::handler::ideas_handler))
        .route(
            "/api/ai/notes/generate",
            post(domain::ai::handler::generate_notes_handler),
        )
        .route(
            "/api/billing/credits",
            get(domain::billing::handler::credits_handler),
        )
        .route(
            "/api/billing/plan-preview",
            get(domain::billing::handler::plan_preview_handler),
        )
        .route(
            "/api/notes",
            post(domain::note::handler::create_note_handler)
                .get(domain::note::handler::list_notes_handler),
        )
        .route("/api/notes/:id", get(domain::note::handler::get_note_handler))
        .route(
            "/api/notes/:id/archive",
            post(domain::note::handler::archive_note_handler),
        )
        .route(
            "/api/notes/:id/schedule",
            post(domain::schedule::handler::create_schedule_handler)
                .delete(domain::schedule::handler::delete_schedule_handler),
        )
        .route(
            "/api/schedules",
            get(domain::schedule::handler::list_schedules_handler),
        )
        .route(
            "/api/schedule/:id/can-post",
            post(domain::schedule::handler::can_post_handler),
        )
        .route(
            "/api/schedule/:id/triggered",
            post(domain::schedule::handler::triggered_handler),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
