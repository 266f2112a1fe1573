use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use super::client::{build_system_message, build_user_message};
use super::dto::{
    AiCompletionResult, GenerateNotesRequest, IdeasRequest, ImproveNoteRequest, RefineTitleRequest,
    SeoRequest,
};
use super::prompt;
use super::service::{AiService, GatedCompletion};
use crate::domain::billing::entity::ai_usage::UsageType;
use crate::state::AppState;
use crate::utils::{auth::AuthUser, error::AppError, response::ErrorResponse, BaseResponse};

fn to_result(completion: GatedCompletion) -> BaseResponse<AiCompletionResult> {
    BaseResponse::success(AiCompletionResult {
        text: completion.text,
        credits_used: completion.credits_used,
        credits_remaining: completion.credits_remaining,
    })
}

/// Improve a note body.
#[utoipa::path(
    post,
    path = "/api/ai/note/improve",
    request_body = ImproveNoteRequest,
    responses(
        (status = 200, body = AiCompletionResult),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 402, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn improve_note_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ImproveNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let user_id = auth.user_id()?;

    let messages = vec![
        build_system_message(prompt::IMPROVE_NOTE_SYSTEM_PROMPT)?,
        build_user_message(&req.note_body)?,
    ];

    let completion = AiService::run_gated(
        &state.db,
        state.ai.as_ref(),
        &state.config.llm_model,
        user_id,
        UsageType::TextEnhancement,
        messages,
        "ai.note.improve",
    )
    .await?;

    Ok(Json(to_result(completion)))
}

/// Refine a title/subtitle pair.
#[utoipa::path(
    post,
    path = "/api/ai/note/title",
    request_body = RefineTitleRequest,
    responses(
        (status = 200, body = AiCompletionResult),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 402, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn refine_title_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RefineTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let user_id = auth.user_id()?;

    let user_content = match &req.title {
        Some(title) => format!("Current title: {}\n\n{}", title, req.body),
        None => req.body.clone(),
    };
    let messages = vec![
        build_system_message(prompt::TITLE_SYSTEM_PROMPT)?,
        build_user_message(&user_content)?,
    ];

    let completion = AiService::run_gated(
        &state.db,
        state.ai.as_ref(),
        &state.config.llm_model,
        user_id,
        UsageType::TitleOrSubtitleRefinement,
        messages,
        "ai.note.title",
    )
    .await?;

    Ok(Json(to_result(completion)))
}

/// SEO metadata for an article.
#[utoipa::path(
    post,
    path = "/api/ai/seo",
    request_body = SeoRequest,
    responses(
        (status = 200, body = AiCompletionResult),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 402, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn seo_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SeoRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let user_id = auth.user_id()?;

    let user_content = format!("Title: {}\n\n{}", req.title, req.body);
    let messages = vec![
        build_system_message(prompt::SEO_SYSTEM_PROMPT)?,
        build_user_message(&user_content)?,
    ];

    let completion = AiService::run_gated(
        &state.db,
        state.ai.as_ref(),
        &state.config.llm_model,
        user_id,
        UsageType::Seo,
        messages,
        "ai.seo",
    )
    .await?;

    Ok(Json(to_result(completion)))
}

/// Article idea generation.
#[utoipa::path(
    post,
    path = "/api/ai/ideas",
    request_body = IdeasRequest,
    responses(
        (status = 200, body = AiCompletionResult),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 402, body = ErrorResponse),
        (status = 429, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn ideas_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<IdeasRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let user_id = auth.user_id()?;

    let count = req.count.unwrap_or(5);
    let user_content = format!("Topic: {}\nIdeas requested: {}", req.topic, count);
    let messages = vec![
        build_system_message(prompt::IDEAS_SYSTEM_PROMPT)?,
        build_user_message(&user_content)?,
    ];

    let completion = AiService::run_gated(
        &state.db,
        state.ai.as_ref(),
        &state.config.llm_model,
        user_id,
        UsageType::IdeaGeneration,
        messages,
        "ai.ideas",
    )
    .await?;

    Ok(Json(to_result(completion)))
}

/// Draft whole notes from a topic.
#[utoipa::path(
    post,
    path = "/api/ai/notes/generate",
    request_body = GenerateNotesRequest,
    responses(
        (status = 200, body = AiCompletionResult),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 402, body = ErrorResponse),
        (status = 429, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn generate_notes_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<GenerateNotesRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let user_id = auth.user_id()?;

    let count = req.count.unwrap_or(3);
    let user_content = format!("Topic: {}\nNotes requested: {}", req.topic, count);
    let messages = vec![
        build_system_message(prompt::NOTES_SYSTEM_PROMPT)?,
        build_user_message(&user_content)?,
    ];

    let completion = AiService::run_gated(
        &state.db,
        state.ai.as_ref(),
        &state.config.llm_model,
        user_id,
        UsageType::NotesGeneration,
        messages,
        "ai.notes.generate",
    )
    .await?;

    Ok(Json(to_result(completion)))
}
