use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use super::dto::{CreateNoteRequest, NoteResult};
use super::service::NoteService;
use crate::state::AppState;
use crate::utils::{auth::AuthUser, error::AppError, response::ErrorResponse, BaseResponse};

/// Create a draft note.
#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 200, body = NoteResult),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn create_note_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let user_id = auth.user_id()?;

    let note = NoteService::create(&state.db, user_id, req.body, req.body_json).await?;

    Ok(Json(BaseResponse::success(NoteResult::from(note))))
}

/// The caller's notes, newest first, archived notes hidden.
#[utoipa::path(
    get,
    path = "/api/notes",
    responses(
        (status = 200, body = [NoteResult]),
        (status = 401, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn list_notes_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user_id = auth.user_id()?;

    let notes = NoteService::list(&state.db, user_id).await?;
    let results: Vec<NoteResult> = notes.into_iter().map(NoteResult::from).collect();

    Ok(Json(BaseResponse::success(results)))
}

/// A single note, readable by its owner or an active ghostwriter.
#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(("id" = i64, Path, description = "Note id")),
    responses(
        (status = 200, body = NoteResult),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn get_note_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = auth.user_id()?;

    let note = NoteService::resolve_for_actor(&state.db, user_id, note_id, false).await?;

    Ok(Json(BaseResponse::success(NoteResult::from(note))))
}

/// Archive a note. Terminal for the scheduling flow.
#[utoipa::path(
    post,
    path = "/api/notes/{id}/archive",
    params(("id" = i64, Path, description = "Note id")),
    responses(
        (status = 200),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn archive_note_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = auth.user_id()?;

    NoteService::archive(&state.db, user_id, note_id).await?;

    Ok(Json(BaseResponse::success(())))
}
