use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::UserId;
use crate::response::{AppError, SuccessResponse};
use crate::services::Inbound;
use crate::state::AppState;

pub async fn handle_event(
    State(state): State<AppState>,
    Path(chat_id): Path<UserId>,
    Json(inbound): Json<Inbound>,
) -> Response {
    let reply = state.turns().handle(chat_id, inbound).await;
    Json(SuccessResponse::ok(reply)).into_response()
}

pub async fn session(
    State(state): State<AppState>,
    Path(chat_id): Path<UserId>,
) -> Result<Response, AppError> {
    let session = state
        .sessions()
        .snapshot(chat_id)
        .await
        .ok_or_else(|| AppError::not_found("no active session"))?;

    Ok(Json(SuccessResponse::ok(session)).into_response())
}
