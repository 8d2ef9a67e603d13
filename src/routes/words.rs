use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::operations::{create_custom_word, list_random_words};
use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

const RANDOM_WORDS_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct CreateWordRequest {
    word: String,
    translation: String,
}

pub async fn list_words(State(state): State<AppState>) -> Result<Response, AppError> {
    let proxy = state.db_proxy();
    let words = list_random_words(&proxy, RANDOM_WORDS_LIMIT)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "random words query failed");
            AppError::unavailable("word catalog unavailable")
        })?;

    Ok(Json(SuccessResponse::ok(words)).into_response())
}

pub async fn create_word(
    State(state): State<AppState>,
    Json(payload): Json<CreateWordRequest>,
) -> Result<Response, AppError> {
    let proxy = state.db_proxy();
    let word = create_custom_word(&proxy, &payload.word, &payload.translation).await?;

    tracing::info!(word_id = word.id, text = %word.text, "custom word added");

    Ok((StatusCode::CREATED, Json(SuccessResponse::ok(word))).into_response())
}
