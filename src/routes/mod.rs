mod chat;
mod health;
mod words;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::ErrorResponse;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route(
            "/api/words",
            get(words::list_words).post(words::create_word),
        )
        .route("/api/chat/:chat_id", post(chat::handle_event))
        .route("/api/chat/:chat_id/session", get(chat::session))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(ErrorResponse {
            success: false,
            error: "route not found".to_string(),
            code: "NOT_FOUND".to_string(),
        }),
    )
        .into_response()
}
