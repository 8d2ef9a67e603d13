use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use danci_repeat::store::ProgressStore;

mod common;

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn chat(app: &Router, chat_id: i64, event: Value) -> Value {
    let (status, body) = send(app, Method::POST, &format!("/api/chat/{chat_id}"), Some(event)).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

#[tokio::test]
async fn test_health_root() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let (app, _state) = common::create_test_app(&env).await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_health_counts_only_active_sessions() {
    let env = common::test_env(&[("casa", "house")]);
    let (app, _state) = common::create_test_app(&env).await;

    chat(&app, 1, json!({ "type": "command", "name": "learn" })).await;
    chat(&app, 3, json!({ "type": "command", "name": "start" })).await;

    let (_, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(body["activeSessions"], 1);
    assert_eq!(body["trackedChats"], 1);

    // committing the only word leaves nothing to learn, so the chat goes idle
    let done = chat(&app, 1, json!({ "type": "text", "text": "Start learning" })).await;
    assert_eq!(done["keyboard"], "none");

    let (_, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(body["activeSessions"], 0);
    assert_eq!(body["trackedChats"], 0);
}

#[tokio::test]
async fn test_health_live() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let (app, _state) = common::create_test_app(&env).await;

    let (status, body) = send(&app, Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let (app, _state) = common::create_test_app(&env).await;

    let (status, body) = send(&app, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_words_returns_at_most_five() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let (app, _state) = common::create_test_app(&env).await;

    let (status, body) = send(&app, Method::GET, "/api/words", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_create_word_then_conflict() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let (app, _state) = common::create_test_app(&env).await;
    let payload = json!({ "word": "árbol", "translation": "tree" });

    let (status, body) = send(&app, Method::POST, "/api/words", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["text"], "árbol");
    assert_eq!(body["data"]["isCustom"], true);

    let (status, body) = send(&app, Method::POST, "/api/words", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_blank_word_is_rejected() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let (app, _state) = common::create_test_app(&env).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/words",
        Some(json!({ "word": " ", "translation": "tree" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_chat_learn_flow_commits_progress() {
    let env = common::test_env(&[("casa", "house")]);
    let (app, state) = common::create_test_app(&env).await;

    let menu = chat(&app, 77, json!({ "type": "command", "name": "start" })).await;
    assert_eq!(menu["keyboard"], "menu");

    let shown = chat(&app, 77, json!({ "type": "button", "data": "learn" })).await;
    assert_eq!(shown["text"], "house");
    assert_eq!(shown["keyboard"], "learn");

    let (status, session) = send(&app, Method::GET, "/api/chat/77/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["data"]["mode"], "learning");
    assert_eq!(session["data"]["wrongAttempts"], 0);

    let wrong = chat(&app, 77, json!({ "type": "text", "text": "cosa" })).await;
    assert_eq!(wrong["text"], "house\nWrong, attempts: 1/3");

    let revealed = chat(&app, 77, json!({ "type": "text", "text": "CASA" })).await;
    assert_eq!(revealed["text"], "casa\nhouse");

    let done = chat(&app, 77, json!({ "type": "text", "text": "Start learning" })).await;
    assert_eq!(done["keyboard"], "none");

    let (status, _) = send(&app, Method::GET, "/api/chat/77/session", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let proxy = state.db_proxy();
    let casa = danci_repeat::db::operations::find_word_by_text(&proxy, "casa")
        .await
        .unwrap()
        .unwrap();
    let row = proxy.get_progress(77, casa.id).await.unwrap().unwrap();
    assert_eq!(row.level, 0);
    assert!(row.next_revise.is_some());
}

#[tokio::test]
async fn test_chat_free_text_without_session_shows_menu() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let (app, _state) = common::create_test_app(&env).await;

    let reply = chat(&app, 5, json!({ "type": "text", "text": "hola" })).await;
    assert_eq!(reply["keyboard"], "menu");
    assert_eq!(reply["chatId"], 5);
}
