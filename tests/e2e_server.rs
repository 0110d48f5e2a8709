//! End-to-end HTTP API tests.
//!
//! These tests start the axum server on a real socket, point it at a
//! scripted WebSocket service, and drive it with reqwest.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use livegen::server::{serve_listener, AppState};
use livegen::Config;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Start a service that answers every session with the given frames.
/// Returns the WebSocket URL.
async fn scripted_service(frames: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let frames = frames.clone();
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut tx, mut rx) = ws.split();
                let _request = rx.next().await;
                for frame in frames {
                    let _ = tx.send(Message::Text(frame.to_string())).await;
                }
                while let Some(Ok(_)) = rx.next().await {}
            });
        }
    });

    format!("ws://{}", addr)
}

/// Start the HTTP server. Returns its base URL.
async fn start_server(config: Config) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(config));

    tokio::spawn(async move {
        let _ = serve_listener(listener, state).await;
    });

    format!("http://{}", addr)
}

fn config_for(endpoint: String) -> Config {
    let mut config = Config::default();
    config.service.endpoint = endpoint;
    config.service.api_key = Some("test-key".to_string());
    config.service.deadline_secs = 5;
    config
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let base = start_server(Config::default()).await;

    let response = client().get(format!("{base}/health")).send().await.unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], livegen::VERSION);
}

#[tokio::test]
async fn test_generate_video_success() {
    let endpoint = scripted_service(vec![
        r#"{"percent": 50}"#,
        r#"{"link":"https://cdn.example/v.mp4","srt_link":"https://cdn.example/v.srt"}"#,
    ])
    .await;
    let base = start_server(config_for(endpoint)).await;

    let response = client()
        .post(format!("{base}/api/videos"))
        .json(&json!({
            "question_text": "If 3x + 2 = 11, what is x?",
            "correct_answer": "3",
            "explanation": "Subtract 2, then divide by 3"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["video_url"], "https://cdn.example/v.mp4");
    assert_eq!(body["srt_link"], "https://cdn.example/v.srt");
    assert!(body.get("vtt_link").is_none());
    assert!(body.get("prompt").is_none());

    let token = body["share_token"].as_str().unwrap();
    assert_eq!(token.len(), 36);
}

#[tokio::test]
async fn test_generate_video_with_custom_prompt() {
    let endpoint = scripted_service(vec![
        r#"{"video_link":"https://cdn.example/alt.mp4","status":"completed"}"#,
    ])
    .await;
    let base = start_server(config_for(endpoint)).await;

    let response = client()
        .post(format!("{base}/api/videos"))
        .json(&json!({ "prompt": "Explain completing the square" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["video_url"], "https://cdn.example/alt.mp4");
    assert_eq!(body["prompt"], "Explain completing the square");
}

#[tokio::test]
async fn test_validation_error() {
    let base = start_server(config_for("ws://127.0.0.1:1".to_string())).await;

    let response = client()
        .post(format!("{base}/api/videos"))
        .json(&json!({ "explanation": "context only" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_api_key() {
    let mut config = config_for("ws://127.0.0.1:1".to_string());
    config.service.api_key = None;
    let base = start_server(config).await;

    let response = client()
        .post(format!("{base}/api/videos"))
        .json(&json!({ "prompt": "Explain" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Video generation service not configured");
}

#[tokio::test]
async fn test_remote_error_is_passed_through() {
    let endpoint = scripted_service(vec![r#"{"type":"error","message":"Invalid API key"}"#]).await;
    let base = start_server(config_for(endpoint)).await;

    let response = client()
        .post(format!("{base}/api/videos"))
        .json(&json!({ "prompt": "Explain" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid API key");
}

#[tokio::test]
async fn test_connection_failure_is_generic() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let base = start_server(config_for(dead)).await;

    let response = client()
        .post(format!("{base}/api/videos"))
        .json(&json!({ "prompt": "Explain" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Failed to generate video. Please try again later."
    );
}

#[tokio::test]
async fn test_rate_limit() {
    let mut config = config_for("ws://127.0.0.1:1".to_string());
    config.server.rate_limit_max = 1;
    let base = start_server(config).await;
    let client = client();

    // Validation failures still count against the limit.
    let first = client
        .post(format!("{base}/api/videos"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::BAD_REQUEST);

    let second = client
        .post(format!("{base}/api/videos"))
        .json(&json!({ "prompt": "Explain" }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));
}
