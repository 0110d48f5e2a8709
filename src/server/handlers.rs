//! HTTP request handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::{AppState, RateDecision};
use crate::prompt::explain_question_prompt;
use crate::protocol::{SessionOutcome, SessionRequest};

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.server.cors_enabled;

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/videos", post(generate_video))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Video generation request
#[derive(Debug, Default, Deserialize)]
pub struct GenerateVideoRequest {
    /// Question to explain
    #[serde(default)]
    pub question_text: Option<String>,
    /// Correct answer to the question
    #[serde(default)]
    pub correct_answer: Option<String>,
    /// Additional explanation for context
    #[serde(default)]
    pub explanation: Option<String>,
    /// Custom task, used verbatim instead of the question template
    #[serde(default)]
    pub prompt: Option<String>,
}

impl GenerateVideoRequest {
    /// Resolve the task sent to the service
    pub fn task(&self) -> Result<String, Vec<String>> {
        if let Some(prompt) = non_blank(self.prompt.as_deref()) {
            return Ok(prompt.to_string());
        }

        let mut errors = Vec::new();
        let question = non_blank(self.question_text.as_deref());
        let answer = non_blank(self.correct_answer.as_deref());
        if question.is_none() {
            errors.push("question_text is required when no prompt is given".to_string());
        }
        if answer.is_none() {
            errors.push("correct_answer is required when no prompt is given".to_string());
        }

        match (question, answer) {
            (Some(question), Some(answer)) => Ok(explain_question_prompt(
                question,
                answer,
                self.explanation.as_deref(),
            )),
            _ => Err(errors),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Video generation response
#[derive(Debug, Serialize)]
pub struct GenerateVideoResponse {
    /// Result location
    pub video_url: String,
    /// WebVTT captions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vtt_link: Option<String>,
    /// SRT captions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srt_link: Option<String>,
    /// Custom prompt, when one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Token for sharing the video
    pub share_token: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Generate a video for a question or custom prompt
async fn generate_video(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(req): Json<GenerateVideoRequest>,
) -> Response {
    tracing::info!(client = %peer.ip(), "Video generation request received");

    if let RateDecision::Limited { retry_after } = state.limiter.check(peer.ip()).await {
        tracing::warn!(client = %peer.ip(), "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.as_secs().max(1).to_string())],
            Json(serde_json::json!({
                "error": "Too many video generation requests, please try again later"
            })),
        )
            .into_response();
    }

    let task = match req.task() {
        Ok(task) => task,
        Err(errors) => {
            tracing::warn!(?errors, "Validation errors");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "errors": errors })),
            )
                .into_response();
        },
    };

    let Some(api_key) = state.config.service.api_key.clone() else {
        tracing::error!("KNOWLIFY_API_KEY not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Video generation service not configured",
        );
    };

    match state.driver.run(SessionRequest::new(task, api_key)).await {
        SessionOutcome::Completed(artifact) => {
            let share_token = uuid::Uuid::new_v4().to_string();
            tracing::info!(url = %artifact.location, "Video generated successfully");

            let response = GenerateVideoResponse {
                video_url: artifact.location,
                vtt_link: artifact.vtt_link,
                srt_link: artifact.srt_link,
                prompt: req.prompt.filter(|p| !p.trim().is_empty()),
                share_token,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        },
        SessionOutcome::Failed(failure) => {
            tracing::error!(kind = failure.kind(), "Video generation failed: {}", failure);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &failure.public_message())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(config: Config) -> Router {
        create_router(Arc::new(AppState::new(config)))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = test_app(Config::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_body() {
        let response = test_app(Config::default())
            .oneshot(
                Request::post("/api/videos")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_without_credential() {
        let response = test_app(Config::default())
            .oneshot(
                Request::post("/api/videos")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"prompt":"Explain"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Video generation service not configured");
    }

    #[test]
    fn test_task_from_prompt() {
        let req = GenerateVideoRequest {
            prompt: Some("Explain derivatives".to_string()),
            ..Default::default()
        };
        assert_eq!(req.task().unwrap(), "Explain derivatives");
    }

    #[test]
    fn test_task_from_question() {
        let req = GenerateVideoRequest {
            question_text: Some("What is 5 * 6?".to_string()),
            correct_answer: Some("30".to_string()),
            prompt: Some("   ".to_string()),
            ..Default::default()
        };
        let task = req.task().unwrap();
        assert!(task.starts_with("Explain how to solve this SAT math question: What is 5 * 6?"));
        assert!(task.contains("The correct answer is 30."));
    }

    #[test]
    fn test_task_validation_errors() {
        let errors = GenerateVideoRequest::default().task().unwrap_err();
        assert_eq!(errors.len(), 2);

        let req = GenerateVideoRequest {
            question_text: Some("What is 5 * 6?".to_string()),
            ..Default::default()
        };
        let errors = req.task().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("correct_answer"));
    }
}
