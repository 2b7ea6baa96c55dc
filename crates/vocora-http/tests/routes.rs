//! Integration tests for the HTTP surface, driven against a mock
//! `VoicePipelinePort` rather than the real pipeline (this crate never
//! depends on `vocora-pipeline`).

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use vocora_core::{
    CommandResponse, PipelineError, Result, SpeakResult, StatusDto, ToolDeclarationDto,
    VoicePipelinePort, WakeOutcome,
};
use vocora_http::routes::{create_router, CorsConfig};

struct MockPipeline {
    busy: bool,
}

#[async_trait]
impl VoicePipelinePort for MockPipeline {
    async fn command(&self, text: String) -> Result<CommandResponse> {
        if self.busy {
            return Err(PipelineError::Busy);
        }
        Ok(CommandResponse { response: format!("echo: {text}"), status: "ok" })
    }

    async fn speak(&self, text: String) -> Result<SpeakResult> {
        if self.busy {
            return Err(PipelineError::Busy);
        }
        Ok(SpeakResult { response_text: text, wav_bytes: vec![1, 2, 3, 4] })
    }

    async fn wake(&self) -> WakeOutcome {
        WakeOutcome::Active
    }

    async fn status(&self) -> StatusDto {
        StatusDto {
            running: true,
            active: false,
            session: "test".to_string(),
            llm_backend: "mock".to_string(),
            tts_backend: "mock".to_string(),
            wake_enabled: true,
            memory_enabled: false,
            tools: vec![],
        }
    }

    async fn tools(&self) -> Vec<ToolDeclarationDto> {
        vec![ToolDeclarationDto {
            name: "get_time".to_string(),
            description: "returns the current time".to_string(),
            parameters: serde_json::json!({}),
        }]
    }
}

fn app(busy: bool) -> axum::Router {
    let state: Arc<dyn VoicePipelinePort> = Arc::new(MockPipeline { busy });
    create_router(state, &CorsConfig::AllowAll)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = app(false)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn command_returns_response_text() {
    let response = app(false)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/command")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text":"hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["response"], "echo: hello");
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn command_maps_busy_to_409() {
    let response = app(true)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/command")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text":"hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn speak_returns_wav_bytes_and_text_header() {
    let response = app(false)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/speak")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text":"hi there"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/wav"
    );
    assert_eq!(response.headers().get("x-response-text").unwrap(), "hi there");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &[1, 2, 3, 4]);
}

#[tokio::test]
async fn wake_returns_outcome() {
    let response = app(false)
        .oneshot(Request::builder().method("POST").uri("/wake").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json, serde_json::json!({"status": "active"}));
}

#[tokio::test]
async fn status_returns_dto() {
    let response = app(false)
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["llm_backend"], "mock");
    assert_eq!(json["running"], true);
}

#[tokio::test]
async fn tools_returns_declarations() {
    let response = app(false)
        .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["tools"].as_array().unwrap().len(), 1);
    assert_eq!(json["tools"][0]["name"], "get_time");
}
