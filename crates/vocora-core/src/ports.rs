//! The `VoicePipelinePort` trait and its transport DTOs.
//!
//! Mirrors `gglib-core::ports::voice::VoicePipelinePort`: the HTTP adapter
//! (`vocora-http`) depends only on this trait and these DTOs, never on the
//! pipeline's internal types. The pipeline crate implements the trait once,
//! behind an `Arc`, and hands that `Arc<dyn VoicePipelinePort>` to the HTTP
//! bootstrap.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `POST /command` response body.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub response: String,
    pub status: &'static str,
}

/// `POST /speak` result. The HTTP handler encodes `response_text` as the
/// `X-Response-Text` header (URL-quoted) and streams `wav_bytes` as the
/// body with `Content-Type: audio/wav`.
#[derive(Debug, Clone)]
pub struct SpeakResult {
    pub response_text: String,
    pub wav_bytes: Vec<u8>,
}

/// `GET /status` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDto {
    pub running: bool,
    pub active: bool,
    pub session: String,
    pub llm_backend: String,
    pub tts_backend: String,
    pub wake_enabled: bool,
    pub memory_enabled: bool,
    pub tools: Vec<String>,
}

/// `GET /tools` list entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclarationDto {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// `GET /tools` response body — `{"tools": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDeclarationDto>,
}

/// `POST /wake` outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WakeOutcome {
    Active,
    AlreadyActive,
}

/// `POST /wake` response body — `{"status": "active" | "already_active"}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WakeResponse {
    pub status: WakeOutcome,
}

/// The port the HTTP adapter consumes. Implemented once by
/// `vocora_pipeline::PipelineHandle`.
///
/// # Design rules
/// - This trait never exposes pipeline-internal types (state enum,
///   worker handles, backend trait objects) — only the DTOs above.
/// - Every method here corresponds to exactly one HTTP endpoint in §4.11.
#[async_trait]
pub trait VoicePipelinePort: Send + Sync {
    /// `POST /command` — run a full LLM turn (no TTS) and return the text.
    /// Must acquire the LLM mutex with a 1 s timeout; `Err(PipelineError::Busy)`
    /// maps to HTTP 409.
    async fn command(&self, text: String) -> Result<CommandResponse>;

    /// `POST /speak` — run a full emotion-aware LLM→TTS turn and return the
    /// synthesized WAV bytes plus the response text. 60 s deadline; a
    /// timeout maps to HTTP 504.
    async fn speak(&self, text: String) -> Result<SpeakResult>;

    /// `POST /wake` — force activation as if the wake word fired.
    async fn wake(&self) -> WakeOutcome;

    /// `GET /status`.
    async fn status(&self) -> StatusDto;

    /// `GET /tools`.
    async fn tools(&self) -> Vec<ToolDeclarationDto>;
}
