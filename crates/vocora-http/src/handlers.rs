//! HTTP handlers for the voice pipeline's remote control surface (§4.11).
//!
//! Thin wrappers — each calls exactly one [`vocora_core::VoicePipelinePort`]
//! method and translates its DTO into an HTTP response.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use vocora_core::{CommandResponse, StatusDto, ToolsResponse, WakeResponse};

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

/// `POST /command`
pub async fn command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, HttpError> {
    Ok(Json(state.command(req.text).await?))
}

/// `POST /speak` — returns the synthesized WAV as the body, with the
/// response text carried in the `X-Response-Text` header rather than a
/// JSON envelope, since the body itself is binary audio.
pub async fn speak(
    State(state): State<AppState>,
    Json(req): Json<SpeakRequest>,
) -> Result<Response, HttpError> {
    let result = state.speak(req.text).await?;
    let header_value = urlencoding_quote(&result.response_text);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::HeaderName::from_static("x-response-text"),
                header_value,
            ),
        ],
        result.wav_bytes,
    )
        .into_response())
}

/// `POST /wake`
pub async fn wake(State(state): State<AppState>) -> Json<WakeResponse> {
    Json(WakeResponse { status: state.wake().await })
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<StatusDto> {
    Json(state.status().await)
}

/// `GET /tools`
pub async fn tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse { tools: state.tools().await })
}

/// Minimal percent-encoding for a header value: HTTP header values cannot
/// carry raw control characters or non-ASCII bytes, so anything outside the
/// printable-ASCII range is escaped.
fn urlencoding_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_graphic() || byte == b' ' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoding_quote_passes_through_printable_ascii() {
        assert_eq!(urlencoding_quote("hello world"), "hello world");
    }

    #[test]
    fn urlencoding_quote_escapes_newlines() {
        assert_eq!(urlencoding_quote("a\nb"), "a%0Ab");
    }
}
