//! Core error taxonomy (§7).

use thiserror::Error;

/// Errors surfaced by the pipeline to its callers (orchestrator and HTTP
/// surface alike).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing credentials, bad backend name — surfaced at load time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// STT/LLM/TTS/wake-word load failure or health-check failure.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Rate limit or network hiccup talking to the LLM backend.
    #[error("transient LLM error: {0}")]
    TransientLlm(String),

    /// A registered tool raised while executing.
    #[error("tool execution error: {0}")]
    ToolExecution(String),

    /// Capture or playback device failure. Not fatal — logged and retried.
    #[error("audio device error: {0}")]
    AudioDevice(String),

    /// The LLM mutex try-lock failed (HTTP surface busy path).
    #[error("pipeline is busy")]
    Busy,

    /// `/speak` or `/command` exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// The pipeline is not in a state that accepts this request (e.g. not
    /// yet loaded, or already stopped).
    #[error("pipeline not ready: {0}")]
    NotReady(String),

    /// A worker task ended with an unrecoverable error; the pipeline is
    /// being driven to `Stopped`.
    #[error("fatal worker error: {0}")]
    Fatal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
