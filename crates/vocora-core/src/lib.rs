//! Transport-agnostic core of the voice pipeline: DTOs, port traits, and the
//! external-collaborator interfaces (§6) the pipeline consumes.
//!
//! This crate has no dependency on `vocora-pipeline` or `vocora-http` — it
//! is the seam both of them talk across, following the same one-way
//! dependency direction as the rest of this codebase's ports-and-adapters
//! split.

pub mod backend;
pub mod error;
pub mod events;
pub mod ports;

pub use backend::{
    LlmBackend, LlmTurnEvent, Memory, MemoryStore, SttBackend, ToolCall, ToolDeclaration,
    ToolExecutor, TtsAudio, TtsBackend, TtsParams, VadModel, VoiceGender, VoiceInfo, WakeDetector,
};
pub use error::{PipelineError, Result};
pub use events::{AppEvent, AppEventEmitter, NoopEmitter};
pub use ports::{
    CommandResponse, SpeakResult, StatusDto, ToolDeclarationDto, ToolsResponse, VoicePipelinePort,
    WakeOutcome, WakeResponse,
};
