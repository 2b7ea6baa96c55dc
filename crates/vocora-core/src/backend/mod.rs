//! External-collaborator interfaces (§6). STT/LLM/TTS/wake/memory are
//! modeled as traits — the concrete engine is a deployment detail selected
//! by a factory at pipeline construction, never inherited from.
//!
//! All traits are object-safe (`&self`-only methods, `Box<dyn Trait>`
//! storage) following `gglib-voice::backend::{SttBackend, TtsBackend}`.

mod llm;
mod memory;
mod stt;
mod tts;
mod vad_model;
mod wake;

pub use llm::{LlmBackend, LlmTurnEvent, ToolCall, ToolDeclaration, ToolExecutor};
pub use memory::{Memory, MemoryStore};
pub use stt::SttBackend;
pub use tts::{TtsAudio, TtsBackend, TtsParams, VoiceGender, VoiceInfo};
pub use vad_model::VadModel;
pub use wake::WakeDetector;
