//! Shared application state type.

use std::sync::Arc;

use vocora_core::VoicePipelinePort;

/// Application state shared across all handlers. An `Arc<dyn VoicePipelinePort>`
/// rather than a concrete pipeline type — this crate never depends on
/// `vocora-pipeline` (see `vocora_core::ports`).
pub type AppState = Arc<dyn VoicePipelinePort>;
