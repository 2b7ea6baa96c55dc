//! `AppEventEmitter` that forwards every event to `tracing`.
//!
//! The CLI has no GUI/SSE surface to broadcast to, so this plays the role
//! `NoopEmitter` plays in tests: the one concrete emitter a composition
//! root wires in, logging everything at `info` so `state changed` /
//! `speaking started` transitions show up in the operator's terminal.

use vocora_core::{AppEvent, AppEventEmitter};

#[derive(Debug, Default, Clone)]
pub struct TracingEmitter;

impl AppEventEmitter for TracingEmitter {
    fn emit(&self, event: AppEvent) {
        match &event {
            AppEvent::Error(msg) => tracing::error!(%msg, "pipeline error"),
            AppEvent::AudioLevel(level) => tracing::trace!(level, "audio level"),
            _ => tracing::info!(%event, "pipeline event"),
        }
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}
