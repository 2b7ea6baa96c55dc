//! Event broadcast plumbing — mirrors `gglib-core`'s `AppEventEmitter` /
//! `NoopEmitter` pattern so pipeline state changes can be observed by
//! whatever surface is listening (HTTP/SSE, GUI, logs) without the pipeline
//! knowing about any of them.

use std::fmt;

/// Events the pipeline broadcasts to observers. State-change events are
/// deduplicated before emission (identical consecutive states are not
/// reported twice — see `vocora_pipeline::orchestrator`).
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    StateChanged(String),
    Transcript { text: String, is_final: bool },
    SpeakingStarted,
    SpeakingFinished,
    AudioLevel(f32),
    Error(String),
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateChanged(s) => write!(f, "state changed: {s}"),
            Self::Transcript { text, is_final } => {
                write!(f, "transcript ({}): {text}", if *is_final { "final" } else { "partial" })
            }
            Self::SpeakingStarted => write!(f, "speaking started"),
            Self::SpeakingFinished => write!(f, "speaking finished"),
            Self::AudioLevel(level) => write!(f, "audio level: {level:.3}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Broadcast sink for [`AppEvent`]s. Implementors must be cheaply cloneable
/// (the pipeline clones one emitter per worker task) and thread-safe.
pub trait AppEventEmitter: Send + Sync {
    fn emit(&self, event: AppEvent);

    /// Clone this emitter into a boxed trait object, for storing behind a
    /// `Box<dyn AppEventEmitter>` field.
    fn clone_box(&self) -> Box<dyn AppEventEmitter>;
}

impl Clone for Box<dyn AppEventEmitter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// No-op emitter for tests and CLI contexts with no observer attached.
#[derive(Debug, Default, Clone)]
pub struct NoopEmitter;

impl AppEventEmitter for NoopEmitter {
    fn emit(&self, _event: AppEvent) {}

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}
