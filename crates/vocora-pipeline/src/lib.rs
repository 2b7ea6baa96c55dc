//! The concurrent voice assistant pipeline core.
//!
//! Wires together the Audio Device Manager, AGC, VAD gate, utterance
//! collector, sentence segmenter, emotion parser, text preparation,
//! response engine, barge-in monitor, conversation history and the
//! top-level orchestrator state machine described in the component design.
//!
//! `vocora-core` defines the seams (ports, DTOs, external-collaborator
//! traits); this crate is the one implementation of the orchestrator that
//! lives behind them.

pub mod agc;
pub mod audio;
pub mod barge_in;
pub mod config;
pub mod emotion;
pub mod gate;
pub mod history;
pub mod orchestrator;
pub mod response_engine;
pub mod segmenter;
pub mod state;
pub mod text_prep;
pub mod utterance;
pub mod vad;
pub mod wav;

pub use config::{ConfigError, PipelineConfig};
pub use orchestrator::{Orchestrator, PipelineHandle};
pub use state::PipelineState;
