//! Text-to-speech collaborator interface.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Generation parameters tied to an emotion label (§3 `Preset`).
///
/// Produced by the pipeline's emotion parser and passed through unchanged;
/// this crate only needs the shape, not the parsing logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TtsParams {
    pub exaggeration: f32,
    pub cfg_weight: f32,
    pub temperature: f32,
}

/// One synthesized segment of audio.
#[derive(Debug, Clone)]
pub struct TtsAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceGender {
    Female,
    Male,
}

#[derive(Debug, Clone)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub gender: VoiceGender,
}

/// `load`, `unload`, `SAMPLE_RATE` (post-load), `synthesize_stream`.
///
/// The "stream" in the interface name describes what the *caller* does
/// with the result across segments (one call per sentence segment, fed
/// into the response engine's `audio_q`) — each call synthesizes one
/// complete segment's audio in one shot, matching the granularity the
/// response engine's fade-in/out processing needs (§4.7). Cancellation is
/// cooperative: the caller simply stops calling `synthesize`; there is no
/// `cancel` method because a single call cannot outlive the `await`.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    async fn synthesize(&self, text: &str, params: Option<TtsParams>) -> Result<TtsAudio>;

    fn set_voice(&self, voice_id: &str) -> Result<()>;
    fn set_speed(&self, speed: f32);
    fn voice(&self) -> String;

    /// Sample rate of synthesized audio. Valid only after `load`.
    fn sample_rate(&self) -> u32;

    fn available_voices(&self) -> Vec<VoiceInfo>;
}
