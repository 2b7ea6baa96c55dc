//! Speech-to-text collaborator interface.

use crate::error::Result;

/// `transcribe(audio, sample_rate) → text`.
///
/// Implementations must perform peak normalization internally (§4.2):
/// scale to a target peak of ≈0.5, capped at 100×, never attenuating.
/// Empty/whitespace output is a legitimate result, not an error — the
/// orchestrator drops the turn when it sees one.
pub trait SttBackend: Send + Sync {
    /// Transcribe 16 kHz mono PCM (as float32 samples in `[-1.0, 1.0]`).
    fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<String>;

    /// BCP-47-ish language tag this backend is configured for, for
    /// diagnostics/status reporting.
    fn language(&self) -> &str;
}
