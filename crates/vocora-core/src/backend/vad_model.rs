/// The neural voice-activity classifier underneath the VAD Gate (§4.3).
///
/// Deliberately narrow and stateful — Silero-style models keep internal
/// recurrent state across calls, so `is_speech` takes `&mut self` and the
/// gate that owns one must serialize access (see
/// `vocora_pipeline::vad::VadGate`). Modeled after
/// `gglib-voice`'s optional Silero path in `vad.rs`, minus the energy-based
/// fallback — this crate's gate supplies its own RMS fallback instead of
/// baking one into the trait.
pub trait VadModel: Send {
    /// Probability of speech in `chunk`, in `[0.0, 1.0]`.
    fn is_speech_probability(&mut self, chunk: &[i16], sample_rate: u32) -> f32;

    /// Drop any internal recurrent state (e.g. after an utterance ends).
    fn reset(&mut self);
}
