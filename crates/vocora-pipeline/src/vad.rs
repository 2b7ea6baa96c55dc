//! VAD Gate (§4.3).
//!
//! `gglib-voice::vad::VoiceActivityDetector` fuses three concerns into one
//! struct: the classifier, the speech/silence state machine and the
//! echo-gate check. This module keeps only the classifier — a stateless
//! (from the caller's point of view) "is this chunk speech, at this
//! threshold" query. The state machine moves to
//! [`crate::utterance::UtteranceCollector`], which is the thing that
//! actually differs between the collection path and the barge-in path.
//!
//! Dual threshold: collection uses the lower, more sensitive
//! `VadConfig::collection_threshold` (0.5); the barge-in monitor uses the
//! stricter `barge_in_threshold` (0.75) so ordinary room noise during
//! playback can't interrupt the assistant.

use std::sync::Mutex;

use vocora_core::VadModel;

use crate::agc::rms_i16;
use crate::config::VadConfig;

/// Falls back to RMS-energy thresholding when no neural [`VadModel`] is
/// configured — mirrors `gglib-voice`'s energy-based fallback path, minus
/// the speech/silence bookkeeping that lives in `UtteranceCollector` here.
struct EnergyFallback;

impl EnergyFallback {
    /// Same mapping `gglib-voice::vad::energy_threshold_from_vad_threshold`
    /// uses: `[0.0, 1.0] → [0.001, 0.05]` RMS energy range, then reported
    /// back out as a pseudo-probability so both paths share one API.
    fn probability(chunk: &[i16], reference_threshold: f32) -> f32 {
        let energy = rms_i16(chunk);
        let mapped_threshold = (0.05_f32 - 0.001).mul_add(reference_threshold, 0.001);
        if mapped_threshold <= f32::EPSILON {
            return 0.0;
        }
        (energy / mapped_threshold).min(1.0)
    }
}

/// A single mutex around the (possibly stateful) classifier — only one
/// caller may run inference at a time, matching `_is_speech`'s
/// single-lock discipline.
pub struct VadGate {
    model: Option<Mutex<Box<dyn VadModel>>>,
    cfg: VadConfig,
    sample_rate: u32,
}

impl VadGate {
    #[must_use]
    pub fn new(model: Option<Box<dyn VadModel>>, cfg: VadConfig, sample_rate: u32) -> Self {
        Self {
            model: model.map(Mutex::new),
            cfg,
            sample_rate,
        }
    }

    fn probability(&self, chunk: &[i16], reference_threshold: f32) -> f32 {
        match &self.model {
            Some(model) => {
                let mut guard = model.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                guard.is_speech_probability(chunk, self.sample_rate)
            }
            None => EnergyFallback::probability(chunk, reference_threshold),
        }
    }

    /// Collection-path classification, using `VadConfig::collection_threshold`.
    #[must_use]
    pub fn is_speech(&self, chunk: &[i16]) -> bool {
        self.probability(chunk, self.cfg.collection_threshold) >= self.cfg.collection_threshold
    }

    /// Barge-in-path classification, using the stricter
    /// `VadConfig::barge_in_threshold`.
    #[must_use]
    pub fn is_speech_strict(&self, chunk: &[i16]) -> bool {
        self.probability(chunk, self.cfg.barge_in_threshold) >= self.cfg.barge_in_threshold
    }

    pub fn reset(&self) {
        if let Some(model) = &self.model {
            let mut guard = model.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_fallback_silence_is_not_speech() {
        let gate = VadGate::new(None, VadConfig::default(), 16_000);
        let silence = vec![0_i16; 512];
        assert!(!gate.is_speech(&silence));
        assert!(!gate.is_speech_strict(&silence));
    }

    #[test]
    fn energy_fallback_loud_chunk_is_speech() {
        let gate = VadGate::new(None, VadConfig::default(), 16_000);
        let loud: Vec<i16> = (0..512).map(|i| if i % 2 == 0 { 20_000 } else { -20_000 }).collect();
        assert!(gate.is_speech(&loud));
    }

    #[test]
    fn barge_in_threshold_is_stricter_than_collection() {
        // A chunk that passes the lower collection threshold but not the
        // higher barge-in one must exist for the dual-threshold design to
        // mean anything.
        let gate = VadGate::new(None, VadConfig::default(), 16_000);
        let moderate: Vec<i16> = (0..512).map(|i| if i % 2 == 0 { 900 } else { -900 }).collect();
        assert!(gate.is_speech(&moderate));
        assert!(!gate.is_speech_strict(&moderate));
    }

    struct FixedModel(f32);
    impl VadModel for FixedModel {
        fn is_speech_probability(&mut self, _chunk: &[i16], _sample_rate: u32) -> f32 {
            self.0
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn neural_model_path_is_used_when_present() {
        let gate = VadGate::new(Some(Box::new(FixedModel(0.9))), VadConfig::default(), 16_000);
        let chunk = vec![0_i16; 512];
        assert!(gate.is_speech(&chunk));
        assert!(gate.is_speech_strict(&chunk));
    }
}
