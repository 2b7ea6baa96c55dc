//! AGC / Normalizer (§4.2).
//!
//! `gglib-voice` has no gain control at all. The RMS-energy computation
//! idiom is borrowed from `vad.rs::calculate_rms_energy`; the gain state
//! machine itself is new, built in the same small-plain-struct style as
//! `gglib-voice`'s `EchoGate`/`VadConfig`.

use crate::config::AgcConfig;

/// Manual gain followed by a long-window automatic gain estimator,
/// applied in that order inside the capture callback. Testable property:
/// the adaptive `gain` is always within `[min_gain, max_gain]`.
#[derive(Debug)]
pub struct Agc {
    gain: f32,
    window_sum_rms: f32,
    window_count: usize,
    target_rms: f32,
    cfg: AgcConfig,
}

impl Agc {
    #[must_use]
    pub fn new(cfg: AgcConfig, target_rms: f32) -> Self {
        Self {
            gain: cfg.min_gain,
            window_sum_rms: 0.0,
            window_count: 0,
            target_rms,
            cfg,
        }
    }

    /// Current adaptive gain. Always within `[cfg.min_gain, cfg.max_gain]`.
    #[must_use]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Apply manual gain then (unless `playback_active`) update and apply
    /// the adaptive gain, in place, saturating.
    pub fn process(&mut self, chunk: &mut [i16], manual_gain: f32, playback_active: bool) {
        apply_gain(chunk, manual_gain);

        if !playback_active {
            let rms = rms_i16(chunk);
            // Silence must not drive the gain up.
            if rms >= self.cfg.silence_rms_floor {
                self.window_sum_rms += rms;
                self.window_count += 1;
                if self.window_count >= self.cfg.window_chunks {
                    let avg_rms = self.window_sum_rms / self.window_count as f32;
                    let new_gain = (self.target_rms / avg_rms.max(f32::EPSILON))
                        .clamp(self.cfg.min_gain, self.cfg.max_gain);
                    self.gain = (1.0 - self.cfg.smoothing) * self.gain + self.cfg.smoothing * new_gain;
                    self.window_sum_rms = 0.0;
                    self.window_count = 0;
                }
            }
        }

        apply_gain(chunk, self.gain);
    }
}

fn apply_gain(chunk: &mut [i16], gain: f32) {
    if (gain - 1.0).abs() < f32::EPSILON {
        return;
    }
    for sample in chunk.iter_mut() {
        let amplified = f32::from(*sample) * gain;
        *sample = amplified.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
    }
}

/// RMS of a PCM16 chunk, normalized to `[0.0, 1.0]`.
#[must_use]
pub fn rms_i16(chunk: &[i16]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = chunk
        .iter()
        .map(|&s| {
            let v = f64::from(s) / f64::from(i16::MAX);
            v * v
        })
        .sum();
    ((sum_sq / chunk.len() as f64).sqrt()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_starts_at_minimum() {
        let agc = Agc::new(AgcConfig::default(), 0.05);
        assert!((agc.gain() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn gain_stays_within_bounds_after_many_quiet_windows() {
        let cfg = AgcConfig {
            window_chunks: 4,
            ..AgcConfig::default()
        };
        let mut agc = Agc::new(cfg, 0.05);
        // Very quiet chunk: RMS well above the silence floor but far below
        // target, so the estimator should push gain toward max_gain, never
        // past it.
        let quiet = vec![50_i16; 512];
        for _ in 0..50 {
            let mut chunk = quiet.clone();
            agc.process(&mut chunk, 1.0, false);
            assert!(agc.gain() >= cfg.min_gain);
            assert!(agc.gain() <= cfg.max_gain);
        }
    }

    #[test]
    fn silent_chunk_at_exact_floor_does_not_update_window() {
        let cfg = AgcConfig {
            window_chunks: 1,
            silence_rms_floor: 0.1,
            ..AgcConfig::default()
        };
        let mut agc = Agc::new(cfg, 0.05);
        // Construct a chunk whose RMS is exactly the floor: all samples at
        // the same magnitude m solves rms = m/32767 = floor.
        let m = (0.1_f32 * f32::from(i16::MAX)).round() as i16;
        let mut chunk = vec![m; 512];
        let gain_before = agc.gain();
        agc.process(&mut chunk, 1.0, false);
        // rms == floor is the boundary: spec requires it NOT to contribute.
        assert!((agc.gain() - gain_before).abs() < 1e-3);
    }

    #[test]
    fn playback_active_suspends_estimator_update() {
        let cfg = AgcConfig {
            window_chunks: 1,
            ..AgcConfig::default()
        };
        let mut agc = Agc::new(cfg, 0.05);
        let gain_before = agc.gain();
        let mut chunk = vec![20_i16; 512];
        agc.process(&mut chunk, 1.0, true);
        assert!((agc.gain() - gain_before).abs() < f32::EPSILON);
    }
}
