//! Barge-in Monitor (§4.8).
//!
//! Grounded on the original `_monitor_barge_in`: only runs while playback is
//! active, ignores a warm-up window after playback starts (the assistant's
//! own voice leaking into the mic reads as loud at first), then requires an
//! energy gate plus the stricter [`crate::vad::VadGate::is_speech_strict`]
//! threshold to agree for several consecutive chunks before declaring a
//! barge-in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::agc::rms_i16;
use crate::audio::AudioDeviceManager;
use crate::config::BargeInConfig;
use crate::vad::VadGate;

/// Chunks captured during the confirmation window, drained at most once per
/// turn by the orchestrator's post-turn step and fed back in as the prefix
/// of the next utterance collection (§4.7 step 4).
#[derive(Debug, Clone, Default)]
pub struct BargeInBuffer(Arc<Mutex<Vec<i16>>>);

impl BargeInBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn extend(&self, chunks: &[Vec<i16>]) {
        let mut guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for chunk in chunks {
            guard.extend_from_slice(chunk);
        }
    }

    /// Drain the buffer, leaving it empty. Idempotent — a second call
    /// returns an empty vec.
    #[must_use]
    pub fn drain(&self) -> Vec<i16> {
        let mut guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut guard)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).is_empty()
    }
}

/// Watches the capture queue while a response is being spoken, looking for
/// the user talking over the assistant. Spawned once per turn and joined
/// alongside the response engine's workers.
#[derive(Clone)]
pub struct BargeInMonitor {
    cfg: BargeInConfig,
    chunk_duration_ms: u32,
}

impl BargeInMonitor {
    #[must_use]
    pub fn new(cfg: BargeInConfig, chunk_duration_ms: u32) -> Self {
        Self { cfg, chunk_duration_ms }
    }

    /// Run until a barge-in is confirmed or `response_done` is observed. On
    /// confirmation, seeds `buffer`, sets `barge_in` and stops playback
    /// before returning. Blocking — run on a dedicated thread or inside
    /// `tokio::task::spawn_blocking`.
    pub fn run(
        &self,
        audio: &AudioDeviceManager,
        vad: &VadGate,
        buffer: &BargeInBuffer,
        barge_in: &Arc<AtomicBool>,
        response_done: &Arc<AtomicBool>,
    ) {
        let mut was_playing = false;
        let mut warmup_remaining = self.cfg.warmup_chunks;
        let mut consecutive = 0u32;
        let mut pending: Vec<Vec<i16>> = Vec::new();

        loop {
            if response_done.load(Ordering::SeqCst) || barge_in.load(Ordering::SeqCst) {
                return;
            }

            let is_playing = audio.is_playing();
            if is_playing && !was_playing {
                warmup_remaining = self.cfg.warmup_chunks;
                consecutive = 0;
                pending.clear();
            }
            was_playing = is_playing;

            if !is_playing {
                std::thread::sleep(Duration::from_millis(u64::from(self.chunk_duration_ms)));
                continue;
            }

            let Some(chunk) = audio.get_chunk(Duration::from_millis(u64::from(self.chunk_duration_ms) * 2)) else {
                continue;
            };

            if warmup_remaining > 0 {
                warmup_remaining -= 1;
                continue;
            }

            let rms = rms_i16(&chunk);
            let qualifies = rms >= self.cfg.min_energy_rms && vad.is_speech_strict(&chunk);

            if qualifies {
                consecutive += 1;
                pending.push(chunk);
            } else {
                consecutive = 0;
                pending.clear();
            }

            if consecutive >= self.cfg.required_consecutive_chunks {
                buffer.extend(&pending);
                barge_in.store(true, Ordering::SeqCst);
                audio.stop_playback();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_starts_empty_and_drains_to_empty() {
        let buffer = BargeInBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn buffer_extend_then_drain_round_trips_samples() {
        let buffer = BargeInBuffer::new();
        buffer.extend(&[vec![1, 2, 3], vec![4, 5]]);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.drain(), vec![1, 2, 3, 4, 5]);
        assert!(buffer.is_empty());
    }
}
