//! Utterance Collector (§4.4).
//!
//! Grounded directly on the original `_collect_speech`: accumulate chunks,
//! track `speech_ms`/`silence_ms`, end the utterance once silence persists
//! for `silence_timeout_ms` *after* any speech has been seen, then discard
//! the whole thing if total speech time never reached `min_speech_ms`.
//! Unlike `gglib-voice::vad`'s fused state machine this never throws away
//! the buffer early on a brief noise burst — only the final silence gate
//! decides, matching the source behavior.

use crate::config::UtteranceConfig;
use crate::vad::VadGate;

pub enum CollectEvent {
    /// Still accumulating; caller should pull another chunk.
    Continue,
    /// Silence persisted long enough to end the utterance.
    Complete {
        samples: Vec<i16>,
        /// `true` if `speech_ms` never reached `min_speech_ms` — caller
        /// should drop this utterance rather than transcribe it.
        discarded: bool,
    },
}

pub struct UtteranceCollector {
    cfg: UtteranceConfig,
    chunk_duration_ms: u32,
    buffer: Vec<i16>,
    speech_ms: u32,
    silence_ms: u32,
}

impl UtteranceCollector {
    #[must_use]
    pub fn new(cfg: UtteranceConfig, chunk_duration_ms: u32) -> Self {
        Self {
            cfg,
            chunk_duration_ms,
            buffer: Vec::new(),
            speech_ms: 0,
            silence_ms: 0,
        }
    }

    /// Seed the collector with audio the barge-in monitor already confirmed
    /// as speech (§4.8's "barge-in buffer recursive re-collection"), so the
    /// `min_speech_ms` gate can't discard a turn that interrupted playback.
    pub fn seed(&mut self, initial_chunks: Vec<i16>) {
        self.buffer = initial_chunks;
        self.speech_ms = self.cfg.min_speech_ms.max(self.chunk_duration_ms);
        self.silence_ms = 0;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Feed one chunk (already VAD-classified or classified here against
    /// `vad`) into the collector.
    pub fn push(&mut self, chunk: &[i16], vad: &VadGate) -> CollectEvent {
        self.buffer.extend_from_slice(chunk);

        if vad.is_speech(chunk) {
            self.speech_ms += self.chunk_duration_ms;
            self.silence_ms = 0;
        } else {
            self.silence_ms += self.chunk_duration_ms;
        }

        if self.speech_ms > 0 && self.silence_ms >= self.cfg.silence_timeout_ms {
            let samples = std::mem::take(&mut self.buffer);
            let discarded = self.speech_ms < self.cfg.min_speech_ms;
            self.reset();
            return CollectEvent::Complete { samples, discarded };
        }

        CollectEvent::Continue
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.speech_ms = 0;
        self.silence_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> UtteranceConfig {
        UtteranceConfig {
            silence_timeout_ms: 100,
            min_speech_ms: 60,
        }
    }

    fn loud_chunk() -> Vec<i16> {
        (0..512).map(|i| if i % 2 == 0 { 20_000 } else { -20_000 }).collect()
    }

    fn silent_chunk() -> Vec<i16> {
        vec![0_i16; 512]
    }

    #[test]
    fn discards_short_speech_burst() {
        let vad = VadGate::new(None, crate::config::VadConfig::default(), 16_000);
        let mut collector = UtteranceCollector::new(cfg(), 32);

        // One 32ms loud chunk (< min_speech_ms=60) then silence past timeout.
        assert!(matches!(collector.push(&loud_chunk(), &vad), CollectEvent::Continue));
        for _ in 0..4 {
            if let CollectEvent::Complete { discarded, .. } = collector.push(&silent_chunk(), &vad) {
                assert!(discarded);
                return;
            }
        }
        panic!("expected Complete before 4 silent chunks");
    }

    #[test]
    fn keeps_sufficient_speech() {
        let vad = VadGate::new(None, crate::config::VadConfig::default(), 16_000);
        let mut collector = UtteranceCollector::new(cfg(), 32);

        for _ in 0..3 {
            assert!(matches!(collector.push(&loud_chunk(), &vad), CollectEvent::Continue));
        }
        for _ in 0..4 {
            if let CollectEvent::Complete { discarded, samples } = collector.push(&silent_chunk(), &vad) {
                assert!(!discarded);
                assert!(!samples.is_empty());
                return;
            }
        }
        panic!("expected Complete before 4 silent chunks");
    }

    #[test]
    fn seeded_buffer_is_never_discarded() {
        let vad = VadGate::new(None, crate::config::VadConfig::default(), 16_000);
        let mut collector = UtteranceCollector::new(cfg(), 32);
        collector.seed(loud_chunk());

        for _ in 0..4 {
            if let CollectEvent::Complete { discarded, .. } = collector.push(&silent_chunk(), &vad) {
                assert!(!discarded);
                return;
            }
        }
        panic!("expected Complete before 4 silent chunks");
    }
}
