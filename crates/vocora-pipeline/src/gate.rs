//! Playback gate — shared flag coordinating capture, AGC and the VAD
//! (§4.1, §4.2, §4.3): "while playback is active" is a cross-cutting
//! condition several components need to read independently.
//!
//! Ground truth: `gglib-voice::gate::EchoGate`, copied near-verbatim — the
//! name changed to reflect that this codebase's capture path never fully
//! mutes during playback (the barge-in monitor still needs chunks), it
//! only changes how AGC/VAD interpret them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PlaybackGate {
    is_playing: Arc<AtomicBool>,
}

impl PlaybackGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_playing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start_playing(&self) {
        self.is_playing.store(true, Ordering::SeqCst);
    }

    pub fn stop_playing(&self) {
        self.is_playing.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }
}

impl Default for PlaybackGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_playing() {
        assert!(!PlaybackGate::new().is_playing());
    }

    #[test]
    fn clone_shares_state() {
        let a = PlaybackGate::new();
        let b = a.clone();
        a.start_playing();
        assert!(b.is_playing());
        b.stop_playing();
        assert!(!a.is_playing());
    }
}
