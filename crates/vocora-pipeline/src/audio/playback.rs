//! TTS audio playback (§4.1, §4.7's 50ms fade processing lands here as
//! plain samples — the fade itself is applied by the response engine
//! before calling [`AudioPlayback::append`]).
//!
//! Ground truth: `gglib-voice::playback::AudioPlayback`, generalized from
//! "one `play()` call per utterance" to a streaming `append()` path —
//! exactly what the TTS/Playback worker hand-off (§4.7) needs: each
//! synthesized segment is queued onto the sink as it becomes ready.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rodio::{OutputStream, OutputStreamHandle, Sink};
use vocora_core::PipelineError;

use crate::gate::PlaybackGate;

pub struct AudioPlayback {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    playback_gate: PlaybackGate,
    is_playing: Arc<AtomicBool>,
}

impl AudioPlayback {
    pub fn new(playback_gate: PlaybackGate) -> Result<Self, PipelineError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PipelineError::AudioDevice(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            playback_gate,
            is_playing: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Queue samples onto the current sink, creating one if none is active.
    /// Sets the playback gate on the first append of a turn.
    pub fn append(&mut self, samples: Vec<f32>, sample_rate: u32) -> Result<(), PipelineError> {
        let needs_new_sink = match &self.sink {
            Some(sink) => sink.empty() && !self.is_playing.load(Ordering::SeqCst),
            None => true,
        };

        if needs_new_sink {
            let sink =
                Sink::try_new(&self.stream_handle).map_err(|e| PipelineError::AudioDevice(e.to_string()))?;
            self.sink = Some(sink);
            self.playback_gate.start_playing();
            self.is_playing.store(true, Ordering::SeqCst);
        }

        let sink = self.sink.as_ref().expect("just ensured present");
        let source = rodio::buffer::SamplesBuffer::new(1, sample_rate, samples);
        sink.append(source);
        Ok(())
    }

    /// Stop playback immediately (barge-in, §4.7/§4.8).
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.is_playing.store(false, Ordering::SeqCst);
        self.playback_gate.stop_playing();
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.empty())
    }

    /// Number of sounds still queued on the sink. Used by
    /// [`crate::audio::AudioDeviceManager::play_stream`] to apply
    /// back-pressure against the bounded playback queue (§4.1).
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.sink.as_ref().map_or(0, Sink::len)
    }
}
