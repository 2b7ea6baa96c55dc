//! Response Engine (§4.7) — the LLM → TTS → Playback pipeline for one turn.
//!
//! Three roles, matching the original's producer/consumer split one-to-one:
//! the LLM producer (this module's caller-facing `run`, since it also owns
//! the tool-call round-trip), a TTS worker task and a Playback worker task,
//! handed off through two bounded `tokio::mpsc` channels terminated by an
//! explicit end-of-stream item rather than closing the channel (closing
//! would be indistinguishable from a dropped receiver on the consumer side).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use vocora_core::{AppEvent, AppEventEmitter, LlmBackend, LlmTurnEvent, ToolExecutor, TtsBackend, TtsParams};

use crate::audio::AudioDeviceManager;
use crate::emotion::parse_emotion_tags;
use crate::segmenter::SentenceSegmenter;
use crate::text_prep::prepare_for_tts;

const SEG_QUEUE_CAPACITY: usize = 8;
const AUDIO_QUEUE_CAPACITY: usize = 8;
const FADE_MS: f64 = 50.0;

struct TtsRequest {
    prepared_text: String,
    preset: Option<TtsParams>,
}

enum SegItem {
    Request(TtsRequest),
    End,
}

enum AudioItem {
    Chunk(Vec<f32>),
    End,
}

/// What one turn produced, handed back to the orchestrator for history and
/// memory bookkeeping (§4.7's post-turn cleanup).
pub struct TurnOutcome {
    pub assistant_text: String,
    pub barge_in: bool,
}

pub struct ResponseEngine {
    llm: Arc<dyn LlmBackend>,
    tts: Arc<dyn TtsBackend>,
    audio: Arc<AudioDeviceManager>,
    events: Box<dyn AppEventEmitter>,
    tool_executor: Option<ToolExecutor>,
    max_tool_rounds: u32,
    join_timeout: Duration,
}

impl ResponseEngine {
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        tts: Arc<dyn TtsBackend>,
        audio: Arc<AudioDeviceManager>,
        events: Box<dyn AppEventEmitter>,
        tool_executor: Option<ToolExecutor>,
        max_tool_rounds: u32,
        join_timeout: Duration,
    ) -> Self {
        Self { llm, tts, audio, events, tool_executor, max_tool_rounds, join_timeout }
    }

    /// Run one full turn. `barge_in` is the cancellation flag the caller's
    /// barge-in monitor also watches and sets; `response_done` is asserted
    /// on return so that monitor can exit its poll loop.
    pub async fn run(&self, barge_in: Arc<AtomicBool>, response_done: Arc<AtomicBool>) -> TurnOutcome {
        let (seg_tx, seg_rx) = mpsc::channel::<SegItem>(SEG_QUEUE_CAPACITY);
        let (audio_tx, audio_rx) = mpsc::channel::<AudioItem>(AUDIO_QUEUE_CAPACITY);

        self.events.emit(AppEvent::SpeakingStarted);

        let tts_handle = {
            let tts = Arc::clone(&self.tts);
            let barge_in = Arc::clone(&barge_in);
            let events = self.events.clone_box();
            tokio::spawn(Self::tts_worker(tts, seg_rx, audio_tx, barge_in, events))
        };

        let playback_handle = {
            let audio = Arc::clone(&self.audio);
            let barge_in = Arc::clone(&barge_in);
            let sample_rate = self.tts.sample_rate();
            tokio::task::spawn_blocking(move || Self::playback_worker(&audio, audio_rx, sample_rate, &barge_in))
        };

        let assistant_text = self.llm_producer(seg_tx, Arc::clone(&barge_in)).await;

        if timeout(self.join_timeout, tts_handle).await.is_err() {
            tracing::warn!("tts worker did not join within the bound, abandoning it");
        }
        if timeout(self.join_timeout, playback_handle).await.is_err() {
            tracing::warn!("playback worker did not join within the bound, abandoning it");
        }

        response_done.store(true, Ordering::SeqCst);
        self.events.emit(AppEvent::SpeakingFinished);

        let was_barge_in = barge_in.load(Ordering::SeqCst);
        // Open Question 2: only fall back to the backend's own partial-text
        // buffer when this engine's own accumulator came up empty — if a
        // turn produced any text at all, that's what gets recorded.
        let assistant_text = if assistant_text.trim().is_empty() && was_barge_in {
            self.llm.get_partial_response()
        } else {
            assistant_text
        };

        TurnOutcome { assistant_text, barge_in: was_barge_in }
    }

    async fn llm_producer(&self, seg_tx: mpsc::Sender<SegItem>, barge_in: Arc<AtomicBool>) -> String {
        let mut full_response = String::new();
        let mut segmenter = SentenceSegmenter::new();
        let mut round = 0u32;

        let mut rx = match self.llm.generate_stream().await {
            Ok(rx) => rx,
            Err(e) => {
                self.events.emit(AppEvent::Error(e.to_string()));
                let _ = seg_tx.send(SegItem::End).await;
                return full_response;
            }
        };

        'rounds: loop {
            let mut saw_tool_call = false;

            while let Some(event) = rx.recv().await {
                if barge_in.load(Ordering::SeqCst) {
                    self.llm.cancel();
                    break 'rounds;
                }

                match event {
                    Ok(LlmTurnEvent::Sentence(text)) => {
                        full_response.push_str(&text);
                        for piece in segmenter.push(&text) {
                            if self.enqueue_segment(&seg_tx, &piece).await.is_err() {
                                break 'rounds;
                            }
                        }
                    }
                    Ok(LlmTurnEvent::ToolCall(call)) => {
                        saw_tool_call = true;
                        round += 1;
                        if round > self.max_tool_rounds {
                            tracing::warn!(tool = %call.name, rounds = round, "tool round bound exceeded, dropping call");
                            continue;
                        }
                        let result = match &self.tool_executor {
                            Some(exec) => exec(&call.name, &call.args),
                            None => format!("error: no tool executor registered for {}", call.name),
                        };
                        self.llm.add_tool_result(&call.name, &result);
                    }
                    Err(e) => {
                        self.events.emit(AppEvent::Error(e.to_string()));
                        break 'rounds;
                    }
                }
            }

            if saw_tool_call && round <= self.max_tool_rounds && !barge_in.load(Ordering::SeqCst) {
                rx = match self.llm.generate_stream().await {
                    Ok(rx) => rx,
                    Err(e) => {
                        self.events.emit(AppEvent::Error(e.to_string()));
                        break;
                    }
                };
                continue;
            }
            break;
        }

        // Open Question 2: a cancelled turn never flushes its trailing
        // partial sentence — whatever never reached a terminator is dropped
        // along with the rest of the interrupted response.
        if !barge_in.load(Ordering::SeqCst) {
            if let Some(last) = segmenter.finish() {
                let _ = self.enqueue_segment(&seg_tx, &last).await;
            }
        }

        let _ = seg_tx.send(SegItem::End).await;
        full_response
    }

    async fn enqueue_segment(&self, seg_tx: &mpsc::Sender<SegItem>, raw: &str) -> Result<(), ()> {
        for emotion_segment in parse_emotion_tags(raw) {
            let prepared = prepare_for_tts(&emotion_segment.text);
            if prepared.is_empty() {
                continue;
            }
            let request = TtsRequest {
                prepared_text: prepared,
                preset: Some(emotion_segment.emotion.preset()),
            };
            if seg_tx.send(SegItem::Request(request)).await.is_err() {
                return Err(());
            }
        }
        Ok(())
    }

    async fn tts_worker(
        tts: Arc<dyn TtsBackend>,
        mut seg_rx: mpsc::Receiver<SegItem>,
        audio_tx: mpsc::Sender<AudioItem>,
        barge_in: Arc<AtomicBool>,
        events: Box<dyn AppEventEmitter>,
    ) {
        let sample_rate = tts.sample_rate();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fade_len = ((FADE_MS / 1000.0) * f64::from(sample_rate)) as usize;

        while let Some(item) = seg_rx.recv().await {
            if barge_in.load(Ordering::SeqCst) {
                break;
            }

            match item {
                SegItem::Request(req) => match tts.synthesize(&req.prepared_text, req.preset).await {
                    Ok(mut audio) => {
                        apply_fade(&mut audio.samples, fade_len);
                        let level = (rms_f32(&audio.samples) / 0.1).min(1.0);
                        events.emit(AppEvent::AudioLevel(level));
                        if audio_tx.send(AudioItem::Chunk(audio.samples)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => events.emit(AppEvent::Error(e.to_string())),
                },
                SegItem::End => break,
            }
        }

        let _ = audio_tx.send(AudioItem::End).await;
    }

    fn playback_worker(
        audio: &AudioDeviceManager,
        mut audio_rx: mpsc::Receiver<AudioItem>,
        sample_rate: u32,
        barge_in: &AtomicBool,
    ) {
        let chunks = std::iter::from_fn(move || match audio_rx.blocking_recv() {
            Some(AudioItem::Chunk(samples)) => Some(samples),
            Some(AudioItem::End) | None => None,
        });

        if let Err(e) = audio.play_stream(chunks, sample_rate, barge_in) {
            tracing::warn!(error = %e, "playback worker ended with an error");
        }
    }
}

fn apply_fade(samples: &mut [f32], fade_len: usize) {
    let n = fade_len.min(samples.len() / 2);
    if n == 0 {
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    for i in 0..n {
        let factor = i as f32 / n as f32;
        samples[i] *= factor;
        let end = samples.len() - 1 - i;
        samples[end] *= factor;
    }
}

fn rms_f32(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_ramps_both_ends_to_zero() {
        let mut samples = vec![1.0_f32; 100];
        apply_fade(&mut samples, 10);
        assert!((samples[0]).abs() < 1e-6);
        assert!((samples[99]).abs() < 1e-6);
        assert!((samples[50] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fade_on_short_buffer_does_not_panic() {
        let mut samples = vec![1.0_f32; 3];
        apply_fade(&mut samples, 10);
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert!((rms_f32(&[0.0, 0.0, 0.0])).abs() < 1e-6);
    }
}
