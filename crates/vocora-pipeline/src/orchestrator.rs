//! Pipeline Orchestrator (§4.10) — the top-level wake → collect →
//! transcribe → respond → reset loop, plus the `VoicePipelinePort`
//! implementation the HTTP surface calls through.
//!
//! Grounded on `gglib-voice::pipeline::VoicePipeline`'s overall shape
//! (single owning struct, dedup-before-emit state setter, shared `Arc`
//! handle for the HTTP adapter) generalized to this spec's full turn loop,
//! and on the original `aethon/pipeline.py::run`'s per-iteration ordering
//! for the wake/listen/think/speak sequencing itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

use vocora_core::{
    AppEvent, AppEventEmitter, CommandResponse, LlmBackend, LlmTurnEvent, MemoryStore,
    PipelineError, SpeakResult, SttBackend, StatusDto, ToolDeclarationDto, ToolExecutor,
    TtsBackend, VoicePipelinePort, WakeDetector, WakeOutcome,
};

use crate::agc::rms_i16;
use crate::audio::AudioDeviceManager;
use crate::barge_in::{BargeInBuffer, BargeInMonitor};
use crate::config::{PipelineConfig, CAPTURE_SAMPLE_RATE, CHUNK_DURATION_MS};
use crate::emotion::{parse_emotion_tags, strip_emotion_tags};
use crate::history::History;
use crate::response_engine::ResponseEngine;
use crate::state::PipelineState;
use crate::text_prep::prepare_for_tts;
use crate::utterance::{CollectEvent, UtteranceCollector};
use crate::vad::VadGate;
use crate::wav::encode_wav;

/// State shared between the orchestrator thread and the HTTP surface,
/// gated by `llm_history`'s mutex per §5's shared-resource table ("LLM
/// handle + history: one mutex with try-lock, 1s timeout for HTTP").
struct Shared {
    llm: Arc<dyn LlmBackend>,
    tts: Arc<dyn TtsBackend>,
    memory: Option<Arc<dyn MemoryStore>>,
    tool_executor: Option<ToolExecutor>,
    llm_history: AsyncMutex<History>,
    state: StdMutex<PipelineState>,
    events: Box<dyn AppEventEmitter>,
    session: String,
    llm_backend_name: String,
    tts_backend_name: String,
    wake_enabled: bool,
    memory_enabled: bool,
    tools: Vec<ToolDeclarationDto>,
    stop_requested: Arc<AtomicBool>,
    force_wake: Arc<AtomicBool>,
    current_turn_signals: StdMutex<Option<(Arc<AtomicBool>, Arc<AtomicBool>)>>,
    max_tool_rounds: u32,
    join_timeout: Duration,
    http: crate::config::HttpConfig,
}

impl Shared {
    fn set_state(&self, new: PipelineState) {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if *guard != new {
            *guard = new;
            self.events.emit(AppEvent::StateChanged(new.to_string()));
        }
    }

    fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        let guard = self
            .current_turn_signals
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some((barge_in, response_done)) = guard.as_ref() {
            barge_in.store(true, Ordering::SeqCst);
            response_done.store(true, Ordering::SeqCst);
        }
    }

    /// Run a full LLM turn (history bookkeeping + tool round-trip, bounded
    /// to `max_tool_rounds`) but no TTS — shared by `/command` and as the
    /// first half of `/speak`.
    async fn run_llm_turn(&self, text: &str, history: &mut History) -> Result<String, PipelineError> {
        history.push_user(text);
        self.llm.add_user_message(text);

        let mut full = String::new();
        let mut round = 0u32;
        let mut rx = self.llm.generate_stream().await?;

        loop {
            let mut saw_tool = false;
            while let Some(event) = rx.recv().await {
                match event? {
                    LlmTurnEvent::Sentence(s) => full.push_str(&s),
                    LlmTurnEvent::ToolCall(call) => {
                        saw_tool = true;
                        round += 1;
                        if round > self.max_tool_rounds {
                            continue;
                        }
                        let result = match &self.tool_executor {
                            Some(exec) => exec(&call.name, &call.args),
                            None => format!("error: no tool executor registered for {}", call.name),
                        };
                        self.llm.add_tool_result(&call.name, &result);
                    }
                }
            }
            if saw_tool && round <= self.max_tool_rounds {
                rx = self.llm.generate_stream().await?;
                continue;
            }
            break;
        }

        if full.trim().is_empty() {
            history.pop_dangling_user_turn();
        } else {
            history.push_assistant(&full);
            if let Some(memory) = &self.memory {
                let _ = memory.process_user_message(text, &self.session).await;
                let _ = memory.process_assistant_message(&full, &self.session).await;
            }
        }

        Ok(full)
    }
}

/// `Send + Sync`, cheap-clone façade the HTTP surface holds. Implements
/// [`VoicePipelinePort`].
#[derive(Clone)]
pub struct PipelineHandle {
    shared: Arc<Shared>,
}

impl PipelineHandle {
    /// Signal the orchestrator's main loop to stop and release any in-flight
    /// blocking workers. Idempotent — calling it twice is a no-op the second
    /// time.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }
}

#[async_trait]
impl VoicePipelinePort for PipelineHandle {
    async fn command(&self, text: String) -> Result<CommandResponse, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::Configuration("empty command text".into()));
        }
        let mut history = timeout(
            Duration::from_millis(self.shared.http.llm_lock_timeout_ms),
            self.shared.llm_history.lock(),
        )
        .await
        .map_err(|_| PipelineError::Busy)?;

        self.shared.set_state(PipelineState::Thinking);
        let response = self.shared.run_llm_turn(&text, &mut history).await;
        self.shared.set_state(PipelineState::Idle);

        let response = response?;
        Ok(CommandResponse {
            response: strip_emotion_tags(&response),
            status: "ok",
        })
    }

    async fn speak(&self, text: String) -> Result<SpeakResult, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::Configuration("empty speak text".into()));
        }
        let deadline = Duration::from_secs(self.shared.http.speak_deadline_secs);
        timeout(deadline, self.speak_inner(text)).await.map_err(|_| PipelineError::Timeout)?
    }

    async fn wake(&self) -> WakeOutcome {
        match self.shared.state() {
            PipelineState::Idle => {
                self.shared.force_wake.store(true, Ordering::SeqCst);
                WakeOutcome::Active
            }
            _ => WakeOutcome::AlreadyActive,
        }
    }

    async fn status(&self) -> StatusDto {
        let state = self.shared.state();
        StatusDto {
            running: !self.shared.stop_requested.load(Ordering::SeqCst),
            active: !matches!(state, PipelineState::Idle | PipelineState::Stopped | PipelineState::Loading),
            session: self.shared.session.clone(),
            llm_backend: self.shared.llm_backend_name.clone(),
            tts_backend: self.shared.tts_backend_name.clone(),
            wake_enabled: self.shared.wake_enabled,
            memory_enabled: self.shared.memory_enabled,
            tools: self.shared.tools.iter().map(|t| t.name.clone()).collect(),
        }
    }

    async fn tools(&self) -> Vec<ToolDeclarationDto> {
        self.shared.tools.clone()
    }
}

impl PipelineHandle {
    async fn speak_inner(&self, text: String) -> Result<SpeakResult, PipelineError> {
        let mut history = timeout(
            Duration::from_millis(self.shared.http.llm_lock_timeout_ms),
            self.shared.llm_history.lock(),
        )
        .await
        .map_err(|_| PipelineError::Busy)?;

        self.shared.set_state(PipelineState::Thinking);
        let response_text = self.shared.run_llm_turn(&text, &mut history).await?;
        drop(history);

        self.shared.set_state(PipelineState::Speaking);
        let mut pcm = Vec::new();
        let sample_rate = self.shared.tts.sample_rate();
        for segment in parse_emotion_tags(&response_text) {
            let prepared = prepare_for_tts(&segment.text);
            if prepared.is_empty() {
                continue;
            }
            let audio = self.shared.tts.synthesize(&prepared, Some(segment.emotion.preset())).await?;
            pcm.extend(audio.samples);
        }
        self.shared.set_state(PipelineState::Idle);

        let wav_bytes = encode_wav(&pcm, sample_rate)?;
        Ok(SpeakResult {
            response_text: strip_emotion_tags(&response_text),
            wav_bytes,
        })
    }
}

enum UtteranceSeed {
    /// A single chunk the VAD gate just classified as speech; fed through
    /// the normal classify-and-maybe-discard path.
    FirstChunk(Vec<i16>),
    /// Audio the barge-in monitor already confirmed as speech — exempt from
    /// the `min_speech_ms` discard gate (§4.4's `seed`).
    BargeInPrefix(Vec<i16>),
}

/// Owns the audio device, classifiers and wake detector; runs the blocking
/// main loop on whatever thread calls [`Orchestrator::run`]. Intended to be
/// spawned on a dedicated `std::thread` from the composition root, bridging
/// into async backend calls via a captured [`tokio::runtime::Handle`].
pub struct Orchestrator {
    cfg: PipelineConfig,
    audio: Arc<AudioDeviceManager>,
    vad: Arc<VadGate>,
    stt: Arc<dyn SttBackend>,
    wake: Option<StdMutex<Box<dyn WakeDetector>>>,
    barge_in_monitor: BargeInMonitor,
    barge_in_buffer: BargeInBuffer,
    shared: Arc<Shared>,
    rt: tokio::runtime::Handle,
}

#[allow(clippy::too_many_arguments)]
impl Orchestrator {
    pub fn new(
        cfg: PipelineConfig,
        audio: Arc<AudioDeviceManager>,
        vad: Arc<VadGate>,
        stt: Arc<dyn SttBackend>,
        llm: Arc<dyn LlmBackend>,
        tts: Arc<dyn TtsBackend>,
        wake: Option<Box<dyn WakeDetector>>,
        memory: Option<Arc<dyn MemoryStore>>,
        tool_executor: Option<ToolExecutor>,
        tools: Vec<ToolDeclarationDto>,
        events: Box<dyn AppEventEmitter>,
        llm_backend_name: String,
        tts_backend_name: String,
        session: String,
        rt: tokio::runtime::Handle,
    ) -> (Arc<Self>, PipelineHandle) {
        let memory_enabled = memory.is_some();
        let shared = Arc::new(Shared {
            llm: Arc::clone(&llm),
            tts: Arc::clone(&tts),
            memory,
            tool_executor,
            llm_history: AsyncMutex::new(History::new(cfg.history.max_turns)),
            state: StdMutex::new(PipelineState::Loading),
            events,
            session,
            llm_backend_name,
            tts_backend_name,
            wake_enabled: cfg.wake_enabled,
            memory_enabled,
            tools,
            stop_requested: Arc::new(AtomicBool::new(false)),
            force_wake: Arc::new(AtomicBool::new(false)),
            current_turn_signals: StdMutex::new(None),
            max_tool_rounds: cfg.max_tool_rounds,
            join_timeout: Duration::from_secs(cfg.barge_in.join_timeout_secs),
            http: cfg.http.clone(),
        });

        let orchestrator = Arc::new(Self {
            barge_in_monitor: BargeInMonitor::new(cfg.barge_in, CHUNK_DURATION_MS),
            barge_in_buffer: BargeInBuffer::new(),
            cfg,
            audio,
            vad,
            stt,
            wake: wake.map(StdMutex::new),
            shared: Arc::clone(&shared),
            rt,
        });

        (orchestrator, PipelineHandle { shared })
    }

    /// The blocking main loop (§4.10). Returns once `request_stop` has been
    /// observed and the current turn (if any) has wound down.
    pub fn run(self: &Arc<Self>) {
        self.shared.set_state(PipelineState::Idle);

        if let Err(e) = self.audio.start_capture() {
            self.shared.events.emit(AppEvent::Error(format!("capture start failed: {e}")));
        }

        let mut active = !self.shared.wake_enabled;

        while !self.shared.stop_requested.load(Ordering::SeqCst) {
            if self.shared.force_wake.swap(false, Ordering::SeqCst) {
                active = true;
                self.activate();
            }

            let Some(chunk) = self.audio.get_chunk(Duration::from_millis(200)) else {
                continue;
            };
            self.emit_audio_level(&chunk);

            if !active {
                let detected = self.wake.as_ref().is_some_and(|w| {
                    w.lock().unwrap_or_else(std::sync::PoisonError::into_inner).detect(&chunk)
                });
                if detected {
                    active = true;
                    self.activate();
                }
                continue;
            }

            if self.vad.is_speech(&chunk) {
                self.run_turn(UtteranceSeed::FirstChunk(chunk));
                active = !self.shared.wake_enabled;
                if let Some(wake) = &self.wake {
                    wake.lock().unwrap_or_else(std::sync::PoisonError::into_inner).reset();
                }
            }
        }

        self.audio.stop_capture();
        self.audio.stop_playback();
        self.shared.set_state(PipelineState::Stopped);
    }

    fn activate(self: &Arc<Self>) {
        self.play_activation_beep();
        self.shared.set_state(PipelineState::Listening);
    }

    fn emit_audio_level(self: &Arc<Self>, chunk: &[i16]) {
        let level = (rms_i16(chunk) / 0.1).min(1.0);
        self.shared.events.emit(AppEvent::AudioLevel(level));
    }

    fn play_activation_beep(self: &Arc<Self>) {
        let sample_rate = self.shared.tts.sample_rate().max(CAPTURE_SAMPLE_RATE);
        let tone = synth_activation_beep(sample_rate);
        let cancel = AtomicBool::new(false);
        if let Err(e) = self.audio.play_stream(std::iter::once(tone), sample_rate, &cancel) {
            self.shared.events.emit(AppEvent::Error(format!("activation beep failed: {e}")));
        }
    }

    /// Collect one utterance starting from `seed`, transcribe it, run a
    /// full speaking turn, then recursively continue with whatever the
    /// barge-in monitor captured during that turn (§4.7 post-turn step 4).
    fn run_turn(self: &Arc<Self>, seed: UtteranceSeed) {
        self.shared.set_state(PipelineState::Listening);

        let mut collector = UtteranceCollector::new(self.cfg.utterance, CHUNK_DURATION_MS);

        let first = match seed {
            UtteranceSeed::FirstChunk(chunk) => Some(collector.push(&chunk, &self.vad)),
            UtteranceSeed::BargeInPrefix(chunks) => {
                collector.seed(chunks);
                None
            }
        };

        let samples = match first {
            Some(CollectEvent::Complete { samples, discarded }) => {
                if discarded {
                    self.shared.set_state(PipelineState::Idle);
                    return;
                }
                samples
            }
            _ => loop {
                if self.shared.stop_requested.load(Ordering::SeqCst) {
                    return;
                }
                let Some(chunk) = self.audio.get_chunk(Duration::from_millis(200)) else {
                    continue;
                };
                self.emit_audio_level(&chunk);
                match collector.push(&chunk, &self.vad) {
                    CollectEvent::Continue => continue,
                    CollectEvent::Complete { samples, discarded } => {
                        if discarded {
                            self.shared.set_state(PipelineState::Idle);
                            return;
                        }
                        break samples;
                    }
                }
            },
        };

        self.shared.set_state(PipelineState::Thinking);
        let pcm_f32: Vec<f32> = samples.iter().map(|&s| f32::from(s) / f32::from(i16::MAX)).collect();
        let transcript = match self.stt.transcribe(&pcm_f32, CAPTURE_SAMPLE_RATE) {
            Ok(t) => t,
            Err(e) => {
                self.shared.events.emit(AppEvent::Error(e.to_string()));
                self.shared.set_state(PipelineState::Idle);
                return;
            }
        };

        if transcript.trim().is_empty() {
            self.shared.set_state(PipelineState::Idle);
            return;
        }

        self.shared.events.emit(AppEvent::Transcript { text: transcript.clone(), is_final: true });

        let rt = self.rt.clone();
        rt.block_on(self.run_speaking_turn(&transcript));

        if !self.barge_in_buffer.is_empty() {
            let continuation = self.barge_in_buffer.drain();
            self.run_turn(UtteranceSeed::BargeInPrefix(continuation));
            return;
        }

        self.shared.set_state(PipelineState::Idle);
    }

    async fn run_speaking_turn(self: &Arc<Self>, transcript: &str) {
        {
            let mut history = self.shared.llm_history.lock().await;
            history.push_user(transcript);
            self.shared.llm.add_user_message(transcript);
        }

        let barge_in = Arc::new(AtomicBool::new(false));
        let response_done = Arc::new(AtomicBool::new(false));
        *self
            .shared
            .current_turn_signals
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some((Arc::clone(&barge_in), Arc::clone(&response_done)));

        self.shared.set_state(PipelineState::Speaking);

        let monitor_handle = {
            let audio = Arc::clone(&self.audio);
            let vad = Arc::clone(&self.vad);
            let buffer = self.barge_in_buffer.clone();
            let barge_in = Arc::clone(&barge_in);
            let response_done = Arc::clone(&response_done);
            let monitor = self.barge_in_monitor.clone();
            tokio::task::spawn_blocking(move || monitor.run(&audio, &vad, &buffer, &barge_in, &response_done))
        };

        let engine = ResponseEngine::new(
            Arc::clone(&self.shared.llm),
            Arc::clone(&self.shared.tts),
            Arc::clone(&self.audio),
            self.shared.events.clone_box(),
            self.shared.tool_executor.clone(),
            self.shared.max_tool_rounds,
            self.shared.join_timeout,
        );

        let outcome = engine.run(Arc::clone(&barge_in), Arc::clone(&response_done)).await;
        let _ = monitor_handle.await;

        *self
            .shared
            .current_turn_signals
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;

        {
            let mut history = self.shared.llm_history.lock().await;
            if outcome.assistant_text.trim().is_empty() {
                if outcome.barge_in {
                    history.pop_dangling_user_turn();
                }
            } else {
                history.push_assistant(&outcome.assistant_text);
                if let Some(memory) = &self.shared.memory {
                    let _ = memory.process_user_message(transcript, &self.shared.session).await;
                    let _ = memory.process_assistant_message(&outcome.assistant_text, &self.shared.session).await;
                }
            }
        }

        // Flush residual speaker echo from the capture queue (§4.7 post-turn
        // step 3): drain, let a little more tail audio arrive and settle,
        // then drain again.
        self.audio.drain_capture_queue();
        tokio::time::sleep(Duration::from_millis(150)).await;
        self.audio.drain_capture_queue();
    }
}

fn synth_activation_beep(sample_rate: u32) -> Vec<f32> {
    const DURATION_MS: f64 = 150.0;
    const FREQ_HZ: f64 = 800.0;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = ((DURATION_MS / 1000.0) * f64::from(sample_rate)) as usize;
    #[allow(clippy::cast_precision_loss)]
    let mut samples: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f64 / f64::from(sample_rate);
            ((2.0 * std::f64::consts::PI * FREQ_HZ * t).sin() * 0.3) as f32
        })
        .collect();

    let fade = (n / 10).max(1);
    let fade = fade.min(samples.len() / 2);
    #[allow(clippy::cast_precision_loss)]
    for i in 0..fade {
        let factor = i as f32 / fade as f32;
        samples[i] *= factor;
        let end = samples.len() - 1 - i;
        samples[end] *= factor;
    }
    samples
}
