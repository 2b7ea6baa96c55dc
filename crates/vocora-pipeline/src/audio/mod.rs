//! Audio Device Manager (§4.1).
//!
//! Ground truth: `gglib-voice::audio_thread::AudioThreadHandle`. `cpal::Stream`
//! and `rodio::OutputStream` are `!Send` on several platforms, so both are
//! confined to one dedicated OS thread; this module exposes a `Send + Sync`
//! handle that every other component (orchestrator, response engine,
//! barge-in monitor, HTTP `/speak`) holds directly and calls through.
//!
//! Capture chunks do not round-trip through the command channel: the
//! `mpsc::SyncSender` the capture callback pushes into is itself `Send`, so
//! `get_chunk`/`drain_capture_queue` read straight off a `Receiver` this
//! struct owns. Only operations that touch the `!Send` `Stream`/`Sink`
//! handles themselves cross the command channel.

pub mod capture;
pub mod playback;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use vocora_core::PipelineError;

use crate::agc::Agc;
use crate::config::{AgcConfig, AudioConfig};
use crate::gate::PlaybackGate;
use capture::{AudioCapture, AudioDeviceInfo, CaptureChunk};
use playback::AudioPlayback;

enum AudioCommand {
    StartCapture {
        device_name: Option<String>,
        chunk_tx: mpsc::SyncSender<CaptureChunk>,
        agc: Arc<Mutex<Agc>>,
        manual_gain: f32,
        playback_gate: PlaybackGate,
        reply: mpsc::Sender<Result<(), PipelineError>>,
    },
    StopCapture,
    StartPlayback {
        reply: mpsc::Sender<Result<(), PipelineError>>,
    },
    AppendPlayback {
        samples: Vec<f32>,
        sample_rate: u32,
        reply: mpsc::Sender<Result<(), PipelineError>>,
    },
    StopPlayback,
    Shutdown,
}

/// `Send + Sync` façade over the dedicated audio thread. Implements §4.1's
/// interface: `start_capture`, `stop_capture`, `get_chunk(timeout)`,
/// `play_stream(chunks, sample_rate)`, `stop_playback`, `drain_capture_queue`,
/// `is_playing`.
pub struct AudioDeviceManager {
    cmd_tx: mpsc::Sender<AudioCommand>,
    chunk_rx: Mutex<mpsc::Receiver<CaptureChunk>>,
    chunk_tx_template: mpsc::SyncSender<CaptureChunk>,
    agc: Arc<Mutex<Agc>>,
    playback_gate: PlaybackGate,
    cfg: AudioConfig,
    is_playing: Arc<AtomicBool>,
    playback_queue_len: Arc<AtomicUsize>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioDeviceManager {
    pub fn new(cfg: AudioConfig, agc_cfg: AgcConfig, playback_gate: PlaybackGate) -> Result<Self, PipelineError> {
        let (chunk_tx, chunk_rx) = mpsc::sync_channel::<CaptureChunk>(cfg.queue_capacity);
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), PipelineError>>();

        let is_playing = Arc::new(AtomicBool::new(false));
        let playback_queue_len = Arc::new(AtomicUsize::new(0));
        let gate_for_thread = playback_gate.clone();
        let is_playing_thread = Arc::clone(&is_playing);
        let queue_len_thread = Arc::clone(&playback_queue_len);

        let thread = thread::Builder::new()
            .name("vocora-audio".into())
            .spawn(move || Self::run(gate_for_thread, cmd_rx, init_tx, is_playing_thread, queue_len_thread))
            .map_err(|e| PipelineError::AudioDevice(format!("failed to spawn audio thread: {e}")))?;

        init_rx
            .recv()
            .map_err(|_| PipelineError::AudioDevice("audio thread died during init".into()))??;

        Ok(Self {
            cmd_tx,
            chunk_rx: Mutex::new(chunk_rx),
            chunk_tx_template: chunk_tx,
            agc: Arc::new(Mutex::new(Agc::new(agc_cfg, cfg.auto_gain_target_rms))),
            playback_gate,
            cfg,
            is_playing,
            playback_queue_len,
            thread: Some(thread),
        })
    }

    pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, PipelineError> {
        AudioCapture::list_devices()
    }

    pub fn start_capture(&self) -> Result<(), PipelineError> {
        self.send_and_recv(|reply| AudioCommand::StartCapture {
            device_name: self.cfg.input_device.clone(),
            chunk_tx: self.chunk_tx_template.clone(),
            agc: Arc::clone(&self.agc),
            manual_gain: self.cfg.input_gain,
            playback_gate: self.playback_gate.clone(),
            reply,
        })
    }

    pub fn stop_capture(&self) {
        let _ = self.cmd_tx.send(AudioCommand::StopCapture);
    }

    /// Next capture chunk, or `None` on timeout.
    pub fn get_chunk(&self, timeout: Duration) -> Option<CaptureChunk> {
        let rx = self.chunk_rx.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rx.recv_timeout(timeout).ok()
    }

    /// Drop every chunk currently queued, without blocking (§4.7's post-turn
    /// echo flush).
    pub fn drain_capture_queue(&self) {
        let rx = self.chunk_rx.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        while rx.try_recv().is_ok() {}
    }

    /// Stream a lazy sequence of float32 chunks to the device, blocking the
    /// calling thread until they have all drained or `cancel` fires.
    /// Callers on the async side run this inside
    /// `tokio::task::spawn_blocking` (see `crate::response_engine`).
    pub fn play_stream<I>(&self, chunks: I, sample_rate: u32, cancel: &AtomicBool) -> Result<(), PipelineError>
    where
        I: Iterator<Item = Vec<f32>>,
    {
        self.send_and_recv(|reply| AudioCommand::StartPlayback { reply })?;

        for samples in chunks {
            if cancel.load(Ordering::SeqCst) {
                break;
            }
            while self.playback_queue_len.load(Ordering::SeqCst) >= self.cfg.queue_capacity {
                if cancel.load(Ordering::SeqCst) {
                    self.stop_playback();
                    return Ok(());
                }
                thread::sleep(Duration::from_millis(20));
            }
            self.send_and_recv(|reply| AudioCommand::AppendPlayback {
                samples: samples.clone(),
                sample_rate,
                reply,
            })?;
        }

        while self.is_playing() {
            if cancel.load(Ordering::SeqCst) {
                self.stop_playback();
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        Ok(())
    }

    /// Stop playback immediately (barge-in, §4.7/§4.8). Idempotent.
    pub fn stop_playback(&self) {
        let _ = self.cmd_tx.send(AudioCommand::StopPlayback);
    }

    /// Observable without a round trip to the audio thread (§4.1).
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }

    fn send_and_recv<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, PipelineError>>) -> AudioCommand,
    ) -> Result<T, PipelineError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| PipelineError::AudioDevice("audio thread died".into()))?;
        rx.recv().map_err(|_| PipelineError::AudioDevice("audio thread died".into()))?
    }

    fn run(
        playback_gate: PlaybackGate,
        cmd_rx: mpsc::Receiver<AudioCommand>,
        init_tx: mpsc::Sender<Result<(), PipelineError>>,
        is_playing: Arc<AtomicBool>,
        queue_len: Arc<AtomicUsize>,
    ) {
        let mut capture = AudioCapture::new();
        let mut playback = match AudioPlayback::new(playback_gate) {
            Ok(p) => p,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::StartCapture { device_name, chunk_tx, agc, manual_gain, playback_gate, reply } => {
                    let result = capture.start(device_name.as_deref(), chunk_tx, agc, manual_gain, playback_gate);
                    let _ = reply.send(result);
                }
                AudioCommand::StopCapture => capture.stop(),
                AudioCommand::StartPlayback { reply } => {
                    is_playing.store(false, Ordering::SeqCst);
                    queue_len.store(0, Ordering::SeqCst);
                    let _ = reply.send(Ok(()));
                }
                AudioCommand::AppendPlayback { samples, sample_rate, reply } => {
                    let result = playback.append(samples, sample_rate);
                    is_playing.store(playback.is_playing(), Ordering::SeqCst);
                    queue_len.store(playback.queue_len(), Ordering::SeqCst);
                    let _ = reply.send(result);
                }
                AudioCommand::StopPlayback => {
                    playback.stop();
                    is_playing.store(false, Ordering::SeqCst);
                    queue_len.store(0, Ordering::SeqCst);
                }
                AudioCommand::Shutdown => break,
            }
        }

        tracing::debug!("audio device thread shutting down");
    }
}

impl Drop for AudioDeviceManager {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
