//! Microphone capture (§4.1).
//!
//! Ground truth: `gglib-voice::capture::AudioCapture`, which
//! accumulates the whole utterance into one buffer and resamples once at
//! `stop_recording`; this pipeline needs a continuous stream of fixed-size
//! 32ms chunks instead (the VAD gate, AGC and barge-in monitor all work
//! chunk-by-chunk), so resampling and chunk framing happen incrementally
//! inside the capture callback rather than once at the end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use rubato::{FftFixedIn, Resampler as _};
use vocora_core::PipelineError;

use crate::agc::Agc;
use crate::config::{CAPTURE_SAMPLE_RATE, SAMPLES_PER_CHUNK};
use crate::gate::PlaybackGate;

pub type CaptureChunk = Vec<i16>;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// Owns the `cpal::Stream` for the lifetime of a recording. Must live on
/// the dedicated audio thread — see [`crate::audio::thread::AudioThreadHandle`].
pub struct AudioCapture {
    stream: Option<Stream>,
    is_recording: Arc<AtomicBool>,
}

impl AudioCapture {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stream: None,
            is_recording: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn list_devices() -> Result<Vec<AudioDeviceInfo>, PipelineError> {
        let host = cpal::default_host();
        let default_name = host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let devices = host
            .input_devices()
            .map_err(|e| PipelineError::AudioDevice(e.to_string()))?;

        let mut result = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                result.push(AudioDeviceInfo {
                    is_default: name == default_name,
                    name,
                });
            }
        }
        Ok(result)
    }

    /// Start streaming fixed-size `SAMPLES_PER_CHUNK` chunks of 16 kHz
    /// mono PCM16 into `chunk_tx`. The send is non-blocking — the audio
    /// callback must never block — so a full queue drops the chunk and
    /// logs a warning rather than stalling capture.
    pub fn start(
        &mut self,
        device_name: Option<&str>,
        chunk_tx: mpsc::SyncSender<CaptureChunk>,
        agc: Arc<Mutex<Agc>>,
        manual_gain: f32,
        playback_gate: PlaybackGate,
    ) -> Result<(), PipelineError> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = select_device(&host, device_name)?;
        let config = device
            .default_input_config()
            .map_err(|e| PipelineError::AudioDevice(e.to_string()))?;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "audio capture starting"
        );

        let stream = build_input_stream(
            &device,
            &config,
            Arc::clone(&self.is_recording),
            chunk_tx,
            agc,
            manual_gain,
            playback_gate,
        )?;
        stream
            .play()
            .map_err(|e| PipelineError::AudioDevice(e.to_string()))?;

        self.stream = Some(stream);
        self.is_recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.stream = None;
        self.is_recording.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }
}

impl Default for AudioCapture {
    fn default() -> Self {
        Self::new()
    }
}

fn select_device(host: &cpal::Host, name: Option<&str>) -> Result<Device, PipelineError> {
    if let Some(name) = name {
        let mut devices = host
            .input_devices()
            .map_err(|e| PipelineError::AudioDevice(e.to_string()))?;
        if let Some(device) = devices.find(|d| d.name().map(|n| n == name).unwrap_or(false)) {
            return Ok(device);
        }
        return Err(PipelineError::AudioDevice(format!("input device not found: {name}")));
    }
    host.default_input_device()
        .ok_or_else(|| PipelineError::AudioDevice("no default input device".to_string()))
}

#[allow(clippy::too_many_arguments)]
fn build_input_stream(
    device: &Device,
    config: &cpal::SupportedStreamConfig,
    is_recording: Arc<AtomicBool>,
    chunk_tx: mpsc::SyncSender<CaptureChunk>,
    agc: Arc<Mutex<Agc>>,
    manual_gain: f32,
    playback_gate: PlaybackGate,
) -> Result<Stream, PipelineError> {
    let stream_config: StreamConfig = config.clone().into();
    let sample_format = config.sample_format();
    let device_channels = config.channels();
    let device_sample_rate = config.sample_rate().0;

    let err_fn = |err: cpal::StreamError| {
        tracing::error!(%err, "audio input stream error");
    };

    let mut pipeline = CaptureStagePipeline::new(device_channels, device_sample_rate)?;

    macro_rules! build {
        ($sample_ty:ty, $to_f32:expr) => {{
            let is_recording = Arc::clone(&is_recording);
            device.build_input_stream(
                &stream_config,
                move |data: &[$sample_ty], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::Relaxed) {
                        return;
                    }
                    #[allow(clippy::redundant_closure_call)]
                    let mono_f32: Vec<f32> = ($to_f32)(data);
                    pipeline.ingest(&mono_f32, &agc, manual_gain, &playback_gate, &chunk_tx);
                },
                err_fn,
                None,
            )
        }};
    }

    let stream = match sample_format {
        SampleFormat::F32 => build!(f32, |data: &[f32]| to_mono(data, device_channels)),
        SampleFormat::I16 => build!(i16, |data: &[i16]| {
            let floats: Vec<f32> = data.iter().map(|&s| f32::from(s) / 32768.0).collect();
            to_mono(&floats, device_channels)
        }),
        SampleFormat::I32 => build!(i32, |data: &[i32]| {
            #[allow(clippy::cast_precision_loss)]
            let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 2_147_483_648.0).collect();
            to_mono(&floats, device_channels)
        }),
        other => {
            return Err(PipelineError::AudioDevice(format!(
                "unsupported input sample format: {other:?}"
            )));
        }
    };

    stream.map_err(|e| PipelineError::AudioDevice(e.to_string()))
}

fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample-then-frame state threaded through the (already mono) capture
/// callback. Buffers device-rate samples until there's enough for one
/// resampler call, then buffers the resampled output until there's enough
/// for one fixed-size [`SAMPLES_PER_CHUNK`] chunk.
struct CaptureStagePipeline {
    resampler: Option<FftFixedIn<f32>>,
    resampler_chunk_size: usize,
    raw_buf: Vec<f32>,
    pcm_accum: Vec<i16>,
}

impl CaptureStagePipeline {
    fn new(_channels: u16, device_sample_rate: u32) -> Result<Self, PipelineError> {
        if device_sample_rate == CAPTURE_SAMPLE_RATE {
            return Ok(Self {
                resampler: None,
                resampler_chunk_size: 0,
                raw_buf: Vec::new(),
                pcm_accum: Vec::new(),
            });
        }

        let resampler_chunk_size = 1024;
        let resampler = FftFixedIn::<f32>::new(
            device_sample_rate as usize,
            CAPTURE_SAMPLE_RATE as usize,
            resampler_chunk_size,
            2,
            1,
        )
        .map_err(|e| PipelineError::AudioDevice(format!("resampler init: {e}")))?;

        Ok(Self {
            resampler: Some(resampler),
            resampler_chunk_size,
            raw_buf: Vec::new(),
            pcm_accum: Vec::new(),
        })
    }

    fn ingest(
        &mut self,
        mono: &[f32],
        agc: &Arc<Mutex<Agc>>,
        manual_gain: f32,
        playback_gate: &PlaybackGate,
        chunk_tx: &mpsc::SyncSender<CaptureChunk>,
    ) {
        let Some(resampler) = self.resampler.as_mut() else {
            self.append_and_emit(mono, agc, manual_gain, playback_gate, chunk_tx);
            return;
        };

        self.raw_buf.extend_from_slice(mono);
        while self.raw_buf.len() >= self.resampler_chunk_size {
            let chunk: Vec<f32> = self.raw_buf.drain(..self.resampler_chunk_size).collect();
            match resampler.process(&[&chunk], None) {
                Ok(result) => {
                    if let Some(channel) = result.first() {
                        self.append_and_emit(channel, agc, manual_gain, playback_gate, chunk_tx);
                    }
                }
                Err(e) => tracing::error!(error = %e, "resample failed, dropping samples"),
            }
        }
    }

    fn append_and_emit(
        &mut self,
        resampled: &[f32],
        agc: &Arc<Mutex<Agc>>,
        manual_gain: f32,
        playback_gate: &PlaybackGate,
        chunk_tx: &mpsc::SyncSender<CaptureChunk>,
    ) {
        self.pcm_accum.extend(
            resampled
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16),
        );

        while self.pcm_accum.len() >= SAMPLES_PER_CHUNK {
            let mut chunk: Vec<i16> = self.pcm_accum.drain(..SAMPLES_PER_CHUNK).collect();
            if let Ok(mut agc) = agc.lock() {
                agc.process(&mut chunk, manual_gain, playback_gate.is_playing());
            }
            if chunk_tx.try_send(chunk).is_err() {
                tracing::warn!("capture queue full, dropping a chunk");
            }
        }
    }
}
