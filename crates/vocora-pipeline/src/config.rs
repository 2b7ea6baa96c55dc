//! Pipeline configuration structs (§4.1–§4.10's tunable constants).
//!
//! Configuration file *schema* is out of scope; these structs are the
//! in-scope parameters named throughout §4, loaded by `vocora-cli` from
//! TOML with environment-variable overrides and handed to the pipeline as
//! plain values. Each nested struct has a `Default` matching the defaults
//! named in §4, following the small `...Config` struct-with-`Default`
//! pattern used throughout this codebase (`VadConfig`, `TtsConfig`,
//! `SttConfig`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading [`PipelineConfig`] from disk. Kept separate from
/// [`vocora_core::PipelineError`] — a malformed config file is a startup-time
/// concern for `vocora-cli`, not something the running pipeline surfaces.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),
}

/// 32 ms at 16 kHz.
pub const CHUNK_DURATION_MS: u32 = 32;
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;
pub const SAMPLES_PER_CHUNK: usize = (CAPTURE_SAMPLE_RATE as usize * CHUNK_DURATION_MS as usize) / 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub input_device: Option<String>,
    pub input_gain: f32,
    pub auto_gain: bool,
    pub auto_gain_target_rms: f32,
    /// Capacity of the bounded capture FIFO and playback queue (§4.1).
    pub queue_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            input_gain: 1.0,
            auto_gain: true,
            auto_gain_target_rms: 0.05,
            queue_capacity: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AgcConfig {
    /// Chunks ignored as silence (RMS below this never drive the gain up).
    pub silence_rms_floor: f32,
    /// Number of accepted chunks per gain re-estimation window (≈3s).
    pub window_chunks: usize,
    pub min_gain: f32,
    pub max_gain: f32,
    /// Low-pass coefficient applied to the new gain estimate.
    pub smoothing: f32,
}

impl Default for AgcConfig {
    fn default() -> Self {
        Self {
            silence_rms_floor: 0.002,
            window_chunks: (3000 / CHUNK_DURATION_MS) as usize,
            min_gain: 1.0,
            max_gain: 20.0,
            smoothing: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    pub collection_threshold: f32,
    pub barge_in_threshold: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            collection_threshold: 0.5,
            barge_in_threshold: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct UtteranceConfig {
    pub silence_timeout_ms: u32,
    pub min_speech_ms: u32,
}

impl Default for UtteranceConfig {
    fn default() -> Self {
        Self {
            silence_timeout_ms: 500,
            min_speech_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BargeInConfig {
    pub warmup_chunks: u32,
    pub min_energy_rms: f32,
    pub required_consecutive_chunks: u32,
    /// Bound on the response engine's worker-join wait (§4.7).
    pub join_timeout_secs: u64,
}

impl Default for BargeInConfig {
    fn default() -> Self {
        Self {
            warmup_chunks: 10,
            min_energy_rms: 0.05,
            required_consecutive_chunks: 10,
            join_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub max_body_bytes: usize,
    pub llm_lock_timeout_ms: u64,
    pub speak_deadline_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8741".to_string(),
            max_body_bytes: 64 * 1024,
            llm_lock_timeout_ms: 1000,
            speak_deadline_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Dialogue turns retained before each request (default 20, §3).
    pub max_turns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_turns: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub audio: AudioConfig,
    pub agc: AgcConfig,
    pub vad: VadConfig,
    pub utterance: UtteranceConfig,
    pub barge_in: BargeInConfig,
    pub http: HttpConfig,
    pub history: HistoryConfig,
    pub wake_enabled: bool,
    /// Maximum nested tool-call rounds within one streamed turn (§6).
    pub max_tool_rounds: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            agc: AgcConfig::default(),
            vad: VadConfig::default(),
            utterance: UtteranceConfig::default(),
            barge_in: BargeInConfig::default(),
            http: HttpConfig::default(),
            history: HistoryConfig::default(),
            wake_enabled: true,
            max_tool_rounds: 5,
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file, falling back to defaults for missing fields
    /// (every nested struct carries `#[serde(default)]`).
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::ConfigError> {
        let content = std::fs::read_to_string(path).map_err(crate::ConfigError::Read)?;
        toml::from_str(&content).map_err(crate::ConfigError::Parse)
    }

    /// Apply the small set of environment-variable overrides operators reach
    /// for most often (device selection and the wake gate): a config file
    /// checked into a repo or baked into an image still needs per-machine
    /// escape hatches without editing it.
    #[must_use]
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("VOCORA_AUDIO_INPUT_DEVICE") {
            self.audio.input_device = Some(device);
        }
        if let Ok(bind_addr) = std::env::var("VOCORA_HTTP_BIND_ADDR") {
            self.http.bind_addr = bind_addr;
        }
        if let Ok(raw) = std::env::var("VOCORA_WAKE_ENABLED") {
            if let Ok(enabled) = raw.parse::<bool>() {
                self.wake_enabled = enabled;
            }
        }
        if let Ok(raw) = std::env::var("VOCORA_MAX_TOOL_ROUNDS") {
            if let Ok(rounds) = raw.parse::<u32>() {
                self.max_tool_rounds = rounds;
            }
        }
        self
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn from_file_missing_path_errors() {
        let result = PipelineConfig::from_file(std::path::Path::new("/nonexistent/vocora.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_loads_partial_overrides_with_defaults_filled_in() {
        let dir = std::env::temp_dir().join(format!("vocora-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("vocora.toml");
        std::fs::write(&path, "[http]\nbind_addr = \"0.0.0.0:9000\"\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.http.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.http.max_body_bytes, HttpConfig::default().max_body_bytes);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_override_wins_over_file_default() {
        std::env::set_var("VOCORA_WAKE_ENABLED", "false");
        let config = PipelineConfig::default().apply_env_overrides();
        assert!(!config.wake_enabled);
        std::env::remove_var("VOCORA_WAKE_ENABLED");
    }
}
