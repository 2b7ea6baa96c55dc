//! Composition root: builds the concrete backends, constructs the
//! orchestrator, spawns its blocking main loop on a dedicated thread, and
//! hands the resulting `PipelineHandle` (erased to
//! `Arc<dyn VoicePipelinePort>`) to the HTTP bootstrap.
//!
//! Mirrors `gglib-cli::bootstrap`'s shape (a `*Config::with_defaults`,
//! a `bootstrap(config) -> Context` composition function that wires every
//! concrete implementation in one place) adapted to this binary's single
//! responsibility: there is no database or download manager here, only
//! the pipeline and its HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use vocora_core::{LlmBackend, VoicePipelinePort};
use vocora_pipeline::audio::AudioDeviceManager;
use vocora_pipeline::config::PipelineConfig;
use vocora_pipeline::gate::PlaybackGate;
use vocora_pipeline::vad::VadGate;
use vocora_pipeline::{Orchestrator, PipelineHandle};

use crate::backends::{EchoLlmBackend, NullSttBackend, SilentTtsBackend};
use crate::events::TracingEmitter;

/// Everything the binary needs to run once bootstrapped: a handle the
/// HTTP surface can call through, and the orchestrator `Arc` whose `run`
/// must be driven on its own thread.
pub struct CliContext {
    pub orchestrator: Arc<Orchestrator>,
    pub handle: PipelineHandle,
    pub http_config: vocora_http::HttpConfig,
}

/// Load the pipeline config (file + env overrides), construct the
/// fallback backends, and wire the orchestrator. Does not start any
/// thread or server — callers decide when to spawn `orchestrator.run()`
/// and call `vocora_http::start_server`.
///
/// Fails if the LLM backend's health check doesn't pass (§7's
/// "Backend unavailable" — surfaced at load, before `Loading → Idle`).
pub async fn bootstrap(cli: &crate::cli::Cli) -> Result<CliContext> {
    let cfg = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::default(),
    }
    .apply_env_overrides();

    let http_config = translate_http_config(&cfg.http)?;

    let playback_gate = PlaybackGate::new();
    let audio = Arc::new(
        AudioDeviceManager::new(cfg.audio.clone(), cfg.agc, playback_gate)
            .context("opening audio devices")?,
    );
    let vad = Arc::new(VadGate::new(None, cfg.vad, vocora_pipeline::config::CAPTURE_SAMPLE_RATE));

    let stt = Arc::new(NullSttBackend);
    let llm = Arc::new(EchoLlmBackend::default());
    let tts = Arc::new(SilentTtsBackend::new(22_050));

    if !llm.check_connection().await {
        anyhow::bail!("LLM backend health check failed");
    }

    let (orchestrator, handle) = Orchestrator::new(
        cfg.clone(),
        audio,
        vad,
        stt,
        llm,
        tts,
        None,
        None,
        None,
        Vec::new(),
        Box::new(TracingEmitter),
        "echo".to_string(),
        "silent".to_string(),
        "default".to_string(),
        tokio::runtime::Handle::current(),
    );

    Ok(CliContext {
        orchestrator,
        handle,
        http_config,
    })
}

/// Erase the pipeline handle to the trait object the HTTP surface depends
/// on, per `vocora_core::ports`'s isolation rule.
#[must_use]
pub fn as_port(handle: PipelineHandle) -> Arc<dyn VoicePipelinePort> {
    Arc::new(handle)
}

/// Translate the pipeline's serde/TOML-loadable `HttpConfig` (`bind_addr`
/// as a plain `String`, plus pipeline-internal fields the HTTP layer
/// doesn't need) into `vocora-http`'s typed config.
fn translate_http_config(cfg: &vocora_pipeline::config::HttpConfig) -> Result<vocora_http::HttpConfig> {
    let bind_addr: SocketAddr = cfg
        .bind_addr
        .parse()
        .with_context(|| format!("parsing http.bind_addr {:?}", cfg.bind_addr))?;
    Ok(vocora_http::HttpConfig {
        bind_addr,
        max_body_bytes: cfg.max_body_bytes,
        cors: vocora_http::CorsConfig::AllowAll,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_http_config_parses_default_bind_addr() {
        let cfg = vocora_pipeline::config::HttpConfig::default();
        let translated = translate_http_config(&cfg).unwrap();
        assert_eq!(translated.bind_addr.port(), 8741);
        assert_eq!(translated.max_body_bytes, cfg.max_body_bytes);
    }

    #[test]
    fn translate_http_config_rejects_unparseable_bind_addr() {
        let mut cfg = vocora_pipeline::config::HttpConfig::default();
        cfg.bind_addr = "not-an-address".to_string();
        assert!(translate_http_config(&cfg).is_err());
    }
}
