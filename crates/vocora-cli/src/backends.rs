//! Built-in fallback collaborator implementations.
//!
//! Concrete ML inference engines (STT/LLM/TTS/wake models) are out of
//! scope here — the core treats them as external collaborators behind a
//! trait (§6) and a real deployment is expected to supply its own
//! `Box<dyn LlmBackend>` etc. at this composition root. What ships here is
//! the fallback the binary boots with when no such backend is configured:
//! enough to exercise the full turn loop and the HTTP surface end to end
//! without any external process or model file.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use vocora_core::{
    LlmBackend, LlmTurnEvent, PipelineError, Result, SttBackend, ToolDeclaration, ToolExecutor,
    TtsAudio, TtsBackend, TtsParams, VoiceGender, VoiceInfo,
};

/// Transcribes nothing. A real deployment replaces this with a Whisper/
/// Sherpa-style engine; this one exists so the pipeline can be constructed
/// and run without one.
pub struct NullSttBackend;

impl SttBackend for NullSttBackend {
    fn transcribe(&self, _audio: &[f32], _sample_rate: u32) -> Result<String> {
        Ok(String::new())
    }

    fn language(&self) -> &str {
        "en"
    }
}

/// Echoes the user's last message back as the assistant reply. Tool
/// declarations are recorded but never shadowed by search (there is no
/// search grounding concept on this fallback), so
/// `tools_shadowed_by_search` stays `false`.
pub struct EchoLlmBackend {
    last_user_message: std::sync::Mutex<String>,
}

impl Default for EchoLlmBackend {
    fn default() -> Self {
        Self {
            last_user_message: std::sync::Mutex::new(String::new()),
        }
    }
}

#[async_trait]
impl LlmBackend for EchoLlmBackend {
    fn set_context(&self, _system_prompt: &str, _memories: &[String]) {}

    fn add_user_message(&self, text: &str) {
        *self.last_user_message.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            text.to_string();
    }

    fn add_tool_result(&self, _tool_name: &str, _result: &str) {}

    async fn generate_stream(&self) -> Result<mpsc::Receiver<Result<LlmTurnEvent>>> {
        let reply = {
            let guard = self.last_user_message.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            format!("You said: {}", *guard)
        };
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(Ok(LlmTurnEvent::Sentence(reply))).await;
        Ok(rx)
    }

    fn cancel(&self) {}

    fn pop_last_user_message(&self) {
        *self.last_user_message.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = String::new();
    }

    fn get_partial_response(&self) -> String {
        String::new()
    }

    async fn check_connection(&self) -> bool {
        true
    }

    async fn cleanup(&self) {}

    fn set_tools(&self, _declarations: Vec<ToolDeclaration>, _executor: ToolExecutor) {}
}

/// Synthesizes silence proportional to the text length, standing in for a
/// real TTS engine so the response engine's fade-in/out and WAV-encoding
/// paths still run end to end.
pub struct SilentTtsBackend {
    sample_rate: u32,
    voice: std::sync::Mutex<String>,
}

impl SilentTtsBackend {
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            voice: std::sync::Mutex::new("silent".to_string()),
        }
    }
}

#[async_trait]
impl TtsBackend for SilentTtsBackend {
    async fn synthesize(&self, text: &str, _params: Option<TtsParams>) -> Result<TtsAudio> {
        if text.trim().is_empty() {
            return Err(PipelineError::Configuration("empty TTS segment".into()));
        }
        let duration = Duration::from_millis((text.len() as u64 * 60).clamp(200, 4000));
        let sample_count = (duration.as_secs_f32() * self.sample_rate as f32) as usize;
        Ok(TtsAudio {
            samples: vec![0.0; sample_count],
            sample_rate: self.sample_rate,
            duration,
        })
    }

    fn set_voice(&self, voice_id: &str) -> Result<()> {
        *self.voice.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = voice_id.to_string();
        Ok(())
    }

    fn set_speed(&self, _speed: f32) {}

    fn voice(&self) -> String {
        self.voice.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn available_voices(&self) -> Vec<VoiceInfo> {
        vec![VoiceInfo {
            id: "silent".to_string(),
            name: "Silent placeholder".to_string(),
            gender: VoiceGender::Female,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_llm_reflects_last_user_message() {
        let llm = EchoLlmBackend::default();
        llm.add_user_message("hello there");
        let mut rx = llm.generate_stream().await.unwrap();
        let event = rx.recv().await.unwrap().unwrap();
        match event {
            LlmTurnEvent::Sentence(s) => assert_eq!(s, "You said: hello there"),
            LlmTurnEvent::ToolCall(_) => panic!("unexpected tool call"),
        }
    }

    #[tokio::test]
    async fn silent_tts_rejects_empty_segment() {
        let tts = SilentTtsBackend::new(22_050);
        assert!(tts.synthesize("", None).await.is_err());
    }

    #[tokio::test]
    async fn silent_tts_scales_duration_with_text_length() {
        let tts = SilentTtsBackend::new(22_050);
        let short = tts.synthesize("hi", None).await.unwrap();
        let long = tts.synthesize(&"word ".repeat(40), None).await.unwrap();
        assert!(long.samples.len() > short.samples.len());
    }
}
