//! LLM collaborator interface (§6).
//!
//! No crate in this codebase defines an LLM trait — `gglib-voice` has no
//! LLM concept at all. This trait is authored fresh, in the same
//! object-safe / `async_trait` idiom as [`super::TtsBackend`], grounded on
//! the method set `GeminiLLM`/`OllamaLLM` expose (`set_context`,
//! `add_user_message`, `generate_stream`, `cancel`,
//! `pop_last_user_message`, `get_partial_response`, `check_connection`,
//! `cleanup`, `set_tools`).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// One item yielded by [`LlmBackend::generate_stream`]. A sentence item may
/// carry more than one sentence (the interface in §6 says "one or more
/// sentences already segmented"); the response engine re-segments with its
/// own [`crate`]-external sentence segmenter regardless, so this is not
/// required to align perfectly with sentence boundaries.
#[derive(Debug, Clone)]
pub enum LlmTurnEvent {
    Sentence(String),
    ToolCall(ToolCall),
}

#[derive(Debug, Clone)]
pub struct ToolCall {
    pub name: String,
    pub args: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// `(name, args_map) -> string` — executes one tool call and returns its
/// result as plain text fed back to the model.
pub type ToolExecutor = Arc<dyn Fn(&str, &HashMap<String, String>) -> String + Send + Sync>;

/// The LLM collaborator interface the core consumes.
///
/// `generate_stream` returns a channel rather than a plain iterator so that
/// `cancel` (called from a different task — the barge-in path) can race
/// against it safely; the receiver is simply dropped or drained to
/// exhaustion by the caller.
///
/// Tool-call handling is the **caller's** responsibility (§6): when an
/// event is `LlmTurnEvent::ToolCall`, the response engine invokes the
/// registered executor and must feed the result back into the same
/// streamed turn via a fresh `generate_stream()` call after
/// `add_user_message`-style injection of the tool result, bounded to 5
/// nested rounds. This trait does not loop internally because the bound
/// and the feed-back mechanism are the core's concern, not the backend's.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn set_context(&self, system_prompt: &str, memories: &[String]);

    fn add_user_message(&self, text: &str);

    /// Feed a tool execution result back as the next turn input, keeping
    /// it out of the user-visible conversation history.
    fn add_tool_result(&self, tool_name: &str, result: &str);

    /// Begin streaming generation for the current context. Each call opens
    /// a fresh bounded channel; the backend task stops producing as soon as
    /// [`cancel`](LlmBackend::cancel) is observed or the receiver is
    /// dropped.
    async fn generate_stream(&self) -> Result<mpsc::Receiver<Result<LlmTurnEvent>>>;

    /// Idempotent; causes the iterator from `generate_stream` to terminate
    /// promptly.
    fn cancel(&self);

    /// Removes the most recent user turn if the last history entry is a
    /// user turn. No-op otherwise.
    fn pop_last_user_message(&self);

    /// Whatever assistant text has been emitted so far in the current (or
    /// most recently cancelled) turn.
    fn get_partial_response(&self) -> String;

    async fn check_connection(&self) -> bool;

    async fn cleanup(&self);

    /// Optional. Declares tools and the executor that resolves calls to
    /// them.
    ///
    /// Google Search grounding and function-calling tools are mutually
    /// exclusive on at least one supported backend; when a concrete
    /// implementation has both enabled it must prefer Google Search and
    /// report that shadowing via [`LlmBackend::tools_shadowed_by_search`]
    /// rather than silently dropping the distinction (see DESIGN.md, Open
    /// Question 1).
    fn set_tools(&self, declarations: Vec<ToolDeclaration>, executor: ToolExecutor);

    /// True if tool declarations were registered but are not being sent to
    /// the model this turn because search grounding takes precedence.
    fn tools_shadowed_by_search(&self) -> bool {
        false
    }
}
