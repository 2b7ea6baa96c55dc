//! Persistent memory store interface (§6).

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Memory {
    pub text: String,
    pub session: String,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn process_user_message(&self, text: &str, session: &str) -> Result<()>;
    async fn process_assistant_message(&self, text: &str, session: &str) -> Result<()>;
    async fn get_recent_memories(&self) -> Result<Vec<Memory>>;

    async fn load(&self) -> Result<()>;
    async fn cleanup(&self);
}
