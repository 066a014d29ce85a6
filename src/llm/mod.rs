// src/llm/mod.rs
// LLM module exports and the gateway seam the pipeline depends on.

pub mod client;
pub mod schema;
pub mod types;

pub use client::OpenAiClient;
pub use types::{AssistantReply, ChatMessage, Conversation, Role, ToolInvocation};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Gateway to the hosted model provider. The pipeline only ever talks to this
/// trait, so tests can substitute scripted implementations.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Chat completion. `tools` advertises function schemas; `tool_choice`
    /// forces one of them when the caller needs a structured answer.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: Option<Vec<Value>>,
        tool_choice: Option<Value>,
    ) -> Result<AssistantReply>;

    /// Fixed-dimension embedding of `text`. The dimension is set by the
    /// provider model and must match the catalog collection.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
