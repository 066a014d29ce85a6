// src/chat/reformulate.rs

//! Rewrites the conversation into a standalone search query before embedding.
//! A reformulated query targets catalog semantics better than the raw last
//! turn, which may lean on earlier context ("what about easier ones?").

use anyhow::Result;

use crate::chat::prompts::REFORMULATE_INSTRUCTION;
use crate::llm::{ChatModel, Conversation};

/// Returns the search string to embed. Falls back to the last user message
/// when the model replies with nothing usable.
pub async fn reformulate_query(
    model: &dyn ChatModel,
    conversation: &Conversation,
) -> Result<String> {
    let probed = conversation.with_user_probe(REFORMULATE_INSTRUCTION);
    let reply = model.chat(probed.messages(), None, None).await?;

    let query = reply.text().trim().to_string();
    if query.is_empty() {
        return Ok(conversation
            .last_user_content()
            .unwrap_or_default()
            .to_string());
    }
    Ok(query)
}
