// src/chat/gates.rs

//! The two LLM-mediated decision gates that precede retrieval. Each appends
//! its probe to a copy of the conversation and forces a boolean tool call;
//! a missing or malformed call falls back to the permissive default.

use anyhow::Result;

use crate::llm::schema::{VERDICT_TOOL, force_tool, verdict_tools};
use crate::llm::{ChatModel, Conversation};

const SAFETY_PROBE: &str = "Am I asking for help with courses or academics? Record true if so, false otherwise.";

const RETRIEVAL_PROBE: &str = "Will you be able to better answer my questions with information about specific courses at Yale University? Record true if you need course information you don't have, false otherwise.";

/// Scope check: false means the request is off-topic and gets the fixed
/// refusal. Defaults to true when the model returns no usable verdict.
pub async fn passes_safety(model: &dyn ChatModel, conversation: &Conversation) -> Result<bool> {
    ask_verdict(model, conversation, SAFETY_PROBE, true).await
}

/// Retrieval-necessity check: false means a plain completion answers the
/// request without touching the catalog. Defaults to true.
pub async fn needs_retrieval(model: &dyn ChatModel, conversation: &Conversation) -> Result<bool> {
    ask_verdict(model, conversation, RETRIEVAL_PROBE, true).await
}

async fn ask_verdict(
    model: &dyn ChatModel,
    conversation: &Conversation,
    probe: &str,
    default: bool,
) -> Result<bool> {
    let probed = conversation.with_user_probe(probe);
    let reply = model
        .chat(
            probed.messages(),
            Some(verdict_tools()),
            Some(force_tool(VERDICT_TOOL)),
        )
        .await?;

    Ok(reply
        .tool_call(VERDICT_TOOL)
        .and_then(|call| call.arguments["verdict"].as_bool())
        .unwrap_or(default))
}
