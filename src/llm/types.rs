// src/llm/types.rs

//! Conversation and reply types shared across the pipeline.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    // Some clients label assistant turns "ai"; normalize on the way in.
    #[serde(alias = "ai")]
    Assistant,
}

/// One turn of a conversation. Unknown fields on the wire (client-local `id`s
/// and the like) are dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered message list for a single request. Built fresh per request; probe
/// messages go onto copies so the conversation sent for the final completion
/// never carries gate questions.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Prepends `header` as the system instruction unless the caller already
    /// supplied one.
    pub fn ensure_header(&mut self, header: &str) {
        if self.messages.first().map(|m| m.role) != Some(Role::System) {
            self.messages.insert(0, ChatMessage::system(header));
        }
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::system(content));
    }

    /// Copy of the conversation with a synthetic user question appended.
    pub fn with_user_probe(&self, question: &str) -> Conversation {
        let mut probed = self.clone();
        probed.messages.push(ChatMessage::user(question));
        probed
    }

    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// A tool/function invocation returned by the model, arguments already parsed
/// from their JSON-encoded string form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
}

/// What a chat completion gave back: free text, structured tool calls, or both.
#[derive(Debug, Clone, Default)]
pub struct AssistantReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl AssistantReply {
    /// Extracts content and tool calls from a raw `chat/completions` response.
    pub fn from_response(raw: &Value) -> Result<Self> {
        let message = &raw["choices"][0]["message"];
        if message.is_null() {
            return Err(anyhow!("No message in completion response"));
        }

        let content = message
            .get("content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let mut tool_calls = Vec::new();
        if let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) {
            for call in calls {
                let name = call["function"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let arguments = call["function"]["arguments"]
                    .as_str()
                    .and_then(|args| serde_json::from_str(args).ok())
                    .unwrap_or(Value::Null);
                tool_calls.push(ToolInvocation { name, arguments });
            }
        }

        Ok(Self { content, tool_calls })
    }

    pub fn text(&self) -> String {
        self.content.clone().unwrap_or_default()
    }

    pub fn tool_call(&self, name: &str) -> Option<&ToolInvocation> {
        self.tool_calls.iter().find(|call| call.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ai_role_deserializes_as_assistant() {
        let msg: ChatMessage =
            serde_json::from_value(json!({"role": "ai", "content": "hi", "id": 7})).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        // And it serializes back as the standard role name.
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "assistant", "content": "hi"})
        );
    }

    #[test]
    fn header_inserted_only_when_missing() {
        let mut conversation = Conversation::new(vec![ChatMessage::user("hello")]);
        conversation.ensure_header("You are Eli.");
        assert_eq!(conversation.messages()[0].role, Role::System);

        let mut with_header = Conversation::new(vec![
            ChatMessage::system("custom header"),
            ChatMessage::user("hello"),
        ]);
        with_header.ensure_header("You are Eli.");
        assert_eq!(with_header.messages().len(), 2);
        assert_eq!(with_header.messages()[0].content, "custom header");
    }

    #[test]
    fn probe_does_not_mutate_original() {
        let conversation = Conversation::new(vec![ChatMessage::user("tell me about courses")]);
        let probed = conversation.with_user_probe("yes or no?");
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(probed.messages().len(), 2);
        assert_eq!(probed.messages()[1].content, "yes or no?");
    }

    #[test]
    fn reply_parses_content_and_tool_calls() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "function": {
                            "name": "course_filter",
                            "arguments": "{\"subject\": [\"CPSC\"]}"
                        }
                    }]
                }
            }]
        });
        let reply = AssistantReply::from_response(&raw).unwrap();
        assert!(reply.content.is_none());
        let call = reply.tool_call("course_filter").unwrap();
        assert_eq!(call.arguments["subject"][0], "CPSC");
    }

    #[test]
    fn reply_without_message_is_an_error() {
        assert!(AssistantReply::from_response(&json!({"choices": []})).is_err());
    }
}
