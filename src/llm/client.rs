// src/llm/client.rs

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};

use crate::config::EliConfig;
use crate::llm::ChatModel;
use crate::llm::types::{AssistantReply, ChatMessage};
use crate::util::{RetryPolicy, with_backoff};

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    chat_model: String,
    embedding_model: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(config: &EliConfig) -> Result<Self> {
        if config.openai_api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is not set"));
        }
        Ok(Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            api_base: config.openai_base_url.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            retry: config.retry_policy(),
        })
    }

    /// Request builder shared by all provider endpoints.
    fn request(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!(
                "{}/{}",
                self.api_base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn send_chat(&self, payload: &Value) -> Result<AssistantReply> {
        let response = self
            .request("chat/completions")
            .json(payload)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {status}: {body}"));
        }

        let raw: Value = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;
        AssistantReply::from_response(&raw)
    }

    async fn send_embedding(&self, payload: &Value) -> Result<Vec<f32>> {
        let response = self
            .request("embeddings")
            .json(payload)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI embedding error {status}: {body}"));
        }

        let raw: Value = response
            .json()
            .await
            .context("Failed to parse embedding response")?;
        let embedding = raw["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow!("No embedding in OpenAI response"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        Ok(embedding)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: Option<Vec<Value>>,
        tool_choice: Option<Value>,
    ) -> Result<AssistantReply> {
        let mut payload = json!({
            "model": self.chat_model,
            "messages": messages,
            "temperature": 0.7,
        });

        if let Some(tools) = tools {
            payload["tools"] = json!(tools);
            payload["tool_choice"] = tool_choice.unwrap_or_else(|| json!("auto"));
        }

        with_backoff(&self.retry, "chat completion", || self.send_chat(&payload)).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let payload = json!({
            "input": text,
            "model": self.embedding_model,
        });

        with_backoff(&self.retry, "embedding", || self.send_embedding(&payload)).await
    }
}
