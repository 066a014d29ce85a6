// src/chat/service.rs

//! The recommendation pipeline: a per-request state machine sequencing the
//! gates, the query rewrite, filter extraction, the catalog search, and the
//! grounded completion.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::catalog::{CatalogSearch, CourseRecord};
use crate::chat::filters::{FilterSpec, extract_filters};
use crate::chat::gates::{needs_retrieval, passes_safety};
use crate::chat::prompts::{
    APOLOGY, DEFAULT_SYSTEM_HEADER, REFUSAL, grounding_prompt, no_results_prompt,
};
use crate::chat::reformulate::reformulate_query;
use crate::config::EliConfig;
use crate::llm::{ChatMessage, ChatModel, Conversation};

/// Terminal output of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResult {
    pub response: String,
    pub courses: Vec<CourseRecord>,
}

impl RecommendationResult {
    fn plain(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            courses: Vec::new(),
        }
    }
}

pub struct RecommendationService {
    config: Arc<EliConfig>,
    model: Arc<dyn ChatModel>,
    catalog: Arc<dyn CatalogSearch>,
}

impl RecommendationService {
    pub fn new(
        config: Arc<EliConfig>,
        model: Arc<dyn ChatModel>,
        catalog: Arc<dyn CatalogSearch>,
    ) -> Self {
        Self {
            config,
            model,
            catalog,
        }
    }

    /// Runs the pipeline. Provider failures that survive the retry policy
    /// degrade to the fixed apology with an empty course list; input
    /// validation happens at the API layer before this is called.
    pub async fn recommend(
        &self,
        messages: Vec<ChatMessage>,
        client_filters: FilterSpec,
    ) -> RecommendationResult {
        match self.run(messages, client_filters).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = ?err, "recommendation pipeline failed");
                RecommendationResult::plain(APOLOGY)
            }
        }
    }

    async fn run(
        &self,
        messages: Vec<ChatMessage>,
        client_filters: FilterSpec,
    ) -> Result<RecommendationResult> {
        let mut conversation = Conversation::new(messages);
        conversation.ensure_header(DEFAULT_SYSTEM_HEADER);

        if self.config.enable_safety_gate
            && !passes_safety(self.model.as_ref(), &conversation).await?
        {
            info!("safety gate declined the request");
            return Ok(RecommendationResult::plain(REFUSAL));
        }

        if self.config.enable_retrieval_gate
            && !needs_retrieval(self.model.as_ref(), &conversation).await?
        {
            info!("retrieval gate declined, answering without the catalog");
            let response = self.complete_text(&conversation).await?;
            return Ok(RecommendationResult::plain(response));
        }

        let query = reformulate_query(self.model.as_ref(), &conversation).await?;
        let query_vector = self.model.embed(&query).await?;

        let extracted = extract_filters(self.model.as_ref(), &conversation).await?;
        let merged = extracted.overridden_by(client_filters);
        let filter = if merged.is_empty() {
            None
        } else {
            Some(&merged)
        };

        let courses = self
            .catalog
            .search(
                &query_vector,
                filter,
                self.config.course_query_limit,
                self.config.course_query_candidates,
            )
            .await?;
        info!(query = %query, results = courses.len(), "catalog search complete");

        if courses.is_empty() {
            conversation.push_system(no_results_prompt());
        } else {
            conversation.push_system(grounding_prompt(&courses));
        }

        let response = self.complete_text(&conversation).await?;
        Ok(RecommendationResult { response, courses })
    }

    async fn complete_text(&self, conversation: &Conversation) -> Result<String> {
        let reply = self.model.chat(conversation.messages(), None, None).await?;
        Ok(reply.text())
    }
}
