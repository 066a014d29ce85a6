// src/catalog/store.rs

//! Similarity search against the course catalog held in a Qdrant collection,
//! spoken to over its REST API.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::catalog::search::build_catalog_filter;
use crate::catalog::types::CourseRecord;
use crate::chat::filters::FilterSpec;
use crate::config::EliConfig;
use crate::util::{RetryPolicy, with_backoff};

/// The catalog is read-only from the pipeline's view: one ranked similarity
/// search, optionally constrained by a conjunctive predicate.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Ranked search over course embeddings. `candidates` widens the pool the
    /// index considers before truncating to `limit`.
    async fn search(
        &self,
        vector: &[f32],
        filter: Option<&FilterSpec>,
        limit: usize,
        candidates: usize,
    ) -> Result<Vec<CourseRecord>>;
}

pub struct QdrantCatalogStore {
    client: Client,
    base_url: String,
    collection: String,
    embedding_dim: usize,
    retry: RetryPolicy,
}

impl QdrantCatalogStore {
    pub fn new(config: &EliConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
            collection: config.qdrant_collection.clone(),
            embedding_dim: config.embedding_dim,
            retry: config.retry_policy(),
        }
    }

    /// Ensures the collection exists with the right vector size. Safe to call
    /// on every startup; only creates when missing.
    pub async fn ensure_collection(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let resp = self.client.get(&url).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }

        let req_body = json!({
            "vectors": {
                "size": self.embedding_dim,
                "distance": "Cosine"
            }
        });
        let resp = self.client.put(&url).json(&req_body).send().await?;

        let status = resp.status();
        let err_body = resp.text().await.unwrap_or_default();
        if status.is_success() || status.as_u16() == 409 || err_body.contains("already exists") {
            Ok(())
        } else {
            Err(anyhow!("Failed to create Qdrant collection: {err_body}"))
        }
    }

    async fn send_search(&self, req_body: &Value) -> Result<Vec<CourseRecord>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );

        let resp = self
            .client
            .post(&url)
            .json(req_body)
            .send()
            .await
            .map_err(|e| anyhow!("Qdrant search error: {e}"))?;

        if !resp.status().is_success() {
            return Err(anyhow!(
                "Qdrant search failed: {}",
                resp.text().await.unwrap_or_default()
            ));
        }

        let resp_json: Value = resp.json().await?;
        let mut results = Vec::new();
        if let Some(points) = resp_json.get("result").and_then(|r| r.as_array()) {
            for point in points {
                if let Some(record) = CourseRecord::from_point(point) {
                    results.push(record);
                }
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl CatalogSearch for QdrantCatalogStore {
    async fn search(
        &self,
        vector: &[f32],
        filter: Option<&FilterSpec>,
        limit: usize,
        candidates: usize,
    ) -> Result<Vec<CourseRecord>> {
        let mut req_body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
            "params": { "hnsw_ef": candidates }
        });

        if let Some(predicate) = filter.and_then(build_catalog_filter) {
            debug!(filter = %predicate, "searching catalog with predicate");
            req_body["filter"] = predicate;
        }

        with_backoff(&self.retry, "catalog search", || {
            self.send_search(&req_body)
        })
        .await
    }
}
