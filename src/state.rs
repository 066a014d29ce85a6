// src/state.rs

//! Shared application state: the configuration plus the two external-service
//! handles, both safe for concurrent reuse across requests.

use anyhow::Result;
use std::sync::Arc;

use crate::catalog::{CatalogSearch, QdrantCatalogStore};
use crate::chat::RecommendationService;
use crate::config::EliConfig;
use crate::llm::{ChatModel, OpenAiClient};

pub struct AppState {
    pub config: Arc<EliConfig>,
    pub recommender: RecommendationService,
    /// Plain client for the CAS round-trip.
    pub http: reqwest::Client,
}

/// Assembles state from explicit service handles. Tests use this to inject
/// scripted gateway/catalog implementations.
pub fn build_app_state(
    config: Arc<EliConfig>,
    model: Arc<dyn ChatModel>,
    catalog: Arc<dyn CatalogSearch>,
) -> Arc<AppState> {
    Arc::new(AppState {
        recommender: RecommendationService::new(config.clone(), model, catalog),
        http: reqwest::Client::new(),
        config,
    })
}

/// Production wiring: OpenAI client plus the Qdrant-backed catalog, with the
/// collection bootstrapped on startup.
pub async fn create_app_state(config: EliConfig) -> Result<Arc<AppState>> {
    let config = Arc::new(config);
    let model = Arc::new(OpenAiClient::new(&config)?);

    let catalog = QdrantCatalogStore::new(&config);
    catalog.ensure_collection().await?;

    Ok(build_app_state(config, model, Arc::new(catalog)))
}
