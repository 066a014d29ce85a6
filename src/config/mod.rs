// src/config/mod.rs
// All tunables load from the environment (.env supported); the struct is
// threaded explicitly through AppState rather than living in a global static.

use std::str::FromStr;
use std::time::Duration;

use crate::util::RetryPolicy;

#[derive(Debug, Clone)]
pub struct EliConfig {
    // ── OpenAI Configuration
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,

    // ── Qdrant Configuration
    pub qdrant_url: String,
    pub qdrant_collection: String,

    // ── Pipeline Configuration
    pub course_query_limit: usize,
    pub course_query_candidates: usize,
    pub enable_safety_gate: bool,
    pub enable_retrieval_gate: bool,

    // ── Retry Configuration
    pub retry_max_attempts: u32,
    pub retry_max_delay_secs: u64,

    // ── CAS Configuration
    pub cas_base_url: String,

    // ── Server Configuration
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub log_level: String,
}

impl Default for EliConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dim: 1536,
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_collection: "parsed_courses".to_string(),
            course_query_limit: 5,
            course_query_candidates: 30,
            enable_safety_gate: true,
            enable_retrieval_gate: true,
            retry_max_attempts: 3,
            retry_max_delay_secs: 40,
            cas_base_url: "https://secure.its.yale.edu/cas".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origin: "*".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl EliConfig {
    pub fn from_env() -> Self {
        // Load .env first if present; plain environment variables still win.
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        let defaults = Self::default();
        Self {
            openai_api_key: env_var_or("OPENAI_API_KEY", defaults.openai_api_key),
            openai_base_url: env_var_or("OPENAI_BASE_URL", defaults.openai_base_url),
            chat_model: env_var_or("ELI_CHAT_MODEL", defaults.chat_model),
            embedding_model: env_var_or("ELI_EMBEDDING_MODEL", defaults.embedding_model),
            embedding_dim: env_var_or("ELI_EMBEDDING_DIM", defaults.embedding_dim),
            qdrant_url: env_var_or("QDRANT_URL", defaults.qdrant_url),
            qdrant_collection: env_var_or("QDRANT_COLLECTION", defaults.qdrant_collection),
            course_query_limit: env_var_or("ELI_COURSE_QUERY_LIMIT", defaults.course_query_limit),
            course_query_candidates: env_var_or(
                "ELI_COURSE_QUERY_CANDIDATES",
                defaults.course_query_candidates,
            ),
            enable_safety_gate: env_var_or("ELI_ENABLE_SAFETY_GATE", defaults.enable_safety_gate),
            enable_retrieval_gate: env_var_or(
                "ELI_ENABLE_RETRIEVAL_GATE",
                defaults.enable_retrieval_gate,
            ),
            retry_max_attempts: env_var_or("ELI_RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            retry_max_delay_secs: env_var_or(
                "ELI_RETRY_MAX_DELAY_SECS",
                defaults.retry_max_delay_secs,
            ),
            cas_base_url: env_var_or("CAS_BASE_URL", defaults.cas_base_url),
            host: env_var_or("ELI_HOST", defaults.host),
            port: env_var_or("ELI_PORT", defaults.port),
            cors_origin: env_var_or("ELI_CORS_ORIGIN", defaults.cors_origin),
            log_level: env_var_or("ELI_LOG_LEVEL", defaults.log_level),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts.max(1),
            max_delay: Duration::from_secs(self.retry_max_delay_secs),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads `key` from the environment, tolerating trailing comments and
/// whitespace; falls back to `default` when missing or unparsable.
fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {key} = '{val}' (parse failed, using default)");
                    default
                }
            }
        }
        Err(_) => default,
    }
}
