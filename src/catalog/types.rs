// src/catalog/types.rs

//! Catalog records as the pipeline sees them: read-only reference data
//! produced by the offline ingestion and enrichment jobs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub season_code: String,
    pub course_code: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub areas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
}

impl CourseRecord {
    /// Parses a Qdrant point's payload into a record. Points without the
    /// identifying fields are skipped by the caller.
    pub fn from_point(point: &Value) -> Option<CourseRecord> {
        let payload = point.get("payload")?;

        Some(CourseRecord {
            season_code: payload.get("season_code")?.as_str()?.to_string(),
            course_code: payload.get("course_code")?.as_str()?.to_string(),
            title: payload.get("title")?.as_str()?.to_string(),
            description: payload
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            areas: payload
                .get("areas")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|a| a.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            sentiment_label: payload
                .get("sentiment_label")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            sentiment_score: payload.get("sentiment_score").and_then(|v| v.as_f64()),
        })
    }
}
