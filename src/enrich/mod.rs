// src/enrich/mod.rs

//! Offline enrichment jobs: copy externally produced rating and sentiment
//! fields into parsed-course JSON files, keyed by `{season_code}-{crn}`
//! evaluation filenames. Not part of the request-serving path.

pub mod ratings;
pub mod sentiment;

pub use ratings::port_ratings;
pub use sentiment::port_sentiment;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of one porting run.
#[derive(Debug)]
pub struct PortReport {
    pub files_processed: usize,
    pub courses_updated: usize,
    pub courses_missing: usize,
    pub finished_at: DateTime<Utc>,
}

/// Season files in `dir` whose filenames start with one of the requested
/// years (season codes embed the year as their first four digits).
pub(crate) fn season_files(dir: &Path, years: &[i32]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).into_iter() {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let year = stem.get(..4).and_then(|y| y.parse::<i32>().ok());
        if year.is_some_and(|y| years.contains(&y)) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Filename index over the evaluation directory, built once per run so each
/// course lookup is a prefix scan instead of a directory listing.
pub(crate) struct EvalIndex {
    entries: Vec<(String, PathBuf)>,
}

impl EvalIndex {
    pub fn build(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).max_depth(1).into_iter() {
            let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                entries.push((name.to_string(), path.to_path_buf()));
            }
        }
        entries.sort();
        Ok(Self { entries })
    }

    /// First evaluation file named `{season}-{crn}...`, if any.
    pub fn find(&self, season_code: &str, crn: &str) -> Option<&Path> {
        let prefix = format!("{season_code}-{crn}");
        self.entries
            .iter()
            .find(|(name, _)| name.starts_with(&prefix))
            .map(|(_, path)| path.as_path())
    }
}

/// CRNs of a course object; the source data stores them as numbers or strings.
pub(crate) fn crns_of(course: &Value) -> Vec<String> {
    course["crns"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|crn| match crn {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn read_course_file(path: &Path) -> Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub(crate) fn write_course_file(path: &Path, courses: &[Value]) -> Result<()> {
    let pretty = serde_json::to_string_pretty(courses)?;
    std::fs::write(path, pretty).with_context(|| format!("Failed to write {}", path.display()))
}
