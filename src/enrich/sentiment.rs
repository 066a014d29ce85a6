// src/enrich/sentiment.rs

//! Copies precomputed sentiment-classification results into parsed-course
//! files, in place, and flattens the final label/score into the fields the
//! serving pipeline projects.

use anyhow::Result;
use chrono::Utc;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info};

use super::{
    EvalIndex, PortReport, crns_of, read_course_file, read_json, season_files, write_course_file,
};

/// For every course in the target season files, finds the sentiment file
/// keyed `{season_code}-{crn}` and copies its `sentiment_info` object.
/// `final_label`/`final_proportion` also land on the course as
/// `sentiment_label`/`sentiment_score`; courses with no sentiment file get an
/// empty object and no flat fields.
pub fn port_sentiment(
    target_dir: &Path,
    sentiment_dir: &Path,
    years: &[i32],
) -> Result<PortReport> {
    let index = EvalIndex::build(sentiment_dir)?;
    let mut report = PortReport {
        files_processed: 0,
        courses_updated: 0,
        courses_missing: 0,
        finished_at: Utc::now(),
    };

    for path in season_files(target_dir, years)? {
        info!(file = %path.display(), "porting sentiment");
        let mut courses = read_course_file(&path)?;

        for course in &mut courses {
            let season_code = course["season_code"].as_str().unwrap_or_default().to_string();
            let mut found = false;

            for crn in crns_of(course) {
                if let Some(eval_path) = index.find(&season_code, &crn) {
                    let eval = read_json(eval_path)?;
                    apply_sentiment(course, &eval["sentiment_info"]);
                    debug!(%season_code, %crn, "sentiment ported");
                    found = true;
                    break;
                }
            }

            if found {
                report.courses_updated += 1;
            } else {
                course["sentiment_info"] = json!({});
                report.courses_missing += 1;
            }
        }

        write_course_file(&path, &courses)?;
        report.files_processed += 1;
    }

    report.finished_at = Utc::now();
    Ok(report)
}

fn apply_sentiment(course: &mut Value, info: &Value) {
    course["sentiment_info"] = info.clone();

    if let Some(label) = info["final_label"].as_str().filter(|l| !l.is_empty()) {
        course["sentiment_label"] = json!(label);
    }
    if let Some(score) = info["final_proportion"].as_f64() {
        course["sentiment_score"] = json!(score);
    }
}
