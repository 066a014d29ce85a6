// src/enrich/ratings.rs

//! Copies CourseTable rating data into parsed-course files, in place.

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

use super::{
    EvalIndex, PortReport, crns_of, read_course_file, read_json, season_files, write_course_file,
};

/// For every course in the target season files, finds the evaluation file
/// keyed `{season_code}-{crn}` and copies its `ratings` field; courses with
/// no evaluation on disk get an empty list.
pub fn port_ratings(target_dir: &Path, ratings_dir: &Path, years: &[i32]) -> Result<PortReport> {
    let index = EvalIndex::build(ratings_dir)?;
    let mut report = PortReport {
        files_processed: 0,
        courses_updated: 0,
        courses_missing: 0,
        finished_at: Utc::now(),
    };

    for path in season_files(target_dir, years)? {
        info!(file = %path.display(), "porting ratings");
        let mut courses = read_course_file(&path)?;

        for course in &mut courses {
            let season_code = course["season_code"].as_str().unwrap_or_default().to_string();
            let mut found = false;

            for crn in crns_of(course) {
                if let Some(eval_path) = index.find(&season_code, &crn) {
                    let eval = read_json(eval_path)?;
                    course["ratings"] = eval["ratings"].clone();
                    debug!(%season_code, %crn, "ratings ported");
                    found = true;
                    break;
                }
            }

            if found {
                report.courses_updated += 1;
            } else {
                course["ratings"] = json!([]);
                report.courses_missing += 1;
            }
        }

        write_course_file(&path, &courses)?;
        report.files_processed += 1;
    }

    report.finished_at = Utc::now();
    Ok(report)
}
