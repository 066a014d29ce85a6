// src/catalog/search.rs

//! Builds the conjunctive Qdrant filter block from a FilterSpec.

use serde_json::{Value, json};

use crate::chat::filters::FilterSpec;

/// Returns the `filter` JSON for a search request, or `None` when the spec
/// constrains nothing (an unfiltered similarity search).
pub fn build_catalog_filter(spec: &FilterSpec) -> Option<Value> {
    if spec.is_empty() {
        return None;
    }

    let mut must = Vec::new();

    if !spec.season_code.is_empty() {
        must.push(json!({
            "key": "season_code",
            "match": { "any": spec.season_code }
        }));
    }
    if !spec.subject.is_empty() {
        must.push(json!({
            "key": "subject",
            "match": { "any": spec.subject }
        }));
    }
    if !spec.areas.is_empty() {
        let areas: Vec<&str> = spec.areas.iter().map(|a| a.as_str()).collect();
        must.push(json!({
            "key": "areas",
            "match": { "any": areas }
        }));
    }
    if !spec.skills.is_empty() {
        let skills: Vec<&str> = spec.skills.iter().map(|s| s.as_str()).collect();
        must.push(json!({
            "key": "skills",
            "match": { "any": skills }
        }));
    }
    if let Some((op, value)) = spec.rating {
        must.push(json!({
            "key": "rating",
            "range": { op.as_range_key(): value }
        }));
    }
    if let Some((op, value)) = spec.workload {
        must.push(json!({
            "key": "workload",
            "range": { op.as_range_key(): value }
        }));
    }

    Some(json!({ "must": must }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::filters::{Area, CmpOp};

    #[test]
    fn empty_spec_builds_no_filter() {
        assert!(build_catalog_filter(&FilterSpec::default()).is_none());
    }

    #[test]
    fn set_facets_become_match_any_clauses() {
        let spec = FilterSpec {
            subject: vec!["CPSC".to_string()],
            areas: vec![Area::Sc],
            ..FilterSpec::default()
        };
        let filter = build_catalog_filter(&spec).unwrap();
        let must = filter["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["key"], "subject");
        assert_eq!(must[0]["match"]["any"][0], "CPSC");
        assert_eq!(must[1]["key"], "areas");
        assert_eq!(must[1]["match"]["any"][0], "Sc");
    }

    #[test]
    fn numeric_facets_become_range_clauses() {
        let spec = FilterSpec {
            rating: Some((CmpOp::Gte, 3.5)),
            workload: Some((CmpOp::Lt, 2.0)),
            ..FilterSpec::default()
        };
        let filter = build_catalog_filter(&spec).unwrap();
        let must = filter["must"].as_array().unwrap();
        assert_eq!(must[0]["key"], "rating");
        assert_eq!(must[0]["range"]["gte"], 3.5);
        assert_eq!(must[1]["range"]["lt"], 2.0);
    }
}
