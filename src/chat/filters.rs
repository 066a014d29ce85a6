// src/chat/filters.rs

//! Structured search facets: extraction from the model's tool call, parsing of
//! client-declared request parameters, and the merge between the two.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

use crate::llm::schema::{COURSE_FILTER_TOOL, course_filter_tools};
use crate::llm::{ChatModel, Conversation};

/// Distributional area designation on a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Area {
    Hu,
    So,
    Sc,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Hu => "Hu",
            Area::So => "So",
            Area::Sc => "Sc",
        }
    }
}

impl FromStr for Area {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Hu" | "hu" | "HU" => Ok(Area::Hu),
            "So" | "so" | "SO" => Ok(Area::So),
            "Sc" | "sc" | "SC" => Ok(Area::Sc),
            _ => Err(()),
        }
    }
}

/// Skill designation on a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Skill {
    WR,
    QR,
}

impl Skill {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::WR => "WR",
            Skill::QR => "QR",
        }
    }
}

impl FromStr for Skill {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "WR" | "wr" => Ok(Skill::WR),
            "QR" | "qr" => Ok(Skill::QR),
            _ => Err(()),
        }
    }
}

/// Comparison operator for the numeric facets. The tool schema speaks the
/// `$gt`-style dialect; `as_range_key` is the Qdrant spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CmpOp {
    pub fn as_range_key(&self) -> &'static str {
        match self {
            CmpOp::Gt => "gt",
            CmpOp::Lt => "lt",
            CmpOp::Gte => "gte",
            CmpOp::Lte => "lte",
        }
    }
}

impl FromStr for CmpOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('$') {
            "gt" => Ok(CmpOp::Gt),
            "lt" => Ok(CmpOp::Lt),
            "gte" => Ok(CmpOp::Gte),
            "lte" => Ok(CmpOp::Lte),
            _ => Err(()),
        }
    }
}

/// Optional predicate over catalog fields. A facet left empty constrains
/// nothing; it is omitted from the search predicate, not defaulted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub season_code: Vec<String>,
    pub subject: Vec<String>,
    pub areas: Vec<Area>,
    pub skills: Vec<Skill>,
    pub rating: Option<(CmpOp, f64)>,
    pub workload: Option<(CmpOp, f64)>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.season_code.is_empty()
            && self.subject.is_empty()
            && self.areas.is_empty()
            && self.skills.is_empty()
            && self.rating.is_none()
            && self.workload.is_none()
    }

    /// Client-declared facets from the request body. Unknown area strings are
    /// skipped with a warning rather than failing the request.
    pub fn from_request(
        season_codes: Option<Vec<String>>,
        subject: Option<Vec<String>>,
        areas: Option<Vec<String>>,
    ) -> Self {
        let areas = areas
            .unwrap_or_default()
            .iter()
            .filter_map(|raw| match raw.parse::<Area>() {
                Ok(area) => Some(area),
                Err(()) => {
                    warn!(area = %raw, "ignoring unknown area in request");
                    None
                }
            })
            .collect();

        Self {
            season_code: season_codes.unwrap_or_default(),
            subject: subject.unwrap_or_default(),
            areas,
            skills: Vec::new(),
            rating: None,
            workload: None,
        }
    }

    /// Facets from the `course_filter` tool-call arguments. Absent properties
    /// stay unconstrained; a comparison without its number (or vice versa) is
    /// dropped.
    pub fn from_tool_args(args: &Value) -> Self {
        Self {
            season_code: string_list(&args["season_code"]),
            subject: string_list(&args["subject"]),
            areas: string_list(&args["areas"])
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect(),
            skills: string_list(&args["skills"])
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect(),
            rating: comparison(args, "comparison_operator_rating", "rating"),
            workload: comparison(args, "comparison_operator_workload", "workload"),
        }
    }

    /// Merge of the two provenances: where both supply the same facet the
    /// client wins outright; model facets survive only where the client was
    /// silent.
    pub fn overridden_by(mut self, client: FilterSpec) -> FilterSpec {
        if !client.season_code.is_empty() {
            self.season_code = client.season_code;
        }
        if !client.subject.is_empty() {
            self.subject = client.subject;
        }
        if !client.areas.is_empty() {
            self.areas = client.areas;
        }
        if !client.skills.is_empty() {
            self.skills = client.skills;
        }
        if client.rating.is_some() {
            self.rating = client.rating;
        }
        if client.workload.is_some() {
            self.workload = client.workload;
        }
        self
    }
}

// The model occasionally returns a bare string where the schema says array;
// accept both.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn comparison(args: &Value, op_key: &str, value_key: &str) -> Option<(CmpOp, f64)> {
    let op = args[op_key].as_str()?.parse::<CmpOp>().ok()?;
    let value = args[value_key].as_f64()?;
    Some((op, value))
}

/// Runs the extraction tool call over the conversation. No tool call from the
/// model means no constraints.
pub async fn extract_filters(
    model: &dyn ChatModel,
    conversation: &Conversation,
) -> Result<FilterSpec> {
    let reply = model
        .chat(conversation.messages(), Some(course_filter_tools()), None)
        .await?;

    Ok(reply
        .tool_call(COURSE_FILTER_TOOL)
        .map(|call| FilterSpec::from_tool_args(&call.arguments))
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_args_parse_every_facet() {
        let args = json!({
            "season_code": ["202403"],
            "subject": "CPSC",
            "areas": ["Sc", "bogus"],
            "skills": ["QR"],
            "rating": 3.5,
            "comparison_operator_rating": "$gte",
            "workload": 2.0,
            "comparison_operator_workload": "$lt"
        });
        let spec = FilterSpec::from_tool_args(&args);
        assert_eq!(spec.season_code, vec!["202403"]);
        assert_eq!(spec.subject, vec!["CPSC"]);
        assert_eq!(spec.areas, vec![Area::Sc]);
        assert_eq!(spec.skills, vec![Skill::QR]);
        assert_eq!(spec.rating, Some((CmpOp::Gte, 3.5)));
        assert_eq!(spec.workload, Some((CmpOp::Lt, 2.0)));
    }

    #[test]
    fn comparison_without_number_is_dropped() {
        let args = json!({ "comparison_operator_rating": "$gt" });
        let spec = FilterSpec::from_tool_args(&args);
        assert!(spec.rating.is_none());
        assert!(spec.is_empty());
    }

    #[test]
    fn client_facets_override_model_facets() {
        let model = FilterSpec {
            subject: vec!["ECON".to_string()],
            rating: Some((CmpOp::Gt, 3.0)),
            ..FilterSpec::default()
        };
        let client = FilterSpec {
            subject: vec!["CPSC".to_string()],
            ..FilterSpec::default()
        };
        let merged = model.overridden_by(client);
        assert_eq!(merged.subject, vec!["CPSC"]);
        // Facets the client left alone survive from the model.
        assert_eq!(merged.rating, Some((CmpOp::Gt, 3.0)));
    }

    #[test]
    fn request_facets_skip_unknown_areas() {
        let spec = FilterSpec::from_request(
            Some(vec!["202403".to_string()]),
            None,
            Some(vec!["Hu".to_string(), "XX".to_string()]),
        );
        assert_eq!(spec.season_code, vec!["202403"]);
        assert!(spec.subject.is_empty());
        assert_eq!(spec.areas, vec![Area::Hu]);
    }
}
