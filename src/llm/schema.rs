// src/llm/schema.rs

//! Function schemas offered to the model: facet extraction for course search
//! and the constrained yes/no verdict the gates force.

use serde_json::{Value, json};

pub const COURSE_FILTER_TOOL: &str = "course_filter";
pub const VERDICT_TOOL: &str = "record_verdict";

/// Schema for structured filter extraction. Every property is optional; a
/// facet the model leaves out means "unconstrained", never an exclusion.
pub fn course_filter_tools() -> Vec<Value> {
    vec![json!({
        "type": "function",
        "function": {
            "name": COURSE_FILTER_TOOL,
            "description": "Provide filters for a course search based on conditions in the conversation.",
            "parameters": {
                "type": "object",
                "properties": {
                    "season_code": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Academic term codes the user asked about, e.g. 202403"
                    },
                    "subject": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Subject codes of instruction, e.g. CPSC or ECON"
                    },
                    "areas": {
                        "type": "array",
                        "items": { "type": "string", "enum": ["Hu", "So", "Sc"] },
                        "description": "Distributional areas: humanities, social science, science"
                    },
                    "skills": {
                        "type": "array",
                        "items": { "type": "string", "enum": ["WR", "QR"] },
                        "description": "Skill designations: writing, quantitative reasoning"
                    },
                    "rating": {
                        "type": "number",
                        "description": "The rating (0 - 4) for the class. If a number is not provided, interpret the given opinion to fit the range. A good, or average, class should be 3.5"
                    },
                    "comparison_operator_rating": {
                        "type": "string",
                        "enum": ["$lt", "$gt", "$gte", "$lte"],
                        "description": "A comparison operator for the class rating"
                    },
                    "workload": {
                        "type": "number",
                        "description": "The workload (0 - 4) for the class. If a number is not provided, interpret the given opinion to fit the range."
                    },
                    "comparison_operator_workload": {
                        "type": "string",
                        "enum": ["$lt", "$gt", "$gte", "$lte"],
                        "description": "A comparison operator for the class workload"
                    }
                },
                "required": []
            }
        }
    })]
}

/// Boolean verdict schema used by the safety and retrieval gates instead of
/// free-text yes/no answers.
pub fn verdict_tools() -> Vec<Value> {
    vec![json!({
        "type": "function",
        "function": {
            "name": VERDICT_TOOL,
            "description": "Record the answer to the yes/no question you were just asked.",
            "parameters": {
                "type": "object",
                "properties": {
                    "verdict": {
                        "type": "boolean",
                        "description": "true for yes, false for no"
                    }
                },
                "required": ["verdict"]
            }
        }
    })]
}

/// `tool_choice` payload forcing the named function.
pub fn force_tool(name: &str) -> Value {
    json!({ "type": "function", "function": { "name": name } })
}
