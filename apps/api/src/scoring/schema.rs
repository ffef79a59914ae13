//! Coerces a model's raw answer into a `ScoreResult`.
//!
//! Only a missing JSON object or a missing `final_score` makes an answer malformed;
//! every other field is coerced to a safe value.

use serde_json::{Map, Value};

use crate::llm_client::strip_json_fences;
use crate::models::screening::{Penalty, ScoreResult};

pub const MISSING_EXPLANATION: &str = "The scoring backend did not provide an explanation.";

/// Parses a raw answer. `Err` carries a short description of what was wrong.
pub fn parse_score_response(file: &str, raw: &str) -> Result<ScoreResult, String> {
    let object = parse_json_object(raw)?;
    let final_score = object
        .get("final_score")
        .ok_or_else(|| "response has no final_score".to_string())?;

    Ok(ScoreResult {
        file: file.to_string(),
        candidate_name: object.get("candidate_name").and_then(non_blank_string),
        final_score: clamp_score(coerce_number(final_score)),
        hard_filter_pass: object.get("hard_filter_pass").map(coerce_bool).unwrap_or(false),
        explanation: object
            .get("explanation")
            .and_then(non_blank_string)
            .unwrap_or_else(|| MISSING_EXPLANATION.to_string()),
        top_reasons: object.get("top_reasons").map(coerce_string_list).unwrap_or_default(),
        risks: object.get("risks").map(coerce_string_list).unwrap_or_default(),
        skill_coverage: object.get("skill_coverage").and_then(component_score),
        project_relevance: object.get("project_relevance").and_then(component_score),
        role_alignment: object.get("role_alignment").and_then(component_score),
        education_fit: object.get("education_fit").and_then(component_score),
        penalties: object.get("penalties").map(coerce_penalties).unwrap_or_default(),
        evidence_snippets: object
            .get("evidence_snippets")
            .map(coerce_string_list)
            .unwrap_or_default(),
    })
}

/// Clamps into [0, 100] and rounds to one decimal place. NaN becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    (score.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Optional sub-score: absent, null or non-numeric stays `None`.
fn component_score(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }?;
    (!n.is_nan()).then(|| clamp_score(n))
}

/// Objects keep their `reason`/`points`; bare values become a zero-point reason.
fn coerce_penalties(value: &Value) -> Vec<Penalty> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => vec![],
        single => vec![single],
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::Object(map) => Some(Penalty {
                reason: map
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(|r| r.trim().to_string())
                    .unwrap_or_else(|| item.to_string()),
                points: map.get("points").map(coerce_number).unwrap_or(0.0),
            }),
            Value::String(s) => Some(Penalty {
                reason: s.trim().to_string(),
                points: 0.0,
            }),
            other => Some(Penalty {
                reason: other.to_string(),
                points: 0.0,
            }),
        })
        .filter(|p| !p.reason.is_empty())
        .collect()
}

fn parse_json_object(raw: &str) -> Result<Map<String, Value>, String> {
    let text = strip_json_fences(raw);
    let value = serde_json::from_str::<Value>(text).or_else(|first_error| {
        // Models sometimes wrap the object in prose; try the outermost braces.
        match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&text[start..=end])
                .map_err(|_| format!("response is not valid JSON: {first_error}")),
            _ => Err(format!("response is not valid JSON: {first_error}")),
        }
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, got {}", kind_of(&other))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| !n.is_nan())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn non_blank_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

fn coerce_string_list(value: &Value) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => vec![],
        single => vec![single],
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            Value::Object(map) => map
                .get("reason")
                .or_else(|| map.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(item.to_string())),
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect()
}
