// src/extractor.rs
//! Recovers a `GradingResult` from model text that should be a single JSON
//! object but may arrive fenced or wrapped in commentary.

use serde_json::{Map, Value};

use crate::errors::{GradeError, Result};
use crate::models::GradingResult;

const FENCE: &str = "```";

/// Parses `raw` into a `GradingResult`.
///
/// Fails before parsing completes (`EmptyResponse`, `NoJsonBlockFound`,
/// `MalformedJson`) or not at all: once the object parses, every field has a
/// default.
pub fn extract_grading_result(raw: &str) -> Result<GradingResult> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GradeError::EmptyResponse);
    }

    let working = unfence(trimmed);

    let block = match (working.find('{'), working.rfind('}')) {
        (Some(start), Some(end)) if end > start => &working[start..=end],
        _ => {
            log::warn!("No JSON object in model response ({} bytes)", raw.len());
            return Err(GradeError::NoJsonBlockFound {
                raw: raw.to_string(),
            });
        }
    };

    let object: Map<String, Value> = serde_json::from_str(block).map_err(|source| {
        log::warn!("Malformed JSON in model response: {}", source);
        GradeError::MalformedJson {
            raw: raw.to_string(),
            source,
        }
    })?;

    Ok(normalize(&object))
}

/// Content after the first fence, minus its language tag, when the text opens
/// with a fence that is closed again. Anything else comes back unchanged.
fn unfence(text: &str) -> &str {
    if !text.starts_with(FENCE) {
        return text;
    }
    let parts: Vec<&str> = text.split(FENCE).collect();
    if parts.len() < 3 {
        return text;
    }
    let body = parts[1];
    match body.split_once('\n') {
        Some((tag, rest)) if !tag.contains('{') => rest,
        _ => body,
    }
}

fn normalize(object: &Map<String, Value>) -> GradingResult {
    GradingResult {
        score: score_of(object.get("score")),
        rubric: text_of(object.get("rubric")),
        strengths: FeedbackField::from(object.get("strengths")).into_items(),
        weaknesses: FeedbackField::from(object.get("weaknesses")).into_items(),
        improvements: FeedbackField::from(object.get("improvements")).into_items(),
        reasoning: text_of(object.get("reasoning")),
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.
fn score_of(value: Option<&Value>) -> f64 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score.filter(|s| s.is_finite()).unwrap_or(0.0)
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => stringify(v),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Shapes a feedback list arrives in.
#[derive(Debug, PartialEq)]
pub enum FeedbackField<'a> {
    Missing,
    Single(&'a Value),
    Items(&'a [Value]),
}

impl<'a> From<Option<&'a Value>> for FeedbackField<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => FeedbackField::Missing,
            Some(Value::Array(items)) => FeedbackField::Items(items),
            Some(v) => FeedbackField::Single(v),
        }
    }
}

impl FeedbackField<'_> {
    pub fn into_items(self) -> Vec<String> {
        match self {
            FeedbackField::Missing => Vec::new(),
            // A lone value is always kept, even when blank.
            FeedbackField::Single(v) => vec![stringify(v)],
            FeedbackField::Items(items) => items
                .iter()
                .map(stringify)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}
