// src/prompt.rs
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

use crate::models::Submission;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder pattern is valid"));

/// Grading instructions. Placeholders: `problem`, `answer`, `reference`,
/// `strictness`, `max_score`.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a strict and fair exam grader. Evaluate the candidate's answer to the problem below and reply in JSON.

Your reply MUST be a single JSON object following this schema, with no other text:
{
  "score": <number from 0 to {{max_score}}>,
  "rubric": "summary of the grading criteria",
  "strengths": ["strength 1", "strength 2"],
  "weaknesses": ["gap or error 1", "gap or error 2"],
  "improvements": ["suggestion 1", "suggestion 2"],
  "reasoning": "explanation of how the final score was reached"
}

Strictness (1 = lenient, 5 = very strict): {{strictness}}

PROBLEM:
{{problem}}

CANDIDATE ANSWER:
{{answer}}

REFERENCE ANSWER (optional; ignore if empty):
{{reference}}
"#;

/// Renders the grading prompt for `submission`, using `template` when given.
pub fn build_prompt(submission: &Submission, template: Option<&str>) -> String {
    let data = json!({
        "problem": submission.problem.trim(),
        "answer": submission.answer.trim(),
        "reference": submission.reference.as_deref().map(str::trim).unwrap_or(""),
        "strictness": submission.strictness.to_string(),
        "max_score": submission.max_score.to_string(),
    });
    render_template(template.unwrap_or(DEFAULT_PROMPT_TEMPLATE), &data)
}

/// Simple template renderer using regex.
fn render_template(template: &str, data: &serde_json::Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            data.get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| caps[0].to_string()) // Keep original placeholder if key not found
        })
        .to_string()
}
