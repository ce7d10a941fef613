// src/runner.rs
use serde::Serialize;
use std::time::Instant;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::extractor::extract_grading_result;
use crate::invoker::invoke;
use crate::models::{CandidateFailure, GradingRequest, GradingResult, ModelCandidate, Submission};
use crate::prompt::build_prompt;
use crate::providers::LlmProvider;
use crate::resolver::CandidateSource;

#[derive(Debug, Serialize, Clone)]
pub struct GradingReport {
    pub id: String,
    pub graded_at: String,
    pub max_score: u32,
    pub result: GradingResult,
    pub model: ModelCandidate,
    pub failed_attempts: Vec<CandidateFailure>,
    pub latency_ms: u64,
}

/// Grade one submission: prompt, resolve candidates, invoke, extract.
///
/// When every candidate fails the source is invalidated, so a retry starts
/// from a fresh model listing.
pub async fn grade_submission<S, P>(
    config: &AppConfig,
    source: &S,
    provider: &P,
    submission: &Submission,
) -> Result<GradingReport>
where
    S: CandidateSource + ?Sized,
    P: LlmProvider,
{
    submission.validate()?;
    let start = Instant::now();

    let prompt = build_prompt(submission, config.prompt_template.as_deref());
    let request = GradingRequest::new(prompt, config.generation_timeout_secs);

    let candidates = source.candidates().await?;
    log::info!(
        "🎯 Grading with {} candidates, primary {}",
        candidates.len(),
        candidates.primary()
    );

    let outcome = invoke(provider, &request, candidates.as_slice()).await?;
    let (raw_text, model, failed_attempts) = match outcome.into_success() {
        Ok(success) => success,
        Err(e) => {
            source.invalidate();
            return Err(e);
        }
    };

    let result = extract_grading_result(&raw_text)?;
    let latency_ms = start.elapsed().as_millis() as u64;

    log::info!(
        "✅ Graded by {}: {} / {} ({}ms)",
        model,
        result.score,
        submission.max_score,
        latency_ms
    );

    Ok(GradingReport {
        id: uuid::Uuid::new_v4().to_string(),
        graded_at: chrono::Utc::now().to_rfc3339(),
        max_score: submission.max_score,
        result,
        model,
        failed_attempts,
        latency_ms,
    })
}

/// Resolve candidates without grading, for diagnostics.
pub async fn list_candidates<S: CandidateSource + ?Sized>(source: &S) -> Result<Vec<ModelCandidate>> {
    let list = source.candidates().await?;
    Ok(list.as_slice().to_vec())
}
