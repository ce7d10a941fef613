// src/invoker.rs
use crate::errors::{GradeError, Result};
use crate::models::{CandidateFailure, GradingRequest, InvocationOutcome, ModelCandidate};
use crate::providers::LlmProvider;

/// Tries `candidates` one after another and stops at the first that answers.
///
/// No candidate is retried and none run in parallel. Fails with `NoCandidates`
/// only when `candidates` is empty; every per-candidate error is folded into
/// the returned outcome.
pub async fn invoke<P: LlmProvider>(
    provider: &P,
    request: &GradingRequest,
    candidates: &[ModelCandidate],
) -> Result<InvocationOutcome> {
    if candidates.is_empty() {
        return Err(GradeError::NoCandidates);
    }

    let mut errors: Vec<CandidateFailure> = Vec::new();

    for candidate in candidates {
        match provider.generate(candidate, request).await {
            Ok(raw_text) => {
                log::info!("✅ {} answered after {} failed attempts", candidate, errors.len());
                return Ok(InvocationOutcome::Success {
                    raw_text,
                    used_candidate: candidate.clone(),
                    failed_attempts: errors,
                });
            }
            Err(e) => {
                log::warn!("❌ {} failed: {}", candidate, e);
                errors.push(GradeError::candidate_failure(candidate, &e));
            }
        }
    }

    log::error!("All {} candidates failed", errors.len());
    Ok(InvocationOutcome::Failure { errors })
}

impl InvocationOutcome {
    /// Splits the outcome into the raw text and the candidate that produced it,
    /// turning a failure into `AllCandidatesFailed`.
    pub fn into_success(self) -> Result<(String, ModelCandidate, Vec<CandidateFailure>)> {
        match self {
            InvocationOutcome::Success {
                raw_text,
                used_candidate,
                failed_attempts,
            } => Ok((raw_text, used_candidate, failed_attempts)),
            InvocationOutcome::Failure { errors } => {
                Err(GradeError::AllCandidatesFailed { attempts: errors })
            }
        }
    }
}
