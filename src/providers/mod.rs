// src/providers/mod.rs

use std::future::Future;

use crate::errors::Result;
use crate::models::{ApiVersion, GradingRequest, ModelCandidate, ModelDescriptor};

pub mod gemini;

/// A common trait for Large Language Model (LLM) providers.
///
/// Note: We're not using async_trait here, so implementers must handle async directly.
pub trait LlmProvider: Send + Sync {
    /// Generates raw text for `request.prompt_text` from the given candidate.
    ///
    /// Sampling is deterministic (temperature 0) and the call is bounded by
    /// `request.timeout_seconds`. Any transport error, non-success status or
    /// unexpected envelope is returned as an error.
    fn generate(
        &self,
        candidate: &ModelCandidate,
        request: &GradingRequest,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Lists the models a namespace exposes.
pub trait ModelCatalog: Send + Sync {
    /// Returns every model in `api_version` with the operations it supports.
    /// Model ids come back without the `models/` prefix.
    fn list_models(
        &self,
        api_version: ApiVersion,
    ) -> impl Future<Output = Result<Vec<ModelDescriptor>>> + Send;
}
