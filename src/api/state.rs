// src/api/state.rs
use crate::cache::CachedResolver;
use crate::config::AppConfig;
use crate::providers::gemini::GeminiProvider;
use crate::resolver::{CandidateSource, EndpointResolver};
use reqwest::Client;
use std::sync::Arc;

/// Shared by every request. `candidates` outlives single requests so the
/// resolved list can be reused until its TTL runs out.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub provider: GeminiProvider,
    pub candidates: Arc<dyn CandidateSource>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let provider = GeminiProvider::new(
            Client::new(),
            config.gemini.clone(),
            config.listing_timeout(),
        );
        let resolver = EndpointResolver::new(
            provider.clone(),
            config.gemini.api_versions.clone(),
            config.gemini.models.clone(),
        );
        let candidates: Arc<dyn CandidateSource> = match config.candidate_cache_ttl() {
            Some(ttl) => Arc::new(CachedResolver::new(resolver, ttl)),
            None => Arc::new(resolver),
        };

        Self {
            config: Arc::new(config),
            provider,
            candidates,
        }
    }
}
