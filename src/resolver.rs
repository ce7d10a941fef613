// src/resolver.rs
//! Discovers which (API version, model) pairs can currently serve generation
//! requests and turns them into an ordered candidate list.

use async_trait::async_trait;

use crate::errors::{GradeError, Result};
use crate::models::{ApiVersion, CandidateList, ModelCandidate, ModelDescriptor};
use crate::providers::ModelCatalog;

/// Anything that can hand the invoker an ordered candidate list.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self) -> Result<CandidateList>;

    /// Forget anything remembered so the next call re-resolves.
    fn invalidate(&self) {}
}

/// Probes namespaces in order and stops at the first one exposing usable models.
pub struct EndpointResolver<C> {
    catalog: C,
    api_versions: Vec<ApiVersion>,
    preferred_models: Vec<String>,
}

/// Generate-capable models found in the first usable namespace.
struct NamespaceMatch {
    api_version: ApiVersion,
    usable: Vec<String>,
}

impl<C: ModelCatalog> EndpointResolver<C> {
    pub fn new(catalog: C, api_versions: Vec<ApiVersion>, preferred_models: Vec<String>) -> Self {
        Self {
            catalog,
            api_versions,
            preferred_models,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Returns the single best (namespace, model) pair.
    pub async fn resolve_endpoint(&self) -> Result<ModelCandidate> {
        let found = self.first_usable_namespace().await?;
        Ok(self.ranked(&found).swap_remove(0))
    }

    /// The resolved pair first, followed by the other preferred models the same
    /// namespace can serve, in preference order.
    pub async fn resolve_candidates(&self) -> Result<CandidateList> {
        let found = self.first_usable_namespace().await?;
        CandidateList::new(self.ranked(&found))
    }

    async fn first_usable_namespace(&self) -> Result<NamespaceMatch> {
        let mut last_cause = "no API versions configured".to_string();

        for &api_version in &self.api_versions {
            let descriptors = match self.catalog.list_models(api_version).await {
                Ok(descriptors) => descriptors,
                Err(e) => {
                    log::warn!("⚠️  Listing models in {} failed: {}", api_version, e);
                    last_cause = format!("{}: {}", api_version, e);
                    continue;
                }
            };

            let usable = generation_capable(&descriptors);
            if usable.is_empty() {
                log::warn!("⚠️  {} exposes no generate-capable models", api_version);
                last_cause = format!("{}: no generate-capable models", api_version);
                continue;
            }

            log::info!("✅ {} exposes {} generate-capable models", api_version, usable.len());
            return Ok(NamespaceMatch {
                api_version,
                usable,
            });
        }

        Err(GradeError::EndpointUnavailable { cause: last_cause })
    }

    /// Preferred models present in the namespace, in preference order; if none
    /// are present, the namespace's first usable model alone.
    fn ranked(&self, found: &NamespaceMatch) -> Vec<ModelCandidate> {
        let preferred: Vec<ModelCandidate> = self
            .preferred_models
            .iter()
            .filter(|model| found.usable.contains(model))
            .map(|model| ModelCandidate::new(found.api_version, model.as_str()))
            .collect();

        if preferred.is_empty() {
            log::info!(
                "ℹ️  No preferred model in {}, falling back to {}",
                found.api_version,
                found.usable[0]
            );
            vec![ModelCandidate::new(found.api_version, found.usable[0].as_str())]
        } else {
            preferred
        }
    }
}

#[async_trait]
impl<C: ModelCatalog> CandidateSource for EndpointResolver<C> {
    async fn candidates(&self) -> Result<CandidateList> {
        self.resolve_candidates().await
    }
}

fn generation_capable(descriptors: &[ModelDescriptor]) -> Vec<String> {
    let mut usable: Vec<String> = Vec::new();
    for descriptor in descriptors.iter().filter(|d| d.can_generate()) {
        if !usable.contains(&descriptor.model_id) {
            usable.push(descriptor.model_id.clone());
        }
    }
    usable
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory catalog; namespaces missing from `listings` fail like a 403.
    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        pub listings: HashMap<ApiVersion, Vec<ModelDescriptor>>,
        pub calls: Mutex<Vec<ApiVersion>>,
    }

    impl FakeCatalog {
        pub fn with(mut self, version: ApiVersion, models: &[(&str, &[&str])]) -> Self {
            let descriptors = models
                .iter()
                .map(|(id, methods)| ModelDescriptor {
                    model_id: id.to_string(),
                    supported_methods: methods.iter().map(|m| m.to_string()).collect(),
                })
                .collect();
            self.listings.insert(version, descriptors);
            self
        }

        pub fn calls(&self) -> Vec<ApiVersion> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ModelCatalog for FakeCatalog {
        async fn list_models(&self, api_version: ApiVersion) -> Result<Vec<ModelDescriptor>> {
            self.calls.lock().unwrap().push(api_version);
            self.listings
                .get(&api_version)
                .cloned()
                .ok_or_else(|| GradeError::ApiError {
                    status: 403,
                    body: "permission denied".to_string(),
                })
        }
    }

    const GEN: &[&str] = &["generateContent", "countTokens"];
    const EMBED: &[&str] = &["embedContent"];

    fn resolver(catalog: FakeCatalog, preferred: &[&str]) -> EndpointResolver<FakeCatalog> {
        EndpointResolver::new(
            catalog,
            vec![ApiVersion::V1, ApiVersion::V1Beta],
            preferred.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn test_empty_namespace_falls_through_to_next() {
        let catalog = FakeCatalog::default()
            .with(ApiVersion::V1, &[])
            .with(ApiVersion::V1Beta, &[("modelX", GEN)]);
        let resolver = resolver(catalog, &["modelX"]);

        let candidate = resolver.resolve_endpoint().await.unwrap();
        assert_eq!(candidate, ModelCandidate::new(ApiVersion::V1Beta, "modelX"));
    }

    #[tokio::test]
    async fn test_preferred_match_stops_probing() {
        let catalog = FakeCatalog::default()
            .with(ApiVersion::V1, &[("modelB", GEN)])
            .with(ApiVersion::V1Beta, &[("modelA", GEN)]);
        let resolver = resolver(catalog, &["modelA", "modelB"]);

        let candidate = resolver.resolve_endpoint().await.unwrap();
        assert_eq!(candidate, ModelCandidate::new(ApiVersion::V1, "modelB"));
        assert_eq!(resolver.catalog.calls(), vec![ApiVersion::V1]);
    }

    #[tokio::test]
    async fn test_first_preferred_in_preference_order() {
        let catalog = FakeCatalog::default().with(
            ApiVersion::V1,
            &[("modelC", GEN), ("modelB", GEN), ("modelA", GEN)],
        );
        let resolver = resolver(catalog, &["modelA", "modelB"]);

        let list = resolver.resolve_candidates().await.unwrap();
        let ids: Vec<&str> = list.iter().map(|c| c.model_id.as_str()).collect();
        assert_eq!(ids, vec!["modelA", "modelB"]);
    }

    #[tokio::test]
    async fn test_no_preferred_match_uses_first_usable_model() {
        let catalog = FakeCatalog::default().with(
            ApiVersion::V1,
            &[("embedder", EMBED), ("gemini-pro", GEN), ("gemini-lite", GEN)],
        );
        let resolver = resolver(catalog, &["gemini-2.5-flash"]);

        let list = resolver.resolve_candidates().await.unwrap();
        assert_eq!(list.as_slice(), &[ModelCandidate::new(ApiVersion::V1, "gemini-pro")]);
        assert_eq!(resolver.catalog.calls(), vec![ApiVersion::V1]);
    }

    #[tokio::test]
    async fn test_namespace_without_generate_capability_is_skipped() {
        let catalog = FakeCatalog::default()
            .with(ApiVersion::V1, &[("embedder", EMBED)])
            .with(ApiVersion::V1Beta, &[("modelX", GEN)]);
        let resolver = resolver(catalog, &["modelX"]);

        let candidate = resolver.resolve_endpoint().await.unwrap();
        assert_eq!(candidate.api_version, ApiVersion::V1Beta);
    }

    #[tokio::test]
    async fn test_listing_failure_is_not_fatal() {
        let catalog = FakeCatalog::default().with(ApiVersion::V1Beta, &[("modelX", GEN)]);
        let resolver = resolver(catalog, &["modelX"]);

        let candidate = resolver.resolve_endpoint().await.unwrap();
        assert_eq!(candidate, ModelCandidate::new(ApiVersion::V1Beta, "modelX"));
        assert_eq!(resolver.catalog.calls(), vec![ApiVersion::V1, ApiVersion::V1Beta]);
    }

    #[tokio::test]
    async fn test_all_namespaces_exhausted_reports_last_cause() {
        let catalog = FakeCatalog::default().with(ApiVersion::V1, &[]);
        let resolver = resolver(catalog, &["modelX"]);

        let err = resolver.resolve_endpoint().await.unwrap_err();
        match err {
            GradeError::EndpointUnavailable { cause } => {
                assert!(cause.starts_with("v1beta: "), "unexpected cause: {}", cause);
                assert!(cause.contains("403"));
            }
            other => panic!("expected EndpointUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_namespaces_configured() {
        let resolver = EndpointResolver::new(FakeCatalog::default(), Vec::new(), vec!["m".to_string()]);
        let err = resolver.resolve_candidates().await.unwrap_err();
        assert!(matches!(err, GradeError::EndpointUnavailable { .. }));
    }
}
