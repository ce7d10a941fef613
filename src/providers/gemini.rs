// src/providers/gemini.rs

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

use crate::config::GeminiConfig;
use crate::errors::{GradeError, Result};
use crate::models::{ApiVersion, GradingRequest, ModelCandidate, ModelDescriptor};
use crate::providers::{LlmProvider, ModelCatalog};

/// Upper bound on `nextPageToken` hops when listing models.
pub const MAX_LISTING_PAGES: usize = 20;

/// A provider for interacting with Google's Gemini models.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    listing_timeout: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`.
    pub fn new(client: Client, config: GeminiConfig, listing_timeout: Duration) -> Self {
        Self {
            client,
            config,
            listing_timeout,
        }
    }

    fn base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    async fn fetch_model_page(
        &self,
        api_version: ApiVersion,
        page_token: Option<&str>,
    ) -> Result<ListModelsResponse> {
        let url = format!("{}/{}/models", self.base(), api_version);
        let mut query: Vec<(&str, &str)> = vec![("pageSize", "1000")];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(self.listing_timeout)
            .send()
            .await
            .map_err(|e| GradeError::from_transport(e, self.listing_timeout.as_secs()))?;

        let resp = check_status(resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GradeError::from_transport(e, self.listing_timeout.as_secs()))?;
        serde_json::from_slice::<ListModelsResponse>(&bytes)
            .map_err(|e| GradeError::UnexpectedResponse(format!("model listing: {}", e)))
    }
}

impl ModelCatalog for GeminiProvider {
    async fn list_models(&self, api_version: ApiVersion) -> Result<Vec<ModelDescriptor>> {
        log::debug!("📡 Listing Gemini models in {}", api_version);

        let mut descriptors = Vec::new();
        let mut page_token: Option<String> = None;

        for page_no in 1..=MAX_LISTING_PAGES {
            let page = self
                .fetch_model_page(api_version, page_token.as_deref())
                .await?;

            descriptors.extend(page.models.into_iter().map(|m| ModelDescriptor {
                model_id: m
                    .name
                    .strip_prefix("models/")
                    .unwrap_or(&m.name)
                    .to_string(),
                supported_methods: m.supported_generation_methods,
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(_) if page_no == MAX_LISTING_PAGES => {
                    log::warn!(
                        "⚠️  {} listing still paginated after {} pages, keeping {} models",
                        api_version,
                        MAX_LISTING_PAGES,
                        descriptors.len()
                    );
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("📥 {} lists {} models", api_version, descriptors.len());
        Ok(descriptors)
    }
}

impl LlmProvider for GeminiProvider {
    /// Calls the Gemini API with a given prompt and returns the model's response text.
    async fn generate(&self, candidate: &ModelCandidate, request: &GradingRequest) -> Result<String> {
        let url = format!(
            "{}/{}/models/{}:generateContent",
            self.base(),
            candidate.api_version,
            candidate.model_id
        );

        log::info!("📡 Calling Gemini: {} with model: {}", url, candidate.model_id);

        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": request.prompt_text}]}],
            "generationConfig": {"temperature": 0}
        });

        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(request.timeout())
            .json(&body)
            .send()
            .await
            .map_err(|e| GradeError::from_transport(e, request.timeout_seconds))?;

        let status = resp.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        log::info!("📥 Gemini response status: {} ({}ms)", status, latency_ms);

        let resp = check_status(resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GradeError::from_transport(e, request.timeout_seconds))?;
        let response_json: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| GradeError::UnexpectedResponse(e.to_string()))?;

        extract_generated_text(&response_json)
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let error_body = resp
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error body".to_string());
    Err(GradeError::ApiError {
        status: status.as_u16(),
        body: error_body,
    })
}

/// Pulls `candidates[0].content.parts[0].text` out of a generateContent envelope.
fn extract_generated_text(response_json: &serde_json::Value) -> Result<String> {
    if let Some(error) = response_json.get("error") {
        return Err(GradeError::ApiResponse(error.to_string()));
    }

    if let Some(reason) = response_json
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(GradeError::ApiResponse(format!("prompt blocked: {}", reason)));
    }

    response_json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| GradeError::UnexpectedResponse(response_json.to_string()))
}
