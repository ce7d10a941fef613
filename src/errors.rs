// src/errors.rs
use thiserror::Error;

use crate::models::{CandidateFailure, ModelCandidate};

#[derive(Error, Debug)]
pub enum GradeError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("API returned an error: {0}")]
    ApiResponse(String),

    #[error("Unexpected response structure: {0}")]
    UnexpectedResponse(String),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration: {0} is not set")]
    ConfigurationMissing(String),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("No usable model endpoint found: {cause}")]
    EndpointUnavailable { cause: String },

    #[error("No model candidates to try")]
    NoCandidates,

    #[error("All {} model candidates failed", .attempts.len())]
    AllCandidatesFailed { attempts: Vec<CandidateFailure> },

    #[error("Received empty text response from model")]
    EmptyResponse,

    #[error("No JSON object found in model response")]
    NoJsonBlockFound { raw: String },

    #[error("Model response contained malformed JSON: {source}")]
    MalformedJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GradeError {
    /// Stable machine-readable name for the error, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GradeError::FileRead(_) => "FileRead",
            GradeError::TomlParse(_) => "TomlParse",
            GradeError::Request(_) => "Request",
            GradeError::ApiError { .. } => "ApiError",
            GradeError::ApiResponse(_) => "ApiResponse",
            GradeError::UnexpectedResponse(_) => "UnexpectedResponse",
            GradeError::Timeout { .. } => "Timeout",
            GradeError::Config(_) => "Config",
            GradeError::ConfigurationMissing(_) => "ConfigurationMissing",
            GradeError::InvalidSubmission(_) => "InvalidSubmission",
            GradeError::EndpointUnavailable { .. } => "EndpointUnavailable",
            GradeError::NoCandidates => "NoCandidates",
            GradeError::AllCandidatesFailed { .. } => "AllCandidatesFailed",
            GradeError::EmptyResponse => "EmptyResponse",
            GradeError::NoJsonBlockFound { .. } => "NoJsonBlockFound",
            GradeError::MalformedJson { .. } => "MalformedJson",
        }
    }

    /// The raw model text, for the extraction failures that have one.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            GradeError::NoJsonBlockFound { raw } | GradeError::MalformedJson { raw, .. } => {
                Some(raw)
            }
            _ => None,
        }
    }

    /// Per-candidate errors recorded before the invoker gave up.
    pub fn attempts(&self) -> Option<&[CandidateFailure]> {
        match self {
            GradeError::AllCandidatesFailed { attempts } => Some(attempts),
            _ => None,
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            GradeError::Timeout {
                seconds: timeout_secs,
            }
        } else {
            GradeError::Request(err)
        }
    }

    pub(crate) fn candidate_failure(candidate: &ModelCandidate, err: &GradeError) -> CandidateFailure {
        CandidateFailure {
            candidate: candidate.clone(),
            error: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GradeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiVersion;

    #[test]
    fn test_all_candidates_failed_message_counts_attempts() {
        let attempts = vec![
            CandidateFailure {
                candidate: ModelCandidate::new(ApiVersion::V1, "model-a"),
                error: "API request failed with status 500: boom".to_string(),
            },
            CandidateFailure {
                candidate: ModelCandidate::new(ApiVersion::V1Beta, "model-b"),
                error: "Request timed out after 30s".to_string(),
            },
        ];
        let err = GradeError::AllCandidatesFailed { attempts };
        assert_eq!(err.to_string(), "All 2 model candidates failed");
        assert_eq!(err.kind(), "AllCandidatesFailed");
        assert_eq!(err.attempts().map(|a| a.len()), Some(2));
        assert!(err.raw_text().is_none());
    }

    #[test]
    fn test_extraction_errors_keep_raw_text() {
        let err = GradeError::NoJsonBlockFound {
            raw: "no json here".to_string(),
        };
        assert_eq!(err.raw_text(), Some("no json here"));
        assert_eq!(err.kind(), "NoJsonBlockFound");

        let source = serde_json::from_str::<serde_json::Value>("{oops}").unwrap_err();
        let err = GradeError::MalformedJson {
            raw: "{oops}".to_string(),
            source,
        };
        assert_eq!(err.raw_text(), Some("{oops}"));
    }

    #[test]
    fn test_configuration_missing_names_the_variable() {
        let err = GradeError::ConfigurationMissing("GEMINI_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "Missing configuration: GEMINI_API_KEY is not set"
        );
    }
}
