// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{GradeError, Result};

/// A versioned routing prefix of the Gemini REST surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V1Beta,
    V1Alpha,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V1Beta => "v1beta",
            ApiVersion::V1Alpha => "v1alpha",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(ApiVersion::V1),
            "v1beta" => Ok(ApiVersion::V1Beta),
            "v1alpha" => Ok(ApiVersion::V1Alpha),
            other => Err(GradeError::Config(format!("Unknown API version '{}'", other))),
        }
    }
}

/// A concrete (API version, model) pair eligible for a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub api_version: ApiVersion,
    pub model_id: String,
}

impl ModelCandidate {
    pub fn new(api_version: ApiVersion, model_id: impl Into<String>) -> Self {
        Self {
            api_version,
            model_id: model_id.into(),
        }
    }
}

impl fmt::Display for ModelCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version, self.model_id)
    }
}

/// Ordered, non-empty, duplicate-free sequence of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateList(Vec<ModelCandidate>);

impl CandidateList {
    /// Builds a list keeping the first occurrence of every candidate.
    /// Fails with `NoCandidates` when nothing is left.
    pub fn new(candidates: impl IntoIterator<Item = ModelCandidate>) -> Result<Self> {
        let mut unique: Vec<ModelCandidate> = Vec::new();
        for candidate in candidates {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        if unique.is_empty() {
            return Err(GradeError::NoCandidates);
        }
        Ok(Self(unique))
    }

    pub fn primary(&self) -> &ModelCandidate {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[ModelCandidate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelCandidate> {
        self.0.iter()
    }
}

/// A model as advertised by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub model_id: String,
    pub supported_methods: Vec<String>,
}

impl ModelDescriptor {
    pub const GENERATE_CONTENT: &'static str = "generateContent";

    pub fn can_generate(&self) -> bool {
        self.supported_methods
            .iter()
            .any(|m| m == Self::GENERATE_CONTENT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingRequest {
    pub prompt_text: String,
    pub timeout_seconds: u64,
}

impl GradingRequest {
    pub fn new(prompt_text: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            timeout_seconds,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Score and feedback recovered from the model output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GradingResult {
    pub score: f64,
    pub rubric: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvements: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub candidate: ModelCandidate,
    pub error: String,
}

/// Result of running one prompt across a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Success {
        raw_text: String,
        used_candidate: ModelCandidate,
        /// Candidates that failed before `used_candidate` answered.
        failed_attempts: Vec<CandidateFailure>,
    },
    Failure {
        errors: Vec<CandidateFailure>,
    },
}

impl InvocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Success { .. })
    }
}

/// What a UI shell submits for grading.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Submission {
    pub problem: String,
    pub answer: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default = "default_strictness")]
    pub strictness: u8,
    #[serde(default = "default_max_score")]
    pub max_score: u32,
}

fn default_strictness() -> u8 {
    3
}

fn default_max_score() -> u32 {
    10
}

impl Submission {
    pub fn validate(&self) -> Result<()> {
        if self.problem.trim().is_empty() {
            return Err(GradeError::InvalidSubmission(
                "problem statement is required".to_string(),
            ));
        }
        if self.answer.trim().is_empty() {
            return Err(GradeError::InvalidSubmission("answer is required".to_string()));
        }
        if !(1..=5).contains(&self.strictness) {
            return Err(GradeError::InvalidSubmission(format!(
                "strictness must be between 1 and 5, got {}",
                self.strictness
            )));
        }
        if self.max_score == 0 {
            return Err(GradeError::InvalidSubmission(
                "max_score must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error body returned by the HTTP surface.
#[derive(Serialize, Clone, Debug)]
pub struct ApiError {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<CandidateFailure>>,
}

impl From<&GradeError> for ApiError {
    fn from(err: &GradeError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
            raw_text: err.raw_text().map(str::to_string),
            attempts: err.attempts().map(<[CandidateFailure]>::to_vec),
        }
    }
}
