// src/config.rs
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::errors::{GradeError, Result};
use crate::models::ApiVersion;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_VERSIONS: &str = "v1,v1beta";
pub const DEFAULT_MODELS: &str = "gemini-2.5-flash,gemini-1.5-flash,gemini-1.5-pro";
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LISTING_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CANDIDATE_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
    /// Namespaces probed in this order.
    pub api_versions: Vec<ApiVersion>,
    /// Preferred model ids, best first.
    pub models: Vec<String>,
}

/// High-level application configuration loaded from environment variables,
/// optionally layered over a TOML file named by `GRADER_CONFIG`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub generation_timeout_secs: u64,
    pub listing_timeout_secs: u64,
    /// Zero disables candidate caching.
    pub candidate_cache_ttl_secs: u64,
    pub bind_addr: String,
    /// Overrides the built-in grading prompt when set.
    pub prompt_template: Option<String>,
}

/// Shape of the optional TOML config file. The API key is never read from it.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct FileConfig {
    #[serde(default)]
    pub gemini: FileGeminiConfig,
    #[serde(default)]
    pub grading: FileGradingConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct FileGeminiConfig {
    pub api_base: Option<String>,
    pub api_versions: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct FileGradingConfig {
    pub prompt_template: Option<String>,
    pub generation_timeout_secs: Option<u64>,
    pub listing_timeout_secs: Option<u64>,
    pub candidate_cache_ttl_secs: Option<u64>,
    pub bind_addr: Option<String>,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match non_blank(lookup("GRADER_CONFIG")) {
            Some(path) => {
                log::info!("📄 Loading grader config from {}", path);
                FileConfig::load(&path)?
            }
            None => FileConfig::default(),
        };
        Self::from_sources(lookup, file)
    }

    /// Defaults, then `file`, then variables from `lookup`.
    pub fn from_sources(lookup: impl Fn(&str) -> Option<String>, file: FileConfig) -> Result<Self> {
        let api_key = non_blank(lookup("GEMINI_API_KEY"))
            .ok_or_else(|| GradeError::ConfigurationMissing("GEMINI_API_KEY".to_string()))?;

        let api_base = non_blank(lookup("GEMINI_API_BASE"))
            .or(file.gemini.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Each list remembers where it came from so an empty one is reported there.
        let (version_names, versions_source) = match non_blank(lookup("GEMINI_API_VERSIONS")) {
            Some(s) => (split_list(&s), "GEMINI_API_VERSIONS"),
            None => match file.gemini.api_versions {
                Some(v) => (trimmed(v), "[gemini] api_versions in the config file"),
                None => (split_list(DEFAULT_API_VERSIONS), "default API versions"),
            },
        };
        let api_versions = version_names
            .iter()
            .map(|v| v.parse::<ApiVersion>())
            .collect::<Result<Vec<_>>>()?;
        if api_versions.is_empty() {
            return Err(GradeError::Config(format!("{} is empty", versions_source)));
        }

        let (models, models_source) = match non_blank(lookup("GEMINI_MODELS")) {
            Some(s) => (split_list(&s), "GEMINI_MODELS"),
            None => match file.gemini.models {
                Some(m) => (trimmed(m), "[gemini] models in the config file"),
                None => (split_list(DEFAULT_MODELS), "default models"),
            },
        };
        if models.is_empty() {
            return Err(GradeError::Config(format!("{} is empty", models_source)));
        }

        let grading = file.grading;
        let generation_timeout_secs = parse_secs(
            &lookup,
            "GRADER_GENERATION_TIMEOUT_SECS",
            grading.generation_timeout_secs.unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
        )?;
        let listing_timeout_secs = parse_secs(
            &lookup,
            "GRADER_LISTING_TIMEOUT_SECS",
            grading.listing_timeout_secs.unwrap_or(DEFAULT_LISTING_TIMEOUT_SECS),
        )?;
        let candidate_cache_ttl_secs = parse_secs(
            &lookup,
            "GRADER_CANDIDATE_CACHE_TTL_SECS",
            grading.candidate_cache_ttl_secs.unwrap_or(DEFAULT_CANDIDATE_CACHE_TTL_SECS),
        )?;
        if generation_timeout_secs == 0 || listing_timeout_secs == 0 {
            return Err(GradeError::Config("timeouts must be greater than zero".to_string()));
        }

        let bind_addr = non_blank(lookup("GRADER_BIND"))
            .or(grading.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(AppConfig {
            gemini: GeminiConfig {
                api_base,
                api_key,
                api_versions,
                models,
            },
            generation_timeout_secs,
            listing_timeout_secs,
            candidate_cache_ttl_secs,
            bind_addr,
            prompt_template: grading.prompt_template,
        })
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn candidate_cache_ttl(&self) -> Option<Duration> {
        (self.candidate_cache_ttl_secs > 0).then(|| Duration::from_secs(self.candidate_cache_ttl_secs))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn trimmed(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match non_blank(lookup(key)) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| GradeError::Config(format!("{} must be a whole number of seconds, got '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")])).unwrap();

        assert_eq!(config.gemini.api_key, "secret");
        assert_eq!(config.gemini.api_base, DEFAULT_API_BASE);
        assert_eq!(config.gemini.api_versions, vec![ApiVersion::V1, ApiVersion::V1Beta]);
        assert_eq!(
            config.gemini.models,
            vec!["gemini-2.5-flash", "gemini-1.5-flash", "gemini-1.5-pro"]
        );
        assert_eq!(config.generation_timeout_secs, 30);
        assert_eq!(config.listing_timeout_secs, 15);
        assert_eq!(config.candidate_cache_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert!(config.prompt_template.is_none());
    }

    #[test]
    fn test_missing_api_key_is_configuration_missing() {
        let err = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, GradeError::ConfigurationMissing(ref key) if key == "GEMINI_API_KEY"));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_API_BASE", "http://localhost:9999"),
            ("GEMINI_API_VERSIONS", "v1beta"),
            ("GEMINI_MODELS", " model-x , ,model-y "),
            ("GRADER_GENERATION_TIMEOUT_SECS", "5"),
            ("GRADER_CANDIDATE_CACHE_TTL_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.gemini.api_base, "http://localhost:9999");
        assert_eq!(config.gemini.api_versions, vec![ApiVersion::V1Beta]);
        assert_eq!(config.gemini.models, vec!["model-x", "model-y"]);
        assert_eq!(config.generation_timeout_secs, 5);
        assert_eq!(config.candidate_cache_ttl(), None);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let bad_version = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_API_VERSIONS", "v1,v9"),
        ]));
        assert!(matches!(bad_version, Err(GradeError::Config(_))));

        let bad_timeout = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GRADER_LISTING_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(bad_timeout, Err(GradeError::Config(_))));

        let zero_timeout = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GRADER_GENERATION_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(zero_timeout, Err(GradeError::Config(_))));
    }

    #[test]
    fn test_file_config_layered_under_env() {
        let file = FileConfig::parse(
            r#"
[gemini]
api_versions = ["v1beta", "v1"]
models = ["gemini-1.5-pro"]

[grading]
generation_timeout_secs = 45
prompt_template = "Grade {{answer}}"
"#,
        )
        .unwrap();

        let config = AppConfig::from_sources(
            lookup_from(&[("GEMINI_API_KEY", "k"), ("GEMINI_MODELS", "from-env")]),
            file,
        )
        .unwrap();

        assert_eq!(config.gemini.api_versions, vec![ApiVersion::V1Beta, ApiVersion::V1]);
        assert_eq!(config.gemini.models, vec!["from-env"]);
        assert_eq!(config.generation_timeout_secs, 45);
        assert_eq!(config.prompt_template.as_deref(), Some("Grade {{answer}}"));
    }

    #[test]
    fn test_empty_lists_name_their_source() {
        let from_env = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODELS", " , "),
        ]))
        .unwrap_err();
        assert_eq!(from_env.to_string(), "Configuration error: GEMINI_MODELS is empty");

        let file = FileConfig::parse("[gemini]\nmodels = [\"\", \"  \"]\n").unwrap();
        let from_file =
            AppConfig::from_sources(lookup_from(&[("GEMINI_API_KEY", "k")]), file).unwrap_err();
        assert_eq!(
            from_file.to_string(),
            "Configuration error: [gemini] models in the config file is empty"
        );

        let file = FileConfig::parse("[gemini]\napi_versions = []\n").unwrap();
        let from_file =
            AppConfig::from_sources(lookup_from(&[("GEMINI_API_KEY", "k")]), file).unwrap_err();
        assert_eq!(
            from_file.to_string(),
            "Configuration error: [gemini] api_versions in the config file is empty"
        );
    }

    #[test]
    fn test_unreadable_config_file_is_reported() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GRADER_CONFIG", "/definitely/not/here/grader.toml"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GradeError::FileRead(_)));
    }
}
