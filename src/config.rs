use crate::errors::QaError;
use crate::qa_paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PROVIDER: &str = "LLM_PROVIDER";
pub const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_TAVILY_API_KEY: &str = "TAVILY_API_KEY";
pub const ENV_SEARCH_ENABLED: &str = "QA_SEARCH_ENABLED";

/// Highest sampling temperature accepted by the supported providers.
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ollama,
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:4b".to_string(),
            base_url: "http://localhost:11434".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub enabled: bool,
    pub max_results: usize,
    pub depth: String,
    /// Only ever read from the environment. Search is disabled without it.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_results: 3,
            depth: "advanced".to_string(),
            api_key: None,
        }
    }
}

impl SearchConfig {
    /// True when searches will actually reach the provider.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Sampling temperatures for the three kinds of model call.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Answer generation.
    pub creative: f32,
    /// Evaluation. Zero also requests structured output where supported.
    pub deterministic: f32,
    /// Final polish.
    pub polish: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            creative: 0.7,
            deterministic: 0.0,
            polish: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct QaConfig {
    pub provider: Provider,
    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
    pub search: SearchConfig,
    pub sampling: SamplingConfig,
    pub max_iterations: u32,
    pub request_timeout_secs: u64,
    pub memory_dir: Option<PathBuf>,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
            search: SearchConfig::default(),
            sampling: SamplingConfig::default(),
            max_iterations: 3,
            request_timeout_secs: 120,
            memory_dir: None,
        }
    }
}

impl QaConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        Ok(config)
    }

    /// Loads the explicit config, else `~/.qa-agent/config.yaml` if present,
    /// else defaults; then applies the process environment and validates.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = qa_paths::config_path()?;
                if default_path.exists() {
                    Self::load(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = non_empty(ENV_PROVIDER) {
            self.provider = Provider::parse(&value).ok_or_else(|| {
                QaError::configuration(format!(
                    "Unknown {} '{}' (expected 'ollama' or 'openai')",
                    ENV_PROVIDER, value
                ))
            })?;
        }
        if let Some(value) = non_empty(ENV_OLLAMA_MODEL) {
            self.ollama.model = value;
        }
        if let Some(value) = non_empty(ENV_OLLAMA_BASE_URL) {
            self.ollama.base_url = value;
        }
        if let Some(value) = non_empty(ENV_OPENAI_MODEL) {
            self.openai.model = value;
        }
        if let Some(value) = non_empty(ENV_OPENAI_BASE_URL) {
            self.openai.base_url = value;
        }
        self.openai.api_key = non_empty(ENV_OPENAI_API_KEY);
        self.search.api_key = non_empty(ENV_TAVILY_API_KEY);
        if let Some(value) = non_empty(ENV_SEARCH_ENABLED) {
            match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.search.enabled = true,
                "0" | "false" | "no" | "off" => self.search.enabled = false,
                other => tracing::warn!(
                    "Ignoring unrecognised {} value '{}'",
                    ENV_SEARCH_ENABLED,
                    other
                ),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let (model, base_url) = match self.provider {
            Provider::Ollama => (&self.ollama.model, &self.ollama.base_url),
            Provider::OpenAi => (&self.openai.model, &self.openai.base_url),
        };

        if model.trim().is_empty() {
            return Err(QaError::configuration(format!(
                "No model configured for provider '{}'",
                self.provider.as_str()
            ))
            .into());
        }
        if base_url.trim().is_empty() {
            return Err(QaError::configuration(format!(
                "No base URL configured for provider '{}'",
                self.provider.as_str()
            ))
            .into());
        }
        if self.provider == Provider::OpenAi && self.openai.api_key.is_none() {
            return Err(QaError::configuration(format!(
                "Missing {} for OpenAI provider",
                ENV_OPENAI_API_KEY
            ))
            .into());
        }
        if self.max_iterations == 0 {
            return Err(QaError::configuration("max_iterations must be at least 1").into());
        }
        for (name, value) in [
            ("creative", self.sampling.creative),
            ("deterministic", self.sampling.deterministic),
            ("polish", self.sampling.polish),
        ] {
            if !(0.0..=MAX_TEMPERATURE).contains(&value) {
                return Err(QaError::configuration(format!(
                    "sampling.{} must be between 0 and {}, got {}",
                    name, MAX_TEMPERATURE, value
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Directory holding `sessions.json` and exported sessions.
    pub fn memory_dir(&self) -> Result<PathBuf> {
        match &self.memory_dir {
            Some(dir) => Ok(dir.clone()),
            None => qa_paths::memory_dir(),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
