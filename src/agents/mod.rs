pub mod http;
pub mod ollama;
pub mod openai;

use crate::config::{Provider, QaConfig};
use crate::errors::QaError;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Text-in, text-out language model.
///
/// Timeouts belong to the implementation; callers only see success or failure.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Model identifier for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub enum ModelClient {
    Ollama(ollama::OllamaClient),
    OpenAi(openai::OpenAiClient),
}

impl ModelClient {
    pub fn from_config(config: &QaConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        match config.provider {
            Provider::Ollama => Ok(Self::Ollama(ollama::OllamaClient::new(
                &config.ollama,
                timeout,
            ))),
            Provider::OpenAi => {
                let api_key = config.openai.api_key.clone().ok_or_else(|| {
                    QaError::configuration("Missing OPENAI_API_KEY for OpenAI provider")
                })?;
                Ok(Self::OpenAi(openai::OpenAiClient::new(
                    &config.openai,
                    api_key,
                    timeout,
                )))
            }
        }
    }
}

#[async_trait]
impl LanguageModel for ModelClient {
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String> {
        match self {
            Self::Ollama(client) => client.chat(prompt, temperature).await,
            Self::OpenAi(client) => client.chat(prompt, temperature).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Ollama(client) => client.model(),
            Self::OpenAi(client) => client.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_client_from_config_ollama() {
        let client = ModelClient::from_config(&QaConfig::default()).unwrap();
        assert!(matches!(client, ModelClient::Ollama(_)));
        assert_eq!(client.name(), "qwen3:4b");
    }

    #[test]
    fn test_model_client_from_config_openai() {
        let mut config = QaConfig {
            provider: Provider::OpenAi,
            ..QaConfig::default()
        };
        config.openai.api_key = Some("sk-test".to_string());
        let client = ModelClient::from_config(&config).unwrap();
        assert!(matches!(client, ModelClient::OpenAi(_)));
        assert_eq!(client.name(), "gpt-4o-mini");
    }

    #[test]
    fn test_model_client_openai_requires_key() {
        let config = QaConfig {
            provider: Provider::OpenAi,
            ..QaConfig::default()
        };
        assert!(ModelClient::from_config(&config).is_err());
    }
}
