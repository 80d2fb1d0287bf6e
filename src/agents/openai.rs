use crate::agents::http::{bearer, join_url, post_json};
use crate::config::OpenAiConfig;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// Chat client for OpenAI or any OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    model: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: String, timeout: Duration) -> Self {
        Self {
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            api_key,
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str, temperature: f32) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        })
    }

    pub async fn chat(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = join_url(&self.base_url, "/chat/completions");
        let response = post_json(
            url,
            vec![bearer(&self.api_key)],
            self.request_body(prompt, temperature),
            self.timeout,
        )
        .await
        .with_context(|| format!("OpenAI chat request failed (model {})", self.model))?;
        extract_content(&response)
    }
}

fn extract_content(response: &Value) -> Result<String> {
    if let Some(message) = response["error"]["message"].as_str() {
        anyhow::bail!("OpenAI returned an error: {}", message);
    }
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .context("Missing choices[0].message.content in OpenAI response")?;
    if content.trim().is_empty() {
        anyhow::bail!("OpenAI returned an empty completion");
    }
    Ok(content.to_string())
}
