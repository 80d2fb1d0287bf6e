use crate::agents::http::{join_url, post_json};
use crate::config::OllamaConfig;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// Chat client for a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, timeout: Duration) -> Self {
        Self {
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builds the `/api/chat` request. Temperature zero asks for JSON output.
    fn request_body(&self, prompt: &str, temperature: f32) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "options": { "temperature": temperature },
        });
        if temperature <= 0.0 {
            body["format"] = json!("json");
        }
        body
    }

    pub async fn chat(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = join_url(&self.base_url, "/api/chat");
        let response = post_json(
            url,
            Vec::new(),
            self.request_body(prompt, temperature),
            self.timeout,
        )
        .await
        .with_context(|| format!("Ollama chat request failed (model {})", self.model))?;
        extract_content(&response)
    }
}

fn extract_content(response: &Value) -> Result<String> {
    if let Some(error) = response["error"].as_str() {
        anyhow::bail!("Ollama returned an error: {}", error);
    }
    let content = response["message"]["content"]
        .as_str()
        .context("Missing message.content in Ollama response")?;
    if content.trim().is_empty() {
        anyhow::bail!("Ollama returned an empty completion");
    }
    Ok(content.to_string())
}
