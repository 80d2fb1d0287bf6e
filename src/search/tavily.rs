use crate::agents::http::post_json;
use crate::search::SearchHit;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Web search through the Tavily API.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    api_key: String,
    timeout: Duration,
}

impl TavilyClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self { api_key, timeout }
    }

    fn request_body(&self, query: &str, max_results: usize, depth: &str) -> Value {
        json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": depth,
        })
    }

    pub async fn search(&self, query: &str, max_results: usize, depth: &str) -> Result<Vec<SearchHit>> {
        let response = post_json(
            TAVILY_SEARCH_URL.to_string(),
            Vec::new(),
            self.request_body(query, max_results, depth),
            self.timeout,
        )
        .await
        .context("Tavily search request failed")?;
        parse_results(&response, max_results)
    }
}

fn parse_results(response: &Value, max_results: usize) -> Result<Vec<SearchHit>> {
    let results = response["results"]
        .as_array()
        .context("Missing results array in Tavily response")?;

    Ok(results
        .iter()
        .take(max_results)
        .map(|result| SearchHit {
            content: result["content"].as_str().unwrap_or_default().to_string(),
            url: result["url"].as_str().unwrap_or("N/A").to_string(),
        })
        .collect())
}
