pub mod tavily;

use crate::config::QaConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub url: String,
}

/// Web search collaborator. Failures are absorbed by the search step.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize, depth: &str) -> Result<Vec<SearchHit>>;
}

#[derive(Debug, Clone)]
pub enum SearchClient {
    Tavily(tavily::TavilyClient),
    /// Search turned off or no API key; every search fails.
    Disabled,
}

impl SearchClient {
    pub fn from_config(config: &QaConfig) -> Self {
        match config.search.api_key.as_deref() {
            Some(key) if config.search.is_active() => Self::Tavily(tavily::TavilyClient::new(
                key.to_string(),
                Duration::from_secs(config.request_timeout_secs),
            )),
            _ => Self::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Tavily(_))
    }
}

#[async_trait]
impl SearchProvider for SearchClient {
    async fn search(&self, query: &str, max_results: usize, depth: &str) -> Result<Vec<SearchHit>> {
        match self {
            Self::Tavily(client) => client.search(query, max_results, depth).await,
            Self::Disabled => anyhow::bail!("Web search is disabled (no TAVILY_API_KEY)"),
        }
    }
}
