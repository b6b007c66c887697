//! Search capability: trait + Tavily adapter.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Hard cap on results per search call, mirrored from the research contract.
pub const MAX_SEARCH_RESULTS: u32 = 10;

/// One ranked web result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Return up to `max_results` ranked results for `query`.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>>;
}

/// Tavily web search adapter.
pub struct TavilySearcher {
    api_key: String,
    http: reqwest::Client,
}

impl TavilySearcher {
    pub fn new(api_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-perspective-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            api_key: api_key.to_string(),
            http,
        }
    }
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest {
    api_key: String,
    query: String,
    max_results: u32,
    search_depth: String,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    title: String,
    content: String,
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let request = TavilySearchRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            max_results: max_results.min(MAX_SEARCH_RESULTS),
            search_depth: "basic".to_string(),
        };

        let response = self.http.post(TAVILY_API_URL).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("search API error ({status}): {error_text}"));
        }

        let body: TavilySearchResponse = response.json().await?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content.chars().take(500).collect(),
            })
            .collect())
    }
}

/// Best-effort host extraction for attributing a headline to an outlet.
pub fn source_from_url(url: &str) -> String {
    let rest = url
        .trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))
        .unwrap_or(url.trim());
    let host = rest.split('/').next().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        "Unknown".to_string()
    } else {
        host.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction_strips_scheme_and_path() {
        assert_eq!(
            source_from_url("https://www.reuters.com/world/some-story"),
            "reuters.com"
        );
        assert_eq!(source_from_url("http://bbc.co.uk"), "bbc.co.uk");
        assert_eq!(source_from_url(""), "Unknown");
    }
}
