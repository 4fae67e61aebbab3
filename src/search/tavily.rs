//! Tavily Client
//!
//! Web search through the Tavily search API (`POST /search`).
//!
//! ## Result handling
//!
//! - Each query returns at most `max_results` hits; the cap is sent to the API and
//!   enforced again client-side.
//! - A query with no hits yields an empty batch, not an error.
//! - Non-2xx responses surface as [`SearchError::Api`] with the provider's message.

use super::{SearchError, SearchProvider, SearchRequest, SearchResult, DEFAULT_MAX_CONCURRENCY};
use crate::config::SearchConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const TAVILY_API_BASE: &str = "https://api.tavily.com";

/// Results kept per query unless configured otherwise
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl FromStr for SearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(SearchDepth::Basic),
            "advanced" => Ok(SearchDepth::Advanced),
            other => Err(format!("unknown search depth: {}", other)),
        }
    }
}

// Request body for POST /search
#[derive(Serialize)]
struct TavilySearchBody<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: SearchDepth,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    include_domains: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    exclude_domains: &'a [String],
}

#[derive(Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f64>,
}

impl From<TavilyHit> for SearchResult {
    fn from(hit: TavilyHit) -> Self {
        SearchResult {
            title: hit.title,
            url: hit.url,
            content: hit.content,
            score: hit.score,
        }
    }
}

/// Tavily client for web search
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: usize,
    search_depth: SearchDepth,
    include_domains: Vec<String>,
    exclude_domains: Vec<String>,
    max_concurrency: usize,
}

impl TavilyClient {
    /// Create a new Tavily client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: TAVILY_API_BASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            search_depth: SearchDepth::Basic,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Configure client from config
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        if config.tavily_api_key.trim().is_empty() {
            return Err(SearchError::NoApiKey);
        }

        Ok(Self::new(config.tavily_api_key.clone())
            .with_base_url(config.api_url.clone())
            .with_max_results(config.max_results)
            .with_search_depth(config.search_depth)
            .with_domains(config.include_domains.clone(), config.exclude_domains.clone())
            .with_max_concurrency(config.max_concurrency))
    }

    /// Set maximum results per query
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn with_search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = depth;
        self
    }

    /// Point the client at another API root (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Restrict or exclude result domains
    pub fn with_domains(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.include_domains = include;
        self.exclude_domains = exclude;
        self
    }

    /// Set how many queries a batch keeps in flight
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

/// Pull a readable message out of a Tavily error body
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("detail")
                .and_then(|d| d.get("error").or(Some(d)))
                .or_else(|| v.get("error"))
        })
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        info!(query = %request.query, "Searching via Tavily");

        let body = TavilySearchBody {
            query: &request.query,
            max_results: self.max_results,
            search_depth: self.search_depth,
            include_answer: false,
            include_raw_content: false,
            include_images: false,
            include_domains: &self.include_domains,
            exclude_domains: &self.exclude_domains,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!(status = status.as_u16(), error = %message, "Tavily search failed");
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Raw Tavily response received");

        let parsed: TavilySearchResponse =
            serde_json::from_str(&text).map_err(|e| SearchError::ParseError(e.to_string()))?;

        let results: Vec<SearchResult> = parsed
            .results
            .into_iter()
            .take(self.max_results)
            .map(SearchResult::from)
            .collect();

        info!(count = results.len(), "Tavily search completed");
        Ok(results)
    }

    fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}
