//! Search Module
//!
//! Web search for the reflect-and-revise tools. The [`SearchProvider`] trait is the
//! seam between tool dispatch and whichever backend answers the queries; the
//! production backend is Tavily.

pub mod tavily;

pub use tavily::TavilyClient;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Requests kept in flight by [`SearchProvider::batch`] unless a provider says otherwise
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Search API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

/// A single query sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Page URL
    pub url: String,
    /// Extracted content snippet
    #[serde(default)]
    pub content: String,
    /// Relevance score, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query and return its (capped) result set
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError>;

    fn max_concurrency(&self) -> usize {
        DEFAULT_MAX_CONCURRENCY
    }

    /// Run several queries concurrently.
    ///
    /// The output has one entry per request, in request order. The first failure
    /// is returned as-is and the remaining requests are dropped.
    async fn batch(
        &self,
        requests: &[SearchRequest],
    ) -> Result<Vec<Vec<SearchResult>>, SearchError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        // Boxed futures are inert until polled, so building them up front stays lazy.
        let searches: Vec<_> = requests.iter().map(|request| self.search(request)).collect();

        stream::iter(searches)
            .buffered(self.max_concurrency().max(1))
            .try_collect()
            .await
    }
}
