use crate::search::tavily::{SearchDepth, DEFAULT_MAX_RESULTS, TAVILY_API_BASE};
use crate::search::DEFAULT_MAX_CONCURRENCY;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub tavily_api_key: String,
    pub api_url: String,
    pub max_results: usize,
    pub search_depth: SearchDepth,
    pub max_concurrency: usize,
    pub include_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: String::new(),
            api_url: TAVILY_API_BASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            search_depth: SearchDepth::Basic,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "reflexion_tools=info".to_string(),
        }
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SearchConfig::default();

        let tavily_api_key = lookup("TAVILY_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("TAVILY_API_KEY must be set"))?;

        Ok(Self {
            search: SearchConfig {
                tavily_api_key,
                api_url: lookup("TAVILY_API_URL").unwrap_or(defaults.api_url),
                max_results: match lookup("SEARCH_MAX_RESULTS") {
                    Some(v) => v
                        .parse::<usize>()
                        .map_err(|e| anyhow!("invalid SEARCH_MAX_RESULTS {:?}: {}", v, e))?,
                    None => defaults.max_results,
                },
                search_depth: match lookup("SEARCH_DEPTH") {
                    Some(v) => v.parse::<SearchDepth>().map_err(|e| anyhow!(e))?,
                    None => defaults.search_depth,
                },
                max_concurrency: match lookup("SEARCH_MAX_CONCURRENCY") {
                    Some(v) => v
                        .parse::<usize>()
                        .map_err(|e| anyhow!("invalid SEARCH_MAX_CONCURRENCY {:?}: {}", v, e))?,
                    None => defaults.max_concurrency,
                },
                include_domains: split_list(lookup("SEARCH_INCLUDE_DOMAINS")),
                exclude_domains: split_list(lookup("SEARCH_EXCLUDE_DOMAINS")),
            },
            logging: LoggingConfig {
                filter: lookup("RUST_LOG").unwrap_or_else(|| LoggingConfig::default().filter),
            },
        })
    }
}
