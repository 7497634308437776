//! # metasearch
//!
//! Multi-engine web search by scraping public search engines directly —
//! no API keys, no external services.
//!
//! ## Design
//!
//! - Scrapes DuckDuckGo, Bing, Yahoo, Mojeek, Brave and Google using CSS
//!   selectors with per-field fallback chains on HTML responses
//! - Queries engines concurrently and isolates per-engine failures
//! - Pluggable result cache (in-memory or file-backed) with TTL
//! - Sliding-window rate limiting with adaptive backoff
//! - Block/captcha-page detection before any parsing happens
//! - User-Agent rotation, request jitter and optional proxy or
//!   unblocking-relay routing
//!
//! ## Quick start
//!
//! ```no_run
//! # async fn example() -> metasearch::Result<()> {
//! let results = metasearch::quick_search("rust programming", metasearch::SearchEngine::DuckDuckGo).await?;
//! for result in &results {
//!     println!("{}. {} — {}", result.position, result.title, result.url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! For multiple engines at once:
//!
//! ```no_run
//! # async fn example() -> metasearch::Result<()> {
//! let outcome = metasearch::search_all("rust programming", &Default::default()).await?;
//! for (engine, results) in &outcome.results {
//!     println!("{engine}: {} results", results.len());
//! }
//! for (engine, error) in &outcome.errors {
//!     println!("{engine} failed: {error}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod cache;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod limiter;
pub mod searcher;
pub mod types;

pub use cache::{FileCache, MemoryCache, SearchCache};
pub use config::{ClientConfig, SearchOptions};
pub use content::{visit, visit_default};
pub use dispatch::{search_all, MultiSearchOptions, MultiSearchOutcome};
pub use engine::EngineAdapter;
pub use error::{Result, SearchError};
pub use http::Fetcher;
pub use limiter::RateLimiter;
pub use searcher::Searcher;
pub use types::{PageContent, SearchEngine, SearchResult};

/// One-line search against a single engine with default options.
///
/// # Errors
///
/// Same as [`Searcher::search`].
pub async fn quick_search(query: &str, engine: SearchEngine) -> Result<Vec<SearchResult>> {
    Searcher::new(engine)?
        .search(query, &SearchOptions::default())
        .await
}

/// Identifiers of every engine this crate can query.
pub fn available_engines() -> Vec<&'static str> {
    SearchEngine::all().iter().map(|e| e.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_engines_lists_all_six() {
        let engines = available_engines();
        assert_eq!(engines.len(), 6);
        for name in ["google", "bing", "duckduckgo", "yahoo", "mojeek", "brave"] {
            assert!(engines.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn every_listed_engine_resolves_back() {
        for name in available_engines() {
            assert!(SearchEngine::from_name(name).is_ok());
        }
    }

    #[tokio::test]
    async fn search_all_rejects_invalid_client_config() {
        let options = MultiSearchOptions {
            client: ClientConfig {
                timeout_seconds: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = search_all("rust", &options).await.unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }
}
