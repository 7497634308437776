//! Uniform contract every search engine adapter implements.
//!
//! An adapter knows two pure things about its engine: how to build a
//! results-page URL from query parameters, and how to parse the returned
//! markup into structured results. Fetching, block detection, caching and
//! position stamping all live outside the adapter, so every engine goes
//! through the identical pipeline.
//!
//! The engine set is closed: [`SearchEngine::adapter`] maps each variant to
//! its static adapter instance, which doubles as the registry.

use crate::config::SearchOptions;
use crate::engines::{
    BingAdapter, BraveAdapter, DuckDuckGoAdapter, GoogleAdapter, MojeekAdapter, YahooAdapter,
};
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// A pluggable search engine adapter.
///
/// Implementations are stateless and object-safe; both operations are pure
/// functions of their inputs. Parse failures must surface as
/// [`SearchError::Parse`] — no scraper or URL error types leak through.
pub trait EngineAdapter: Send + Sync {
    /// Which engine this adapter speaks for.
    fn engine(&self) -> SearchEngine;

    /// The engine's production endpoint. Callers may substitute another
    /// base (test servers) when building URLs.
    fn base_url(&self) -> &'static str;

    /// Build the results-page URL for a query against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] when `base` is not a valid URL.
    fn build_url(
        &self,
        base: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<String, SearchError>;

    /// Parse a results page into unstamped results (position 0, empty
    /// engine name). Items lacking both a resolvable URL and a non-empty
    /// title are skipped; a missing description becomes an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Parse`] when the markup cannot be processed
    /// at all. An empty result list is not an error.
    fn parse(&self, html: &str) -> Result<Vec<SearchResult>, SearchError>;
}

impl SearchEngine {
    /// The static adapter for this engine.
    pub fn adapter(&self) -> &'static dyn EngineAdapter {
        match self {
            Self::DuckDuckGo => &DuckDuckGoAdapter,
            Self::Bing => &BingAdapter,
            Self::Yahoo => &YahooAdapter,
            Self::Mojeek => &MojeekAdapter,
            Self::Brave => &BraveAdapter,
            Self::Google => &GoogleAdapter,
        }
    }
}
