//! Per-engine search pipeline.
//!
//! A [`Searcher`] binds one engine adapter to a fetcher and an optional
//! cache, and runs the full pipeline for each call: cache lookup → build
//! URL → fetch → block check → parse → position/engine stamping → cache
//! write. It recovers from nothing — network, parse and block errors
//! surface to the caller unchanged; retry and isolation policy live in
//! [`crate::dispatch`].

use std::sync::{Arc, Mutex};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::block::detect_block;
use crate::cache::SearchCache;
use crate::config::{ClientConfig, SearchOptions};
use crate::error::SearchError;
use crate::http::Fetcher;
use crate::limiter::RateLimiter;
use crate::types::{SearchEngine, SearchResult};

/// Cache-key view of the parameters that shape a result page.
///
/// Field order is fixed, so serialization is canonical and the digest is
/// order-independent with respect to how callers assembled the options.
#[derive(Serialize)]
struct KeyParams<'a> {
    page: u32,
    num_results: usize,
    language: Option<&'a str>,
    country: Option<&'a str>,
    safe_search: bool,
}

/// Single-engine search orchestrator.
pub struct Searcher {
    engine: SearchEngine,
    fetcher: Fetcher,
    cache: Option<Arc<dyn SearchCache>>,
    base_url: Option<String>,
    last_results: Mutex<Vec<SearchResult>>,
    last_html: Mutex<String>,
}

impl Searcher {
    /// Create a searcher for `engine` with default fetch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Network`] when the HTTP client cannot be
    /// constructed.
    pub fn new(engine: SearchEngine) -> Result<Self, SearchError> {
        Self::with_config(engine, &ClientConfig::default())
    }

    /// Create a searcher with explicit fetch configuration.
    ///
    /// # Errors
    ///
    /// Same as [`Searcher::new`], plus [`SearchError::Config`] for an
    /// invalid configuration.
    pub fn with_config(engine: SearchEngine, config: &ClientConfig) -> Result<Self, SearchError> {
        Ok(Self {
            engine,
            fetcher: Fetcher::new(config)?,
            cache: None,
            base_url: None,
            last_results: Mutex::new(Vec::new()),
            last_html: Mutex::new(String::new()),
        })
    }

    /// Attach a result cache consulted and written by [`search`].
    ///
    /// [`search`]: Searcher::search
    pub fn with_cache(mut self, cache: Arc<dyn SearchCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a rate limiter consulted before every fetch. Limiters are
    /// per-searcher; sharing one across engines couples their pacing.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.fetcher = self.fetcher.with_rate_limiter(limiter);
        self
    }

    /// Override the engine's endpoint, e.g. to point at a test server.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    /// The engine this searcher queries.
    pub fn engine(&self) -> SearchEngine {
        self.engine
    }

    fn cache_key(&self, query: &str, options: &SearchOptions) -> String {
        let params = KeyParams {
            page: options.page,
            num_results: options.num_results,
            language: options.language.as_deref(),
            country: options.country.as_deref(),
            safe_search: options.safe_search,
        };
        let canonical = serde_json::to_string(&params).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(self.engine.name().as_bytes());
        hasher.update(b":");
        hasher.update(query.as_bytes());
        hasher.update(b":");
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Run one search through the full pipeline.
    ///
    /// With `use_cache` set and a cache attached, a live entry for the
    /// same engine/query/parameters is returned without any network I/O.
    /// Cache writes are best-effort: a failing backend is logged at warn
    /// level and never fails the search.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Config`] for invalid options.
    /// - [`SearchError::Network`] / [`SearchError::Blocked`] from the fetch.
    /// - [`SearchError::Blocked`] when the response matches a block signature.
    /// - [`SearchError::Parse`] when the markup cannot be processed.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        options.validate()?;

        let cache_key = self.cache_key(query, options);
        if options.use_cache {
            if let Some(ref cache) = self.cache {
                if let Some(cached) = cache.get(&cache_key).await {
                    tracing::debug!(engine = %self.engine, "cache hit");
                    return Ok(cached);
                }
            }
        }

        let adapter = self.engine.adapter();
        let base = self.base_url.as_deref().unwrap_or_else(|| adapter.base_url());
        let url = adapter.build_url(base, query, options)?;

        tracing::trace!(engine = %self.engine, query, "searching");
        let html = self.fetcher.fetch(&url).await?;
        *self.lock_html() = html.clone();

        if let Some(reason) = detect_block(&html) {
            return Err(SearchError::Blocked(reason.to_owned()));
        }

        let mut results = adapter.parse(&html)?;
        let offset = options.start_offset();
        for (i, result) in results.iter_mut().enumerate() {
            result.position = (offset + i + 1) as u32;
            result.engine = self.engine.name().to_owned();
        }

        *self.lock_results() = results.clone();

        if let Some(ref cache) = self.cache {
            if let Err(err) = cache.set(&cache_key, &results).await {
                tracing::warn!(engine = %self.engine, error = %err, "cache write failed");
            }
        }

        Ok(results)
    }

    /// Results of the most recent non-cached search. Overwritten by the
    /// next successful call.
    pub fn last_results(&self) -> Vec<SearchResult> {
        self.lock_results().clone()
    }

    /// Raw markup of the most recent fetch, retained even when the call
    /// then failed on a block signature or parse error.
    pub fn last_html(&self) -> String {
        self.lock_html().clone()
    }

    /// Retained results whose title or description contains `keyword`
    /// (case-insensitive).
    pub fn filter_by_keyword(&self, keyword: &str) -> Vec<SearchResult> {
        let needle = keyword.to_lowercase();
        self.lock_results()
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Retained results whose URL contains `domain` (case-insensitive).
    pub fn filter_by_domain(&self, domain: &str) -> Vec<SearchResult> {
        let needle = domain.to_lowercase();
        self.lock_results()
            .iter()
            .filter(|r| r.url.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// At most the first `count` retained results.
    pub fn limit_results(&self, count: usize) -> Vec<SearchResult> {
        self.lock_results().iter().take(count).cloned().collect()
    }

    /// Retained results as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Parse`] when encoding fails.
    pub fn to_json(&self) -> Result<String, SearchError> {
        serde_json::to_string_pretty(&*self.lock_results())
            .map_err(|e| SearchError::Parse(format!("failed to encode results: {e}")))
    }

    fn lock_results(&self) -> std::sync::MutexGuard<'_, Vec<SearchResult>> {
        self.last_results.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_html(&self) -> std::sync::MutexGuard<'_, String> {
        self.last_html.lock().unwrap_or_else(|e| e.into_inner())
    }
}
