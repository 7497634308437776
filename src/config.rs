//! Fetcher and per-call search configuration with sensible defaults.
//!
//! [`ClientConfig`] controls how requests are issued (user agent, proxy,
//! relay, timeout, pacing); [`SearchOptions`] controls a single search call
//! (page, result count, locale, safe search, cache use). Both validate
//! before use.

use crate::error::SearchError;

/// Configuration for the HTTP fetch layer.
///
/// Use [`Default::default()`] for polite-scraping defaults, or construct
/// with field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Custom User-Agent string. If `None`, one is picked at construction
    /// time from a built-in pool of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Proxy URL applied to all requests. Ignored when `relay_api_key`
    /// is set — the relay handles its own egress.
    pub proxy: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Random pacing delay range in milliseconds `(min, max)` applied
    /// between this fetcher's own requests, on top of any rate limiter.
    pub request_delay_ms: (u64, u64),
    /// Credential for the third-party unblocking relay. When set, requests
    /// are rewritten to route through the relay service.
    pub relay_api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            proxy: None,
            timeout_seconds: 30,
            request_delay_ms: (100, 500),
            relay_api_key: None,
        }
    }
}

impl ClientConfig {
    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] when `timeout_seconds` is zero or
    /// the delay range is inverted.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(SearchError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        Ok(())
    }
}

/// Options for a single search call.
///
/// Every field except `use_cache` participates in the cache key, so two
/// calls with identical options map to the same cache entry.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// 1-based result page.
    pub page: u32,
    /// Results requested per page. Drives URL construction and position
    /// stamping; engines may return fewer or more.
    pub num_results: usize,
    /// Language code hint (e.g. "en", "id") for engines that accept one.
    pub language: Option<String>,
    /// Country code hint (e.g. "US", "ID") for engines that accept one.
    pub country: Option<String>,
    /// Request safe-search filtering from engines that support it.
    pub safe_search: bool,
    /// Consult the attached cache before fetching.
    pub use_cache: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page: 1,
            num_results: 10,
            language: None,
            country: None,
            safe_search: true,
            use_cache: true,
        }
    }
}

impl SearchOptions {
    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] when `page` or `num_results` is zero.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.page == 0 {
            return Err(SearchError::Config("page must be greater than 0".into()));
        }
        if self.num_results == 0 {
            return Err(SearchError::Config(
                "num_results must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Zero-based offset of the first result on this page.
    pub fn start_offset(&self) -> usize {
        self.page.saturating_sub(1) as usize * self.num_results
    }
}
