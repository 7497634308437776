//! HTTP fetch layer: client construction, pacing, relay routing.
//!
//! A [`Fetcher`] owns one configured [`reqwest::Client`] with browser-like
//! headers, cookie support and a User-Agent fixed at construction time
//! (custom, or randomly drawn from a rotation pool). Every fetch first
//! defers to an optional [`RateLimiter`], then to the fetcher's own jittered
//! pacing delay, and maps HTTP block statuses to typed errors.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::config::ClientConfig;
use crate::error::SearchError;
use crate::limiter::RateLimiter;

/// Realistic browser User-Agent strings, one picked per fetcher.
pub(crate) const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Endpoint of the third-party unblocking relay.
const RELAY_ENDPOINT: &str = "http://api.scraperapi.com/";

/// Select a random User-Agent string from the rotation pool.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Issues paced, header-dressed GET requests and raises typed errors.
#[derive(Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout_seconds: u64,
    delay_ms: (u64, u64),
    relay_api_key: Option<String>,
    rate_limiter: Option<Arc<RateLimiter>>,
    last_request: Mutex<Option<Instant>>,
}

impl Fetcher {
    /// Build a fetcher from the given configuration.
    ///
    /// The client gets a cookie store (consent pages set cookies), the
    /// configured timeout, a redirect limit, browser Accept headers and a
    /// User-Agent fixed for the fetcher's lifetime. The proxy is skipped
    /// when the unblocking relay is configured — the relay fetches on our
    /// behalf, so direct proxying would be redundant.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an unparseable proxy URL and
    /// [`SearchError::Network`] when the client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, SearchError> {
        config.validate()?;

        let ua = match config.user_agent {
            Some(ref custom) => custom.clone(),
            None => random_user_agent().to_owned(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,id;q=0.8"),
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(ua)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10));

        if config.relay_api_key.is_none() {
            if let Some(ref proxy) = config.proxy {
                let proxy = reqwest::Proxy::all(proxy)
                    .map_err(|e| SearchError::Config(format!("invalid proxy URL: {e}")))?;
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| SearchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_seconds: config.timeout_seconds,
            delay_ms: config.request_delay_ms,
            relay_api_key: config.relay_api_key.clone(),
            rate_limiter: None,
            last_request: Mutex::new(None),
        })
    }

    /// Attach a rate limiter consulted before every request.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Route `url` through the unblocking relay when a credential is set.
    fn relay_url(&self, url: &str) -> String {
        match self.relay_api_key {
            Some(ref key) => format!(
                "{RELAY_ENDPOINT}?api_key={key}&url={}",
                urlencoding::encode(url)
            ),
            None => url.to_owned(),
        }
    }

    /// Sleep out the fetcher's own pacing delay with jitter, measured
    /// against this instance's previous request.
    async fn apply_delay(&self) {
        let (min_ms, max_ms) = self.delay_ms;
        let mut last = self.last_request.lock().await;

        if max_ms > 0 {
            let target_ms = if min_ms == max_ms {
                min_ms
            } else {
                rand::thread_rng().gen_range(min_ms..=max_ms)
            };
            let target = Duration::from_millis(target_ms);
            if let Some(prev) = *last {
                let elapsed = prev.elapsed();
                if elapsed < target {
                    sleep(target - elapsed).await;
                }
            }
        }

        *last = Some(Instant::now());
    }

    /// Fetch `url` and return the response body.
    ///
    /// Consults the rate limiter, applies the pacing delay, then issues
    /// the GET (through the relay when configured).
    ///
    /// # Errors
    ///
    /// - [`SearchError::Blocked`] on HTTP 403, or HTTP 429 (which also
    ///   triggers [`RateLimiter::backoff`]).
    /// - [`SearchError::Network`] on timeout, connection failure or any
    ///   other non-success status.
    pub async fn fetch(&self, url: &str) -> Result<String, SearchError> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
        self.apply_delay().await;

        let request_url = self.relay_url(url);
        tracing::trace!(url, relayed = self.relay_api_key.is_some(), "fetching");

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                if let Some(ref limiter) = self.rate_limiter {
                    limiter.backoff().await;
                }
                return Err(SearchError::Blocked(
                    "rate limited by search engine (HTTP 429)".into(),
                ));
            }
            StatusCode::FORBIDDEN => {
                return Err(SearchError::Blocked(
                    "blocked by search engine (HTTP 403)".into(),
                ));
            }
            status if !status.is_success() => {
                return Err(SearchError::Network(format!(
                    "request failed with status {status}"
                )));
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Network(format!("response read failed: {e}")))?;

        tracing::trace!(url, bytes = body.len(), "response received");
        Ok(body)
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> SearchError {
        if err.is_timeout() {
            SearchError::Network(format!(
                "request timeout after {}s",
                self.timeout_seconds
            ))
        } else if err.is_connect() {
            SearchError::Network(format!("connection error: {err}"))
        } else {
            SearchError::Network(format!("request failed: {err}"))
        }
    }
}
