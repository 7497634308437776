//! DuckDuckGo adapter — HTML-only endpoint, most scraper-friendly.
//!
//! Uses `https://html.duckduckgo.com/html/`, which needs no JavaScript and
//! tolerates automated requests. Result links are wrapped in a redirect
//! (`//duckduckgo.com/l/?uddg=<encoded destination>`) that must be decoded,
//! and ad links are interleaved with organic results.

use scraper::Html;
use url::Url;

use super::{element_text, first_element, first_text, is_http_url, select_blocks, selectors};
use crate::config::SearchOptions;
use crate::engine::EngineAdapter;
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// Substrings marking a DuckDuckGo ad link.
const AD_PATTERNS: &[&str] = &[
    "duckduckgo.com/y.js",
    "ad_domain=",
    "ad_provider=",
    "ad_type=",
];

/// DuckDuckGo HTML results adapter.
pub struct DuckDuckGoAdapter;

impl DuckDuckGoAdapter {
    /// Extract the destination URL from DuckDuckGo's redirect wrapper.
    ///
    /// Links look like `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=…`;
    /// the `uddg` query parameter carries the percent-encoded destination.
    /// Direct links pass through unchanged.
    fn extract_url(href: &str) -> Option<String> {
        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_owned()
        };

        let parsed = Url::parse(&full_href).ok()?;
        if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        } else {
            Some(full_href)
        }
    }

    fn is_ad(href: &str) -> bool {
        AD_PATTERNS.iter().any(|p| href.contains(p))
    }
}

impl EngineAdapter for DuckDuckGoAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::DuckDuckGo
    }

    fn base_url(&self) -> &'static str {
        "https://html.duckduckgo.com/html/"
    }

    fn build_url(
        &self,
        base: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<String, SearchError> {
        let mut url = Url::parse(base)
            .map_err(|e| SearchError::Config(format!("invalid duckduckgo base URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("s", &options.start_offset().to_string());
            if let Some(ref country) = options.country {
                pairs.append_pair("kl", &country.to_lowercase());
            }
            if let Some(ref language) = options.language {
                pairs.append_pair("lang", language);
            }
            pairs.append_pair("kp", if options.safe_search { "1" } else { "-2" });
        }
        Ok(url.into())
    }

    fn parse(&self, html: &str) -> Result<Vec<SearchResult>, SearchError> {
        let document = Html::parse_document(html);

        let block_chain = selectors(&[
            ".result.results_links.results_links_deep:not(.result--ad)",
            ".web-result:not(.result--ad)",
            ".result:not(.result--ad)",
        ])?;
        let link_chain = selectors(&["a.result__a"])?;
        let snippet_chain = selectors(&[".result__snippet", "[class*='snippet']"])?;

        let mut results = Vec::new();
        for block in select_blocks(&document, &block_chain) {
            let Some(link) = first_element(block, &link_chain) else {
                continue;
            };

            let title = element_text(link);
            if title.is_empty() {
                continue;
            }

            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(url) = Self::extract_url(href) else {
                continue;
            };
            if Self::is_ad(href) || Self::is_ad(&url) || !is_http_url(&url) {
                continue;
            }

            let description = first_text(block, &snippet_chain).unwrap_or_default();
            results.push(SearchResult::new(title, url, description));
        }

        tracing::debug!(count = results.len(), "duckduckgo results parsed");
        Ok(results)
    }
}
