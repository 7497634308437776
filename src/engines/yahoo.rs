//! Yahoo adapter — Bing-backed index behind Yahoo's own redirect wrapper.
//!
//! Result links route through `r.search.yahoo.com` with the destination
//! percent-encoded between `RU=` and `/RK=` markers.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;
use url::Url;

use super::{first_element, first_text, is_http_url, select_blocks, selectors};
use crate::config::SearchOptions;
use crate::engine::EngineAdapter;
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// Yahoo HTML results adapter.
pub struct YahooAdapter;

impl YahooAdapter {
    /// Extract the destination URL from Yahoo's redirect wrapper.
    ///
    /// Links look like `https://r.search.yahoo.com/…/RU=https%3a%2f%2fexample.com%2f/RK=2/RS=…`;
    /// the `RU` segment carries the percent-encoded destination. Direct
    /// links pass through unchanged.
    fn extract_url(href: &str) -> String {
        static RE: OnceLock<Option<Regex>> = OnceLock::new();
        let Some(re) = RE.get_or_init(|| Regex::new(r"RU=(.*?)/RK=").ok()) else {
            return href.to_owned();
        };

        if let Some(caps) = re.captures(href) {
            if let Some(encoded) = caps.get(1) {
                if let Ok(decoded) = urlencoding::decode(encoded.as_str()) {
                    return decoded.into_owned();
                }
            }
        }
        href.to_owned()
    }
}

impl EngineAdapter for YahooAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Yahoo
    }

    fn base_url(&self) -> &'static str {
        "https://search.yahoo.com/search"
    }

    fn build_url(
        &self,
        base: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<String, SearchError> {
        let mut url = Url::parse(base)
            .map_err(|e| SearchError::Config(format!("invalid yahoo base URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("p", query);
            pairs.append_pair("b", &(options.start_offset() + 1).to_string());
        }
        Ok(url.into())
    }

    fn parse(&self, html: &str) -> Result<Vec<SearchResult>, SearchError> {
        let document = Html::parse_document(html);

        let block_chain = selectors(&["div.dd.algo", "div[class*='algo']"])?;
        let link_chain = selectors(&["h3 a", "a"])?;
        let title_chain = selectors(&["h3"])?;
        let desc_chain = selectors(&["p"])?;

        let mut results = Vec::new();
        for block in select_blocks(&document, &block_chain) {
            let Some(link) = first_element(block, &link_chain) else {
                continue;
            };
            let Some(title) = first_text(block, &title_chain) else {
                continue;
            };

            let href = link.value().attr("href").unwrap_or_default();
            let url = Self::extract_url(href);
            if title.is_empty() || !is_http_url(&url) {
                continue;
            }

            let description = first_text(block, &desc_chain).unwrap_or_default();
            results.push(SearchResult::new(title, url, description));
        }

        tracing::debug!(count = results.len(), "yahoo results parsed");
        Ok(results)
    }
}
