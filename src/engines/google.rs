//! Google adapter — best result quality, most aggressive bot defence.
//!
//! Direct scraping reliably hits captchas and consent walls; production use
//! goes through the unblocking relay configured on the fetcher. Result
//! links may come wrapped as `/url?q=<encoded destination>&…`.

use scraper::Html;
use url::Url;

use super::{first_element, first_text, is_http_url, select_blocks, selectors};
use crate::config::SearchOptions;
use crate::engine::EngineAdapter;
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// Google HTML results adapter.
pub struct GoogleAdapter;

impl GoogleAdapter {
    /// Extract the destination URL from Google's `/url?q=…` wrapper.
    ///
    /// Direct `http(s)` links pass through; anything else is unresolvable.
    fn extract_url(href: &str) -> Option<String> {
        if let Some(stripped) = href.strip_prefix("/url?q=") {
            let encoded = stripped.split('&').next().unwrap_or(stripped);
            return urlencoding::decode(encoded).ok().map(|u| u.into_owned());
        }
        if is_http_url(href) {
            return Some(href.to_owned());
        }
        None
    }
}

impl EngineAdapter for GoogleAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Google
    }

    fn base_url(&self) -> &'static str {
        "https://www.google.com/search"
    }

    fn build_url(
        &self,
        base: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<String, SearchError> {
        let mut url = Url::parse(base)
            .map_err(|e| SearchError::Config(format!("invalid google base URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            // Google silently drops results; over-asking keeps a full page.
            pairs.append_pair("num", &(options.num_results + 2).to_string());
            pairs.append_pair("start", &options.start_offset().to_string());
            pairs.append_pair("safe", if options.safe_search { "active" } else { "off" });
            if let Some(ref language) = options.language {
                pairs.append_pair("hl", language);
            }
            if let Some(ref country) = options.country {
                pairs.append_pair("gl", country);
            }
        }
        Ok(url.into())
    }

    fn parse(&self, html: &str) -> Result<Vec<SearchResult>, SearchError> {
        let document = Html::parse_document(html);

        let block_chain = selectors(&["div.MjjYud", "div.ezO2md"])?;
        let link_chain = selectors(&["div.yuRUbf a[href]", "a[href]"])?;
        let title_chain = selectors(&["h3.LC20lb", "a span.CVA68e", "h3"])?;
        let desc_chain = selectors(&["div.VwiC3b", "span.FrIlee"])?;

        let mut results = Vec::new();
        for block in select_blocks(&document, &block_chain) {
            let Some(link) = first_element(block, &link_chain) else {
                continue;
            };
            let Some(title) = first_text(block, &title_chain) else {
                continue;
            };

            let href = link.value().attr("href").unwrap_or_default();
            let Some(url) = Self::extract_url(href) else {
                continue;
            };
            if !is_http_url(&url) || url.contains("google.com") {
                continue;
            }

            let description = first_text(block, &desc_chain).unwrap_or_default();
            results.push(SearchResult::new(title, url, description));
        }

        tracing::debug!(count = results.len(), "google results parsed");
        Ok(results)
    }
}
