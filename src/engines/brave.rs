//! Brave Search adapter — independent index, privacy-focused.
//!
//! Brave's markup uses generated class suffixes that change between
//! deployments, so every field goes through a substring-match fallback.

use scraper::Html;
use url::Url;

use super::{first_element, first_text, is_http_url, select_blocks, selectors};
use crate::config::SearchOptions;
use crate::engine::EngineAdapter;
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// Brave Search HTML results adapter.
pub struct BraveAdapter;

impl EngineAdapter for BraveAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Brave
    }

    fn base_url(&self) -> &'static str {
        "https://search.brave.com/search"
    }

    fn build_url(
        &self,
        base: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<String, SearchError> {
        let mut url = Url::parse(base)
            .map_err(|e| SearchError::Config(format!("invalid brave base URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("offset", &options.start_offset().to_string());
            pairs.append_pair("count", &options.num_results.to_string());
            if let Some(ref language) = options.language {
                pairs.append_pair("lang", language);
            }
        }
        Ok(url.into())
    }

    fn parse(&self, html: &str) -> Result<Vec<SearchResult>, SearchError> {
        let document = Html::parse_document(html);

        let block_chain = selectors(&[r#"div.snippet[data-type="web"]"#, "div.snippet"])?;
        let link_chain = selectors(&["a[class*='svelte'][href]", "a[href]"])?;
        let title_chain = selectors(&["div.title", "div[class*='title']"])?;
        let desc_chain = selectors(&[
            "div.snippet-description",
            "div[class*='snippet-description']",
            "div[class*='generic-snippet']",
            "div[class*='content']",
        ])?;

        let mut results = Vec::new();
        for block in select_blocks(&document, &block_chain) {
            let Some(link) = first_element(block, &link_chain) else {
                continue;
            };

            let url = link.value().attr("href").unwrap_or_default().to_owned();
            if url.is_empty() || url.starts_with('#') || url.contains("brave.com") {
                continue;
            }
            if !is_http_url(&url) {
                continue;
            }

            let Some(title) = first_text(block, &title_chain) else {
                continue;
            };

            let description = first_text(block, &desc_chain).unwrap_or_default();
            results.push(SearchResult::new(title, url, description));
        }

        tracing::debug!(count = results.len(), "brave results parsed");
        Ok(results)
    }
}
