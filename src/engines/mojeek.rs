//! Mojeek adapter — independent index with plain, stable markup.

use scraper::Html;
use url::Url;

use super::{element_text, first_element, first_text, is_http_url, select_blocks, selectors};
use crate::config::SearchOptions;
use crate::engine::EngineAdapter;
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// Mojeek HTML results adapter.
pub struct MojeekAdapter;

impl EngineAdapter for MojeekAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Mojeek
    }

    fn base_url(&self) -> &'static str {
        "https://www.mojeek.com/search"
    }

    fn build_url(
        &self,
        base: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<String, SearchError> {
        let mut url = Url::parse(base)
            .map_err(|e| SearchError::Config(format!("invalid mojeek base URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("s", &options.start_offset().to_string());
        }
        Ok(url.into())
    }

    fn parse(&self, html: &str) -> Result<Vec<SearchResult>, SearchError> {
        let document = Html::parse_document(html);

        let block_chain = selectors(&["ul.results-standard li", "li.result", "div[class*='result'] li"])?;
        let link_chain = selectors(&["h2 a.title", "a.title", "h2 a", "a"])?;
        let desc_chain = selectors(&["p.s", "p"])?;

        let mut results = Vec::new();
        for block in select_blocks(&document, &block_chain) {
            let Some(link) = first_element(block, &link_chain) else {
                continue;
            };

            let title = element_text(link);
            let url = link.value().attr("href").unwrap_or_default().to_owned();
            if title.is_empty() || !is_http_url(&url) {
                continue;
            }

            let description = first_text(block, &desc_chain).unwrap_or_default();
            results.push(SearchResult::new(title, url, description));
        }

        tracing::debug!(count = results.len(), "mojeek results parsed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<ul class="results-standard">
<li>
  <h2><a class="title" href="https://www.rust-lang.org/">Rust Programming Language</a></h2>
  <p class="s">A language empowering everyone to build reliable and efficient software.</p>
</li>
<li>
  <h2><a class="title" href="https://doc.rust-lang.org/book/">The Rust Book</a></h2>
  <p class="s">An introductory book about Rust.</p>
</li>
<li>
  <h2><a class="title" href="/search?q=related">Related search</a></h2>
</li>
<li>
  <h2><a class="title" href="https://crates.io/">crates.io</a></h2>
</li>
</ul>
</body>
</html>"#;

    #[test]
    fn parse_extracts_results() {
        let results = MojeekAdapter.parse(MOCK_HTML).expect("should parse");
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert!(results[0].description.contains("reliable and efficient"));

        assert_eq!(results[2].url, "https://crates.io/");
        assert_eq!(results[2].description, "");
    }

    #[test]
    fn parse_skips_relative_links() {
        let results = MojeekAdapter.parse(MOCK_HTML).expect("should parse");
        assert!(results.iter().all(|r| !r.title.contains("Related search")));
    }

    #[test]
    fn parse_empty_page_returns_empty() {
        let results = MojeekAdapter
            .parse("<html><body></body></html>")
            .expect("should parse");
        assert!(results.is_empty());
    }

    #[test]
    fn build_url_offset_is_zero_based() {
        let opts = SearchOptions {
            page: 2,
            num_results: 10,
            ..Default::default()
        };
        let url = MojeekAdapter
            .build_url(MojeekAdapter.base_url(), "rust", &opts)
            .expect("should build");
        assert!(url.starts_with("https://www.mojeek.com/search?"));
        assert!(url.contains("q=rust"));
        assert!(url.contains("s=10"));
    }
}
