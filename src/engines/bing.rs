//! Bing adapter — Microsoft's index, works without a proxy.

use scraper::Html;
use url::Url;

use super::{element_text, first_element, first_text, select_blocks, selectors};
use crate::config::SearchOptions;
use crate::engine::EngineAdapter;
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// Bing HTML results adapter.
pub struct BingAdapter;

impl EngineAdapter for BingAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Bing
    }

    fn base_url(&self) -> &'static str {
        "https://www.bing.com/search"
    }

    fn build_url(
        &self,
        base: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<String, SearchError> {
        let mut url = Url::parse(base)
            .map_err(|e| SearchError::Config(format!("invalid bing base URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("first", &(options.start_offset() + 1).to_string());
            // Bing trims trailing results; asking for two extra keeps a
            // full page after it drops some.
            pairs.append_pair("count", &(options.num_results + 2).to_string());
            if let Some(ref language) = options.language {
                pairs.append_pair("setlang", language);
            }
            if let Some(ref country) = options.country {
                pairs.append_pair("cc", country);
            }
            pairs.append_pair(
                "safeSearch",
                if options.safe_search { "Strict" } else { "Off" },
            );
        }
        Ok(url.into())
    }

    fn parse(&self, html: &str) -> Result<Vec<SearchResult>, SearchError> {
        let document = Html::parse_document(html);

        let block_chain = selectors(&["li.b_algo"])?;
        let link_chain = selectors(&["h2 a"])?;
        let desc_chain = selectors(&["div.b_caption p", "div.b_caption", "p"])?;

        let mut results = Vec::new();
        for block in select_blocks(&document, &block_chain) {
            let Some(link) = first_element(block, &link_chain) else {
                continue;
            };

            let title = element_text(link);
            let url = link.value().attr("href").unwrap_or_default().to_owned();
            if title.is_empty() || url.is_empty() {
                continue;
            }

            let description = first_text(block, &desc_chain).unwrap_or_default();
            results.push(SearchResult::new(title, url, description));
        }

        tracing::debug!(count = results.len(), "bing results parsed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<ol id="b_results">
<li class="b_algo">
  <h2><a href="https://www.rust-lang.org/" h="ID=SERP">Rust Programming Language</a></h2>
  <div class="b_caption"><p>A language empowering everyone to build reliable and efficient software.</p></div>
</li>
<li class="b_algo">
  <h2><a href="https://doc.rust-lang.org/book/" h="ID=SERP">The Rust Programming Language Book</a></h2>
  <div class="b_caption">An introductory book about Rust.</div>
</li>
<li class="b_algo">
  <h2><a href="https://en.wikipedia.org/wiki/Rust_(programming_language)" h="ID=SERP">Rust - Wikipedia</a></h2>
</li>
<li class="b_algo">
  <h2><span>No link in this block</span></h2>
</li>
</ol>
</body>
</html>"#;

    #[test]
    fn parse_extracts_results_with_fallback_descriptions() {
        let results = BingAdapter.parse(MOCK_HTML).expect("should parse");
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert!(results[0].description.contains("reliable and efficient"));

        // Second block has no <p> inside the caption; the caption text
        // itself is the fallback.
        assert_eq!(results[1].description, "An introductory book about Rust.");

        // Third block has no caption at all.
        assert_eq!(results[2].description, "");
    }

    #[test]
    fn parse_skips_blocks_without_links() {
        let results = BingAdapter.parse(MOCK_HTML).expect("should parse");
        assert!(results.iter().all(|r| !r.title.contains("No link")));
    }

    #[test]
    fn parse_empty_page_returns_empty() {
        let results = BingAdapter
            .parse("<html><body></body></html>")
            .expect("should parse");
        assert!(results.is_empty());
    }

    #[test]
    fn build_url_paging_is_one_based() {
        let opts = SearchOptions {
            page: 3,
            num_results: 10,
            ..Default::default()
        };
        let url = BingAdapter
            .build_url(BingAdapter.base_url(), "rust", &opts)
            .expect("should build");
        assert!(url.contains("first=21"));
        assert!(url.contains("count=12"));
    }

    #[test]
    fn build_url_locale_and_safe_search() {
        let opts = SearchOptions {
            language: Some("en".into()),
            country: Some("GB".into()),
            safe_search: false,
            ..Default::default()
        };
        let url = BingAdapter
            .build_url(BingAdapter.base_url(), "rust", &opts)
            .expect("should build");
        assert!(url.contains("setlang=en"));
        assert!(url.contains("cc=GB"));
        assert!(url.contains("safeSearch=Off"));
    }
}
