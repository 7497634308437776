//! Search engine adapter implementations.
//!
//! Each module provides a struct implementing
//! [`crate::engine::EngineAdapter`] for one engine. The selector-fallback
//! helpers here are shared by every adapter: engines change their markup
//! often, so each field is looked up through an ordered selector list —
//! primary path first, older or alternative markup after — instead of a
//! single hardcoded selector per engine.

use scraper::{ElementRef, Html, Selector};

use crate::error::SearchError;

pub mod bing;
pub mod brave;
pub mod duckduckgo;
pub mod google;
pub mod mojeek;
pub mod yahoo;

pub use bing::BingAdapter;
pub use brave::BraveAdapter;
pub use duckduckgo::DuckDuckGoAdapter;
pub use google::GoogleAdapter;
pub use mojeek::MojeekAdapter;
pub use yahoo::YahooAdapter;

/// Compile a CSS selector, mapping failures to a parse error.
pub(crate) fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("invalid selector '{css}': {e:?}")))
}

/// Compile an ordered selector list.
pub(crate) fn selectors(css_list: &[&str]) -> Result<Vec<Selector>, SearchError> {
    css_list.iter().map(|css| selector(css)).collect()
}

/// Result blocks via the first selector in the chain that matches anything.
pub(crate) fn select_blocks<'a>(
    document: &'a Html,
    chain: &[Selector],
) -> Vec<ElementRef<'a>> {
    for sel in chain {
        let blocks: Vec<_> = document.select(sel).collect();
        if !blocks.is_empty() {
            return blocks;
        }
    }
    Vec::new()
}

/// Trimmed text of the first selector in the chain yielding non-empty text.
pub(crate) fn first_text(element: ElementRef<'_>, chain: &[Selector]) -> Option<String> {
    for sel in chain {
        if let Some(found) = element.select(sel).next() {
            let text = found.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First element matched by the chain, for callers that need both the
/// element's text and one of its attributes.
pub(crate) fn first_element<'a>(
    element: ElementRef<'a>,
    chain: &[Selector],
) -> Option<ElementRef<'a>> {
    chain.iter().find_map(|sel| element.select(sel).next())
}

/// Trimmed text of an element's own subtree.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Whether a decoded candidate URL points at a real destination.
pub(crate) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><body>
        <div class="primary"><span class="label">Primary text</span></div>
        <div class="fallback"><em>Fallback text</em><a href="https://x.com">x</a></div>
        <div class="empty"><span class="label">   </span><b>real</b></div>
    </body></html>"#;

    #[test]
    fn select_blocks_prefers_first_matching_selector() {
        let doc = Html::parse_document(HTML);
        let chain = selectors(&[".missing", ".fallback", ".primary"]).expect("compile");
        let blocks = select_blocks(&doc, &chain);
        assert_eq!(blocks.len(), 1);
        assert!(element_text(blocks[0]).contains("Fallback"));
    }

    #[test]
    fn select_blocks_empty_when_nothing_matches() {
        let doc = Html::parse_document(HTML);
        let chain = selectors(&[".missing", ".also-missing"]).expect("compile");
        assert!(select_blocks(&doc, &chain).is_empty());
    }

    #[test]
    fn first_text_skips_whitespace_only_matches() {
        let doc = Html::parse_document(HTML);
        let root = doc.root_element();
        let empty_div = first_element(root, &selectors(&[".empty"]).expect("compile"))
            .expect("should find");
        let chain = selectors(&["span.label", "b"]).expect("compile");
        // The span matches first but is blank, so the chain falls through.
        assert_eq!(first_text(empty_div, &chain).as_deref(), Some("real"));
    }

    #[test]
    fn first_element_returns_none_on_miss() {
        let doc = Html::parse_document(HTML);
        let chain = selectors(&["video"]).expect("compile");
        assert!(first_element(doc.root_element(), &chain).is_none());
    }

    #[test]
    fn invalid_selector_is_a_parse_error() {
        let err = selector("div[[[").unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    fn is_http_url_accepts_both_schemes_only() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("javascript:void(0)"));
        assert!(!is_http_url("//example.com"));
    }
}
