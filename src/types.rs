//! Core types for search results, visited pages and engine identification.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A single search result returned from a web search engine.
///
/// `position` and `engine` are stamped by the search pipeline after parsing;
/// adapters produce results with `position == 0` and an empty engine name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result page.
    pub title: String,
    /// The destination URL, with any engine redirect wrapper removed.
    pub url: String,
    /// A text snippet summarising the page. Empty when the engine
    /// provided none.
    #[serde(default)]
    pub description: String,
    /// 1-based rank within the page of results, contiguous per page.
    #[serde(default)]
    pub position: u32,
    /// Identifier of the engine that returned this result.
    #[serde(default)]
    pub engine: String,
    /// Open mapping of engine-specific extra fields.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SearchResult {
    /// Build an unstamped result, the form adapters return from parsing.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            position: 0,
            engine: String::new(),
            extra: HashMap::new(),
        }
    }
}

/// Content of a page fetched with [`crate::content::visit`].
///
/// Always constructed, never an error: failed fetches carry
/// `success == false`, `status_code == 0` and a populated `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// The URL that was fetched.
    pub url: String,
    /// Page title, falling back to empty when absent.
    pub title: String,
    /// Readable text with scripts, styles and navigation stripped.
    pub text: String,
    /// Raw response markup.
    pub html: String,
    /// HTTP status code, 0 when the request never completed.
    pub status_code: u16,
    /// Whether the fetch produced usable content.
    pub success: bool,
    /// Failure description when `success` is false.
    pub error: Option<String>,
}

impl PageContent {
    /// First `max_length` characters of the extracted text, with an
    /// ellipsis when truncated.
    pub fn text_preview(&self, max_length: usize) -> String {
        if self.text.chars().count() <= max_length {
            return self.text.clone();
        }
        let mut preview: String = self.text.chars().take(max_length).collect();
        preview.push_str("...");
        preview
    }
}

/// The search engines this crate can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    /// DuckDuckGo — HTML-only endpoint, most scraper-friendly.
    DuckDuckGo,
    /// Bing — Microsoft's index, works without a proxy.
    Bing,
    /// Yahoo — Bing-backed index with its own redirect wrapper.
    Yahoo,
    /// Mojeek — independent index, tolerant of automated requests.
    Mojeek,
    /// Brave Search — independent index, privacy-focused.
    Brave,
    /// Google — best results but requires an unblocking relay to
    /// query reliably; excluded from the default dispatch set.
    Google,
}

impl SearchEngine {
    /// Returns the identifier used in results, cache keys and dispatch maps.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "duckduckgo",
            Self::Bing => "bing",
            Self::Yahoo => "yahoo",
            Self::Mojeek => "mojeek",
            Self::Brave => "brave",
            Self::Google => "google",
        }
    }

    /// Returns all available engine variants.
    pub fn all() -> &'static [SearchEngine] {
        &[
            Self::DuckDuckGo,
            Self::Bing,
            Self::Yahoo,
            Self::Mojeek,
            Self::Brave,
            Self::Google,
        ]
    }

    /// Resolve an engine from its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] listing the known identifiers when
    /// the name does not match any engine.
    pub fn from_name(name: &str) -> Result<Self, SearchError> {
        let lowered = name.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|e| e.name() == lowered)
            .ok_or_else(|| {
                let available = Self::all()
                    .iter()
                    .map(|e| e.name())
                    .collect::<Vec<_>>()
                    .join(", ");
                SearchError::Config(format!("unknown engine '{name}', available: {available}"))
            })
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchEngine {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
