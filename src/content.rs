//! Page visiting — fetch a result URL and extract readable content.
//!
//! [`visit`] always hands back a [`PageContent`]: transport failures set
//! `success = false` with the failure in `error` instead of propagating.
//! Extraction strips non-content elements (scripts, styles, navigation
//! chrome) and collapses the remaining text to single-spaced prose.

use std::time::Duration;

use scraper::{Html, Selector};

use crate::http::random_user_agent;
use crate::types::{PageContent, SearchResult};

/// Element names whose text never counts as page content.
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "head",
    "title",
];

/// Fetch `url` and extract its readable content.
///
/// Any completed response counts as a visit — including error statuses,
/// whose body is still captured. Only transport-level failures (timeout,
/// connection error, client construction) produce `success = false`.
pub async fn visit(url: &str, timeout_seconds: u64, user_agent: Option<&str>) -> PageContent {
    let ua = user_agent.unwrap_or_else(|| random_user_agent());

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(ua)
        .build()
    {
        Ok(client) => client,
        Err(e) => return failed_visit(url, format!("failed to build HTTP client: {e}")),
    };

    let response = match client
        .get(url)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            return failed_visit(url, format!("timeout after {timeout_seconds}s"));
        }
        Err(e) => return failed_visit(url, format!("request failed: {e}")),
    };

    let status_code = response.status().as_u16();
    let html = match response.text().await {
        Ok(html) => html,
        Err(e) => return failed_visit(url, format!("response read failed: {e}")),
    };

    let document = Html::parse_document(&html);
    let title = page_title(&document);
    let text = readable_text(&document);

    PageContent {
        url: url.to_owned(),
        title,
        text,
        html,
        status_code,
        success: true,
        error: None,
    }
}

/// [`visit`] with the default 30 second timeout and rotated User-Agent.
pub async fn visit_default(url: &str) -> PageContent {
    visit(url, 30, None).await
}

impl SearchResult {
    /// Visit this result's URL and return the page content.
    ///
    /// The result's own title fills in when the page has none. Never
    /// fails; see [`visit`].
    pub async fn visit(&self, timeout_seconds: u64, user_agent: Option<&str>) -> PageContent {
        let mut page = visit(&self.url, timeout_seconds, user_agent).await;
        if page.success && page.title.is_empty() {
            page.title = self.title.clone();
        }
        page
    }
}

fn failed_visit(url: &str, error: String) -> PageContent {
    PageContent {
        url: url.to_owned(),
        title: String::new(),
        text: String::new(),
        html: String::new(),
        status_code: 0,
        success: false,
        error: Some(error),
    }
}

fn page_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_owned()
}

/// Collect the document's text, skipping text inside non-content elements,
/// collapsed to single spaces.
fn readable_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let excluded = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| NON_CONTENT_TAGS.contains(&el.name()))
        });
        if !excluded {
            out.push_str(&text.text);
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn title_extracted_and_trimmed() {
        let doc = parse("<html><head><title>  My Page  </title></head><body>x</body></html>");
        assert_eq!(page_title(&doc), "My Page");
    }

    #[test]
    fn missing_title_is_empty() {
        let doc = parse("<html><body>content</body></html>");
        assert_eq!(page_title(&doc), "");
    }

    #[test]
    fn readable_text_skips_scripts_and_chrome() {
        let doc = parse(
            r#"<html><head><title>T</title><style>body { color: red }</style></head>
            <body>
                <nav>Site navigation</nav>
                <header>Masthead</header>
                <p>Real content here.</p>
                <script>var tracked = true;</script>
                <aside>Sidebar ads</aside>
                <footer>Copyright</footer>
            </body></html>"#,
        );
        let text = readable_text(&doc);
        assert!(text.contains("Real content here."));
        assert!(!text.contains("Site navigation"));
        assert!(!text.contains("Masthead"));
        assert!(!text.contains("tracked"));
        assert!(!text.contains("Sidebar"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains('T'), "title text leaked: {text}");
    }

    #[test]
    fn readable_text_collapses_whitespace() {
        let doc = parse("<html><body><p>one   two</p>\n\n<p>three</p></body></html>");
        assert_eq!(readable_text(&doc), "one two three");
    }

    #[test]
    fn failed_visit_shape() {
        let page = failed_visit("https://example.com", "timeout after 5s".into());
        assert!(!page.success);
        assert_eq!(page.status_code, 0);
        assert_eq!(page.url, "https://example.com");
        assert!(page.title.is_empty() && page.text.is_empty() && page.html.is_empty());
        assert_eq!(page.error.as_deref(), Some("timeout after 5s"));
    }

    #[tokio::test]
    async fn visit_unroutable_host_reports_failure_not_panic() {
        let page = visit("http://127.0.0.1:1/nowhere", 2, None).await;
        assert!(!page.success);
        assert_eq!(page.status_code, 0);
        assert!(page.error.is_some());
    }

    #[tokio::test]
    async fn visit_invalid_url_reports_failure() {
        let page = visit("not a url at all", 2, None).await;
        assert!(!page.success);
        assert!(page.error.is_some());
    }

    #[tokio::test]
    #[ignore] // Live test — run with `cargo test -- --ignored`
    async fn live_visit_example_dot_com() {
        let page = visit_default("https://example.com/").await;
        assert!(page.success);
        assert_eq!(page.status_code, 200);
        assert!(page.title.to_lowercase().contains("example"));
        assert!(!page.text.is_empty());
    }
}
