//! Block-page detection over raw response markup.
//!
//! Search engines answer automated traffic with captcha walls, "unusual
//! traffic" interstitials and challenge pages instead of results. This
//! module pattern-matches fetched markup against known signatures so the
//! pipeline can fail with a block error before parsing garbage.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

/// Ordered block-signature rules. First match wins, so the more specific
/// captcha markers come before the generic title checks.
const BLOCK_RULES: &[(&str, &str)] = &[
    (r"<form[^>]*captcha[^>]*>", "captcha form detected"),
    (r#"<div[^>]*id=["']captcha["'][^>]*>"#, "captcha element detected"),
    (r#"<div[^>]*class=["']captcha["'][^>]*>"#, "captcha element detected"),
    (r"<input[^>]*captcha[^>]*>", "captcha input detected"),
    (r"solve\s+the\s+captcha", "captcha challenge detected"),
    (r"complete\s+the\s+captcha", "captcha challenge detected"),
    (r"unusual\s+traffic\s+from", "unusual traffic interstitial"),
    (r"automated\s+queries", "automated queries rejected"),
    (r"are\s+you\s+a\s+robot", "bot check triggered"),
    (r"verify\s+you\s+are\s+(a\s+)?human", "human verification required"),
    (r"<title>[^<]*too\s+many\s+requests[^<]*</title>", "rate limit page returned"),
    (r"please\s+complete\s+the\s+security\s+check", "security check required"),
    (r"<title>[^<]*access\s+denied[^<]*</title>", "access denied page returned"),
    (r"<title>[^<]*blocked[^<]*</title>", "blocked page returned"),
    (r"CfConfig.*siteKey", "anti-bot challenge detected"),
    (r"challenge/verify\?partner", "anti-bot challenge detected"),
];

fn compiled_rules() -> &'static Vec<(Regex, &'static str)> {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        BLOCK_RULES
            .iter()
            .filter_map(|(pattern, reason)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (re, *reason))
            })
            .collect()
    })
}

/// Match fetched markup against the known block signatures.
///
/// Returns the human-readable reason of the first matching rule, or `None`
/// when the content looks like a real results page. Matching is
/// case-insensitive over the raw markup.
pub fn detect_block(html: &str) -> Option<&'static str> {
    compiled_rules()
        .iter()
        .find(|(re, _)| re.is_match(html))
        .map(|(_, reason)| *reason)
}
