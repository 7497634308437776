//! Error types for the metasearch crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No credentials or proxy URLs appear in
//! error messages.

/// Errors that can occur during search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A network-level failure: timeout, connection refused, transport error.
    #[error("network error: {0}")]
    Network(String),

    /// The response markup did not yield a structurable result set.
    #[error("parse error: {0}")]
    Parse(String),

    /// An anti-bot, captcha or rate-limit signature was detected, or the
    /// engine answered HTTP 403/429. Carries the matched reason.
    #[error("blocked: {0}")]
    Blocked(String),

    /// A cache backend I/O failure. The search pipeline treats cache-write
    /// failures as non-fatal; this surfaces only from direct cache calls.
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid configuration or an unknown engine identifier.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for metasearch results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_network() {
        let err = SearchError::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");
    }

    #[test]
    fn display_parse() {
        let err = SearchError::Parse("unexpected HTML structure".into());
        assert_eq!(err.to_string(), "parse error: unexpected HTML structure");
    }

    #[test]
    fn display_blocked() {
        let err = SearchError::Blocked("captcha detected".into());
        assert_eq!(err.to_string(), "blocked: captcha detected");
    }

    #[test]
    fn display_cache() {
        let err = SearchError::Cache("permission denied".into());
        assert_eq!(err.to_string(), "cache error: permission denied");
    }

    #[test]
    fn display_config() {
        let err = SearchError::Config("unknown engine 'altavista'".into());
        assert_eq!(err.to_string(), "config error: unknown engine 'altavista'");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
