// ABOUTME: Error types for feed normalization and the load pipeline.
// ABOUTME: FeedError covers document-level failures; LoadError adds transport failures and the feed URL.

use std::fmt;
use thiserror::Error;

use panelfeed_transport::TransportError;

use crate::xml_tree::XmlTreeError;

/// Errors that can occur while normalizing a feed document.
///
/// Field-level problems (missing title, bad date, no image) never surface
/// here; they resolve to defaults on the entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The document is not well-formed XML.
    #[error("invalid feed format: {0}")]
    InvalidFormat(String),

    /// Well-formed XML with neither an RSS `channel` nor an Atom `feed` root.
    #[error("unknown feed format: no RSS channel or Atom feed element")]
    UnknownFormat,
}

impl FeedError {
    /// Creates an InvalidFormat error from an underlying parser error.
    pub fn invalid(err: impl fmt::Display) -> Self {
        FeedError::InvalidFormat(err.to_string())
    }

    pub fn is_invalid_format(&self) -> bool {
        matches!(self, FeedError::InvalidFormat(_))
    }

    pub fn is_unknown_format(&self) -> bool {
        matches!(self, FeedError::UnknownFormat)
    }
}

impl From<XmlTreeError> for FeedError {
    fn from(err: XmlTreeError) -> Self {
        FeedError::InvalidFormat(err.0)
    }
}

/// A feed load failed. Always names the feed so callers can report it.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("could not read feed {url}: {source}")]
    Feed {
        url: String,
        #[source]
        source: FeedError,
    },
}

impl LoadError {
    /// URL of the feed whose load failed.
    pub fn url(&self) -> &str {
        match self {
            LoadError::Transport { url, .. } | LoadError::Feed { url, .. } => url,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, LoadError::Transport { .. })
    }

    pub fn is_feed(&self) -> bool {
        matches!(self, LoadError::Feed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_errors_become_invalid_format() {
        let err: FeedError = XmlTreeError("unclosed element <rss>".to_string()).into();
        assert!(err.is_invalid_format());
        assert_eq!(err.to_string(), "invalid feed format: unclosed element <rss>");
    }

    #[test]
    fn load_error_reports_feed_url() {
        let err = LoadError::Feed {
            url: "https://example.com/feed".to_string(),
            source: FeedError::UnknownFormat,
        };
        assert_eq!(err.url(), "https://example.com/feed");
        assert!(err.is_feed());
        assert!(err.to_string().starts_with("could not read feed https://example.com/feed"));
    }
}
