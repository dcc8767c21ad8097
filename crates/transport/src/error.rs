// ABOUTME: Error types for the transport layer including ErrorCode enum and TransportError struct.
// ABOUTME: Distinguishes single-attempt network failures from an exhausted fallback chain.

use std::fmt;

/// Error codes representing different categories of transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Network,
    Exhausted,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Network => "network failure",
            ErrorCode::Exhausted => "all transport attempts failed",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for transport operations.
///
/// `attempts` counts how many requests were made before giving up. It is 1 for
/// a single failed attempt and `1 + relays` when the whole chain was exhausted.
#[derive(Debug, thiserror::Error)]
pub struct TransportError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    pub attempts: usize,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport: {} {}: {}", self.op, self.url, self.code)?;
        if self.code == ErrorCode::Exhausted {
            write!(f, " ({} attempts)", self.attempts)?;
        }
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl TransportError {
    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::InvalidUrl,
            url: url.into(),
            op: op.into(),
            attempts: 0,
            source,
        }
    }

    /// Create a Network error for one failed attempt.
    pub fn network(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Network,
            url: url.into(),
            op: op.into(),
            attempts: 1,
            source,
        }
    }

    /// Create an Exhausted error after `attempts` failed requests.
    ///
    /// `last` is the failure of the final attempt, kept as the error source.
    pub fn exhausted(url: impl Into<String>, attempts: usize, last: Option<TransportError>) -> Self {
        Self {
            code: ErrorCode::Exhausted,
            url: url.into(),
            op: "Fetch".to_string(),
            attempts,
            source: last.map(anyhow::Error::new),
        }
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a single-attempt Network error.
    pub fn is_network(&self) -> bool {
        self.code == ErrorCode::Network
    }

    /// Returns true if every transport attempt failed.
    pub fn is_exhausted(&self) -> bool {
        self.code == ErrorCode::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_display_includes_attempts() {
        let last = TransportError::network(
            "https://relay.example/?u=x",
            "Fetch",
            Some(anyhow::anyhow!("HTTP status 503")),
        );
        let err = TransportError::exhausted("https://example.com/feed.xml", 4, Some(last));

        assert!(err.is_exhausted());
        assert_eq!(err.attempts, 4);
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/feed.xml"));
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("HTTP status 503"));
    }

    #[test]
    fn network_counts_one_attempt() {
        let err = TransportError::network("https://example.com", "Fetch", None);
        assert!(err.is_network());
        assert!(!err.is_exhausted());
        assert_eq!(err.attempts, 1);
    }
}
