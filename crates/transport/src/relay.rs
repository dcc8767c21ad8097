// ABOUTME: Relay strategies that map a target URL to an alternate request URL.
// ABOUTME: Ships the default public relay list used when a direct fetch fails.

use std::fmt;

/// Placeholder replaced by the percent-encoded target URL in a template.
pub const URL_PLACEHOLDER: &str = "{url}";

/// Relay templates tried in order after the direct request fails.
pub const DEFAULT_RELAY_TEMPLATES: &[&str] = &[
    "https://api.allorigins.win/raw?url={url}",
    "https://corsproxy.io/?{url}",
    "https://api.codetabs.com/v1/proxy?quest={url}",
];

/// One alternate way of reaching a target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayStrategy {
    /// Template with a `{url}` placeholder, e.g. `https://relay.example/?u={url}`.
    /// A template without the placeholder gets the encoded URL appended.
    Template(String),
    /// Endpoint the encoded target URL is appended to verbatim.
    Prefix(String),
}

impl RelayStrategy {
    /// Builds the request URL this strategy uses for `target`.
    pub fn request_url(&self, target: &str) -> String {
        let encoded = urlencoding::encode(target);
        match self {
            RelayStrategy::Template(template) if template.contains(URL_PLACEHOLDER) => {
                template.replace(URL_PLACEHOLDER, &encoded)
            }
            RelayStrategy::Template(prefix) | RelayStrategy::Prefix(prefix) => {
                format!("{}{}", prefix, encoded)
            }
        }
    }

    /// The default relay chain, in order of preference.
    pub fn defaults() -> Vec<RelayStrategy> {
        DEFAULT_RELAY_TEMPLATES
            .iter()
            .map(|t| RelayStrategy::Template((*t).to_string()))
            .collect()
    }
}

impl From<&str> for RelayStrategy {
    fn from(s: &str) -> Self {
        RelayStrategy::Template(s.to_string())
    }
}

impl From<String> for RelayStrategy {
    fn from(s: String) -> Self {
        RelayStrategy::Template(s)
    }
}

impl fmt::Display for RelayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayStrategy::Template(t) => write!(f, "{}", t),
            RelayStrategy::Prefix(p) => write!(f, "{}{}", p, URL_PLACEHOLDER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn template_encodes_target() {
        let relay = RelayStrategy::from("https://api.allorigins.win/raw?url={url}");
        assert_eq!(
            relay.request_url("https://example.com/feed.xml?a=1&b=2"),
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fexample.com%2Ffeed.xml%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn prefix_appends_target() {
        let relay = RelayStrategy::Prefix("https://corsproxy.io/?".to_string());
        assert_eq!(
            relay.request_url("https://example.com/rss"),
            "https://corsproxy.io/?https%3A%2F%2Fexample.com%2Frss"
        );
    }

    #[test]
    fn template_without_placeholder_appends() {
        let relay = RelayStrategy::from("https://relay.example/fetch?u=");
        assert_eq!(
            relay.request_url("http://a.b/c"),
            "https://relay.example/fetch?u=http%3A%2F%2Fa.b%2Fc"
        );
    }

    #[test]
    fn defaults_keep_preference_order() {
        let relays = RelayStrategy::defaults();
        assert_eq!(relays.len(), 3);
        assert!(relays[0].to_string().contains("allorigins"));
        assert!(relays[1].to_string().contains("corsproxy"));
        assert!(relays[2].to_string().contains("codetabs"));
    }
}
