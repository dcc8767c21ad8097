// ABOUTME: Configuration options for the transport resolver and its fluent builder.
// ABOUTME: ResolverBuilder mirrors a ClientBuilder API: relays, user agent, timeout, headers.

use std::collections::HashMap;
use std::time::Duration;

use crate::relay::RelayStrategy;
use crate::resolver::TransportResolver;

/// Configuration options for the transport resolver.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Alternate strategies tried in order after the direct request fails.
    pub relays: Vec<RelayStrategy>,
    pub user_agent: String,
    /// Per-request timeout. `None` leaves timing to the HTTP stack.
    pub timeout: Option<Duration>,
    pub headers: HashMap<String, String>,
    pub http_client: Option<reqwest::Client>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            relays: RelayStrategy::defaults(),
            user_agent: "panelfeed/0.1".to_string(),
            timeout: None,
            headers: HashMap::new(),
            http_client: None,
        }
    }
}

/// Builder for constructing TransportResolver instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ResolverBuilder {
    opts: TransportOptions,
}

impl ResolverBuilder {
    /// Create a new ResolverBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: TransportOptions::default(),
        }
    }

    /// Replace the relay chain.
    pub fn relays<I, R>(mut self, relays: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RelayStrategy>,
    {
        self.opts.relays = relays.into_iter().map(Into::into).collect();
        self
    }

    /// Append one relay to the end of the chain.
    pub fn relay(mut self, relay: impl Into<RelayStrategy>) -> Self {
        self.opts.relays.push(relay.into());
        self
    }

    /// Only ever attempt the direct request.
    pub fn without_relays(mut self) -> Self {
        self.opts.relays.clear();
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Set a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = Some(timeout);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Build the resolver with the configured options.
    pub fn build(self) -> Result<TransportResolver, crate::TransportError> {
        TransportResolver::new(self.opts)
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
