// ABOUTME: TransportResolver fetches a URL directly, then through each relay strategy in order.
// ABOUTME: Stops at the first success and reports an Exhausted error with the attempt count otherwise.

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::options::{ResolverBuilder, TransportOptions};
use crate::relay::RelayStrategy;
use crate::resource::{fetch, FetchOptions, FetchResult};

/// Fetch-with-fallback over a direct request and an ordered relay chain.
///
/// Attempts are strictly sequential: the direct URL first, then every relay in
/// the configured order. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct TransportResolver {
    opts: TransportOptions,
    http_client: reqwest::Client,
}

impl TransportResolver {
    /// Create a new ResolverBuilder for configuring the resolver.
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Create a new resolver with the given options.
    pub fn new(opts: TransportOptions) -> Result<Self, TransportError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder()
                    .user_agent(&opts.user_agent)
                    .gzip(true)
                    .brotli(true)
                    .deflate(true);
                if let Some(timeout) = opts.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(|e| {
                    TransportError::network(
                        "",
                        "Build",
                        Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                    )
                })?
            }
        };

        Ok(Self { opts, http_client })
    }

    /// The relay chain used after a failed direct request.
    pub fn relays(&self) -> &[RelayStrategy] {
        &self.opts.relays
    }

    /// Fetch `url` and return its decoded text.
    pub async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        self.fetch_resource(url).await.map(|res| res.text_utf8())
    }

    /// Fetch a newline-delimited list and return its non-blank, trimmed lines.
    pub async fn fetch_lines(&self, url: &str) -> Result<Vec<String>, TransportError> {
        let text = self.fetch(url).await?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Fetch `url` and return the raw response of the first successful attempt.
    pub async fn fetch_resource(&self, url: &str) -> Result<FetchResult, TransportError> {
        if url::Url::parse(url).is_err() {
            return Err(TransportError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("malformed URL")),
            ));
        }

        let fetch_opts = FetchOptions {
            headers: self.opts.headers.clone(),
        };

        let mut last_error = match fetch(&self.http_client, url, &fetch_opts).await {
            Ok(res) => {
                debug!(
                    url,
                    status = res.status,
                    final_url = %res.final_url,
                    "direct fetch succeeded"
                );
                return Ok(res);
            }
            Err(err) => {
                debug!(url, error = %err, "direct fetch failed");
                err
            }
        };
        let mut attempts = 1;

        for relay in &self.opts.relays {
            let relay_url = relay.request_url(url);
            attempts += 1;
            match fetch(&self.http_client, &relay_url, &fetch_opts).await {
                Ok(res) => {
                    debug!(
                        url,
                        relay = %relay,
                        status = res.status,
                        final_url = %res.final_url,
                        "relay fetch succeeded"
                    );
                    return Ok(res);
                }
                Err(err) => {
                    debug!(url, relay = %relay, error = %err, "relay fetch failed");
                    last_error = err;
                }
            }
        }

        warn!(url, attempts, "every transport attempt failed");
        Err(TransportError::exhausted(url, attempts, Some(last_error)))
    }
}
