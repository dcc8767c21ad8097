// ABOUTME: Feed load pipeline: fetch through the transport chain, normalize, then sanitize entry markup.
// ABOUTME: Also provides generation tickets so callers can discard results of superseded loads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use panelfeed_transport::TransportResolver;
use tracing::{debug, info, warn};

use crate::error::{FeedError, LoadError};
use crate::models::NormalizedFeed;
use crate::parser::normalize;
use crate::sanitize::sanitize;

/// Loads a feed: fetch, normalize, and sanitize every entry against the
/// origin of `url`.
///
/// Each call is independent; nothing is cached between loads.
pub async fn load_feed(resolver: &TransportResolver, url: &str) -> Result<NormalizedFeed, LoadError> {
    info!(url, "loading feed");

    let text = resolver.fetch(url).await.map_err(|source| {
        warn!(url, error = %source, "feed fetch failed");
        LoadError::Transport {
            url: url.to_string(),
            source,
        }
    })?;

    load_document(&text, url).map_err(|source| {
        warn!(url, error = %source, "feed document rejected");
        LoadError::Feed {
            url: url.to_string(),
            source,
        }
    })
}

/// Normalizes and sanitizes an already retrieved document.
pub fn load_document(text: &str, source_url: &str) -> Result<NormalizedFeed, FeedError> {
    let mut feed = normalize(text, source_url)?;
    sanitize_entries(&mut feed);
    Ok(feed)
}

/// Replaces every entry's markup with its sanitized form.
pub fn sanitize_entries(feed: &mut NormalizedFeed) {
    let base_url = &feed.base_url;
    for entry in &mut feed.entries {
        entry.content_html = sanitize(&entry.content_html, base_url);
    }
}

/// Monotonic counter identifying the most recently started load.
///
/// Clones share the same counter, so one instance can be handed to every
/// task that starts loads for the same display.
#[derive(Debug, Clone, Default)]
pub struct LoadGeneration {
    current: Arc<AtomicU64>,
}

impl LoadGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new load, superseding every earlier ticket.
    pub fn begin(&self) -> LoadTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        LoadTicket {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    /// Generation of the latest load started.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Handle for one load started from a [`LoadGeneration`].
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer load has begun.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

/// Like [`load_feed`], but returns `Ok(None)` when another load began on
/// `generation` before this one finished. Failures of superseded loads are
/// discarded too.
pub async fn load_feed_latest(
    resolver: &TransportResolver,
    url: &str,
    generation: &LoadGeneration,
) -> Result<Option<NormalizedFeed>, LoadError> {
    let ticket = generation.begin();
    let result = load_feed(resolver, url).await;

    if !ticket.is_current() {
        debug!(
            url,
            generation = ticket.generation(),
            latest = generation.current(),
            "discarding superseded feed load"
        );
        return Ok(None);
    }

    result.map(Some)
}
