// ABOUTME: Rust models for configured feed sources and normalized feed output.
// ABOUTME: Textual fields default to empty strings; dates and media images are optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image_utils::has_inline_image;

/// Maximum number of entries kept from a feed, taken in document order.
pub const MAX_ENTRIES: usize = 20;

/// Title used when an entry has none.
pub const UNTITLED: &str = "Untitled";

/// Syndication dialect a document was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedDialect {
    Rss,
    Atom,
}

/// A configured feed URL with its derived label and origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    pub display_name: String,
    pub origin_url: String,
}

/// A single item/entry after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Raw markup from the feed until the load pipeline sanitizes it.
    pub content_html: String,
    pub media_image_url: Option<String>,
}

impl Default for FeedEntry {
    fn default() -> Self {
        Self {
            title: UNTITLED.to_string(),
            link: String::new(),
            published_at: None,
            content_html: String::new(),
            media_image_url: None,
        }
    }
}

impl FeedEntry {
    /// Image to show above the content, if any.
    ///
    /// The media image is only used when the content has no `<img>` of its
    /// own, so an entry never shows the same picture twice.
    pub fn lead_image_url(&self) -> Option<&str> {
        match self.media_image_url.as_deref() {
            Some(url) if !url.is_empty() && !has_inline_image(&self.content_html) => Some(url),
            _ => None,
        }
    }
}

/// A feed normalized from either dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Origin of the source URL, used to resolve relative references.
    pub base_url: String,
    pub dialect: FeedDialect,
    pub entries: Vec<FeedEntry>,
}
