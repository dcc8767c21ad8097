// ABOUTME: Core feed library for panelfeed.
// ABOUTME: Provides feed normalization, markup sanitization, feed sources, URL helpers and the load pipeline.

pub mod error;
pub mod html_utils;
pub mod image_utils;
pub mod loader;
pub mod models;
pub mod parser;
pub mod sanitize;
pub mod source;
pub mod time_parse;
pub mod xml_tree;

pub use error::{FeedError, LoadError};
pub use html_utils::decode_entities;
pub use image_utils::{extract_media_image, has_inline_image};
pub use loader::{
    load_document, load_feed, load_feed_latest, sanitize_entries, LoadGeneration, LoadTicket,
};
pub use models::{FeedDialect, FeedEntry, FeedSource, NormalizedFeed, MAX_ENTRIES};
pub use parser::{normalize, normalize_document};
pub use sanitize::sanitize;
pub use source::{display_name, parse_feed_list, sort_by_display_name};
pub use time_parse::parse_feed_date;
pub use xml_tree::{XmlDocument, XmlElement};

// ----------------------------------------------------------------------------
// URL utilities
// ----------------------------------------------------------------------------

use url::Url;

/// Resolves `reference` against `base`. Never fails.
///
/// Empty stays empty, `http(s)://` passes through, protocol-relative `//`
/// gets `https:`, anything else is joined onto `base`. When joining is not
/// possible the reference is returned unchanged.
pub fn resolve_url(reference: &str, base: &str) -> String {
    if reference.is_empty() {
        return String::new();
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }
    if reference.starts_with("//") {
        return format!("https:{}", reference);
    }

    Url::parse(base)
        .and_then(|base| base.join(reference))
        .map(String::from)
        .unwrap_or_else(|_| reference.to_string())
}

/// Extracts the origin (scheme + host, no port) of a URL.
/// Malformed or host-less input is returned unchanged.
pub fn origin_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    match parsed.host_str() {
        Some(host) => format!("{}://{}", parsed.scheme(), host),
        None => url.to_string(),
    }
}
