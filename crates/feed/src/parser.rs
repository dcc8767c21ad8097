// ABOUTME: Feed normalization from RSS 2.0 and Atom 1.0 documents into NormalizedFeed.
// ABOUTME: Detects the dialect, extracts entries with lenient defaults and caps them at MAX_ENTRIES.

use tracing::debug;

use crate::error::FeedError;
use crate::image_utils::extract_media_image;
use crate::models::{FeedDialect, FeedEntry, NormalizedFeed, MAX_ENTRIES, UNTITLED};
use crate::origin_of;
use crate::time_parse::parse_feed_date;
use crate::xml_tree::{XmlDocument, XmlElement};

/// Atom 1.0 namespace.
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// RSS content module namespace (`content:encoded`).
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

/// Parses feed text into a NormalizedFeed.
///
/// # Arguments
/// * `text` - Raw feed document (RSS 2.0 or Atom 1.0)
/// * `source_url` - The URL the feed was fetched from; its origin becomes `base_url`
///
/// # Returns
/// * `Ok(NormalizedFeed)` - Entries still carry raw, unsanitized markup
/// * `Err(FeedError::InvalidFormat)` - The document is not well-formed XML
/// * `Err(FeedError::UnknownFormat)` - Neither an RSS channel nor an Atom feed
pub fn normalize(text: &str, source_url: &str) -> Result<NormalizedFeed, FeedError> {
    let doc = XmlDocument::parse(text)?;
    normalize_document(&doc, source_url)
}

/// Normalizes an already parsed document.
pub fn normalize_document(doc: &XmlDocument, source_url: &str) -> Result<NormalizedFeed, FeedError> {
    let root = doc.root();
    let base_url = origin_of(source_url);

    // RSS wins when a document carries both constructs.
    let channel = if root.local_name == "channel" {
        Some(root)
    } else {
        root.find(|el| el.local_name == "channel")
    };

    let feed = if let Some(channel) = channel {
        normalize_rss(channel, base_url)
    } else if root.local_name == "feed" {
        normalize_atom(root, base_url)
    } else {
        return Err(FeedError::UnknownFormat);
    };

    debug!(
        source_url,
        dialect = ?feed.dialect,
        entries = feed.entries.len(),
        "normalized feed"
    );
    Ok(feed)
}

fn normalize_rss(channel: &XmlElement, base_url: String) -> NormalizedFeed {
    // RSS 0.9x/2.0 variants sometimes bind a default namespace; whatever the
    // channel carries counts as core.
    let core_ns = channel.namespace.as_deref();

    let entries = channel
        .descendants()
        .filter(|el| el.local_name == "item" && is_core(el, core_ns))
        .take(MAX_ENTRIES)
        .map(|item| {
            let content = item
                .find(is_encoded_content)
                .map(|el| el.text_content())
                .filter(|text| !text.trim().is_empty())
                .or_else(|| field_raw(item, core_ns, "description"))
                .unwrap_or_default();

            FeedEntry {
                title: entry_title(item, core_ns),
                link: field_text(item, core_ns, "link"),
                published_at: parse_feed_date(&field_text(item, core_ns, "pubDate")),
                content_html: content,
                media_image_url: extract_media_image(item),
            }
        })
        .collect();

    NormalizedFeed {
        title: child_text(channel, core_ns, "title"),
        description: child_text(channel, core_ns, "description"),
        link: child_text(channel, core_ns, "link"),
        base_url,
        dialect: FeedDialect::Rss,
        entries,
    }
}

fn normalize_atom(feed: &XmlElement, base_url: String) -> NormalizedFeed {
    let core_ns = Some(ATOM_NS);

    let entries = feed
        .descendants()
        .filter(|el| el.local_name == "entry" && is_core(el, core_ns))
        .take(MAX_ENTRIES)
        .map(|entry| {
            let link_candidates: Vec<&XmlElement> = entry
                .descendants()
                .filter(|el| el.local_name == "link" && is_core(el, core_ns))
                .collect();

            let content = atom_content(entry, "content")
                .or_else(|| atom_content(entry, "summary"))
                .unwrap_or_default();

            let date = Some(field_text(entry, core_ns, "published"))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| field_text(entry, core_ns, "updated"));

            FeedEntry {
                title: entry_title(entry, core_ns),
                link: atom_link(&link_candidates),
                published_at: parse_feed_date(&date),
                content_html: content,
                media_image_url: extract_media_image(entry),
            }
        })
        .collect();

    let feed_links: Vec<&XmlElement> = feed
        .child_elements()
        .filter(|el| el.local_name == "link" && is_core(el, core_ns))
        .collect();

    NormalizedFeed {
        title: child_text(feed, core_ns, "title"),
        description: child_text(feed, core_ns, "subtitle"),
        link: atom_link(&feed_links),
        base_url,
        dialect: FeedDialect::Atom,
        entries,
    }
}

/// An element is a core field when it is unprefixed and unbound, or bound to
/// the feed's core namespace. Extension elements such as `media:title`
/// therefore never shadow core fields.
fn is_core(el: &XmlElement, core_ns: Option<&str>) -> bool {
    match el.namespace.as_deref() {
        None => el.name == el.local_name,
        Some(ns) => core_ns == Some(ns),
    }
}

fn is_encoded_content(el: &XmlElement) -> bool {
    (el.local_name == "encoded" && el.namespace.as_deref() == Some(CONTENT_NS))
        || el.name == "content:encoded"
}

/// First descendant field element in document order.
fn field<'a>(scope: &'a XmlElement, core_ns: Option<&str>, local_name: &str) -> Option<&'a XmlElement> {
    scope.find(|el| el.local_name == local_name && is_core(el, core_ns))
}

/// Trimmed text of a field, empty when missing.
fn field_text(scope: &XmlElement, core_ns: Option<&str>, local_name: &str) -> String {
    field(scope, core_ns, local_name)
        .map(|el| el.text_content().trim().to_string())
        .unwrap_or_default()
}

/// Untrimmed text of a field, `None` when missing or blank.
fn field_raw(scope: &XmlElement, core_ns: Option<&str>, local_name: &str) -> Option<String> {
    field(scope, core_ns, local_name)
        .map(|el| el.text_content())
        .filter(|text| !text.trim().is_empty())
}

/// Trimmed text of a direct child, empty when missing.
fn child_text(container: &XmlElement, core_ns: Option<&str>, local_name: &str) -> String {
    container
        .child_elements()
        .find(|el| el.local_name == local_name && is_core(el, core_ns))
        .map(|el| el.text_content().trim().to_string())
        .unwrap_or_default()
}

fn entry_title(scope: &XmlElement, core_ns: Option<&str>) -> String {
    let title = field_text(scope, core_ns, "title");
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Atom text construct: `type="xhtml"` content is kept as markup, everything
/// else is read as text (escaped HTML decodes to markup here).
fn atom_content(entry: &XmlElement, local_name: &str) -> Option<String> {
    let el = field(entry, Some(ATOM_NS), local_name)?;
    let content = if el.attr("type") == Some("xhtml") {
        el.inner_xml()
    } else {
        el.text_content()
    };
    Some(content).filter(|c| !c.trim().is_empty())
}

/// `rel="alternate"` link if present, else the first link.
fn atom_link(links: &[&XmlElement]) -> String {
    links
        .iter()
        .find(|el| el.attr("rel") == Some("alternate"))
        .or_else(|| links.first())
        .and_then(|el| el.attr("href"))
        .map(|href| href.trim().to_string())
        .unwrap_or_default()
}
