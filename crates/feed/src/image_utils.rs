// ABOUTME: Media image extraction for feed entries and inline-image detection for entry markup.
// ABOUTME: Walks media:content, media:thumbnail and image enclosures in a fixed order of preference.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::xml_tree::XmlElement;

/// Yahoo Media RSS namespace.
pub const MEDIA_RSS_NS: &str = "http://search.yahoo.com/mrss/";

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("valid img selector"));

/// Extracts the image URL advertised by an item or entry.
///
/// First match wins:
/// 1. the first `media:content`, or failing that the first element with
///    `medium="image"`, read its `url`;
/// 2. the first `media:thumbnail` `url`;
/// 3. the first `enclosure`, if its `type` starts with `image/`.
pub fn extract_media_image(item: &XmlElement) -> Option<String> {
    let media_content = item
        .find(|el| is_media(el, "content"))
        .or_else(|| item.find(|el| el.attr("medium") == Some("image")));
    if let Some(url) = media_content.and_then(|el| non_empty_attr(el, "url")) {
        return Some(url);
    }

    if let Some(url) = item
        .find(|el| is_media(el, "thumbnail"))
        .and_then(|el| non_empty_attr(el, "url"))
    {
        return Some(url);
    }

    let enclosure = item.find(|el| el.local_name == "enclosure" && el.namespace.is_none())?;
    if enclosure.attr("type").unwrap_or_default().starts_with("image/") {
        return non_empty_attr(enclosure, "url");
    }

    None
}

/// Returns true if `html` contains at least one `<img>` element.
pub fn has_inline_image(html: &str) -> bool {
    if !html.contains('<') {
        return false;
    }
    let fragment = Html::parse_fragment(html);
    let found = fragment.select(&IMG_SELECTOR).next().is_some();
    found
}

fn is_media(el: &XmlElement, local_name: &str) -> bool {
    el.local_name == local_name
        && matches!(
            el.namespace.as_deref(),
            Some(MEDIA_RSS_NS) | Some("http://search.yahoo.com/mrss")
        )
}

fn non_empty_attr(el: &XmlElement, name: &str) -> Option<String> {
    el.attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
