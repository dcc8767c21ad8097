// ABOUTME: Deny-list sanitizer for entry markup before it is shown outside its origin site.
// ABOUTME: Drops scripts and handlers, resolves image and link URLs, and re-serializes deterministically.

use std::collections::BTreeMap;

use scraper::{Html, Node};

use crate::html_utils::{escape_attr, escape_text, is_raw_text_element, is_void_element};
use crate::resolve_url;

/// Sanitizes an HTML fragment against `base_url`.
///
/// Applied in order:
/// 1. `script` and `style` elements are removed with their subtree.
/// 2. `on*` attributes and `javascript:` hrefs are removed.
/// 3. `img` `src`/`srcset` are resolved against `base_url` and `loading="lazy"` is set.
/// 4. Anchors with a real href are resolved and open in a new context with
///    `rel="noopener noreferrer"`.
///
/// Attributes are written in name order, so sanitizing the output again with
/// the same base yields the same string. Markup that would re-parse into a
/// different tree is normalized first: nested anchors keep only their content
/// and `plaintext` is written as `pre`.
pub fn sanitize(html: &str, base_url: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    for child in fragment.root_element().children() {
        serialize_node_sanitized(child, base_url, Context::default(), &mut out);
    }
    out
}

#[derive(Clone, Copy, Default)]
struct Context {
    raw_text: bool,
    in_anchor: bool,
}

fn serialize_node_sanitized(
    node: ego_tree::NodeRef<Node>,
    base_url: &str,
    ctx: Context,
    out: &mut String,
) {
    match node.value() {
        Node::Text(t) => {
            if ctx.raw_text {
                out.push_str(t);
            } else {
                out.push_str(&escape_text(t));
            }
        }
        Node::Element(el) => {
            let name = el.name();
            if is_dropped_element(name) {
                return;
            }

            // Anchors cannot nest once re-parsed, so an inner anchor keeps
            // only its children.
            let is_anchor = name.eq_ignore_ascii_case("a");
            if is_anchor && ctx.in_anchor {
                for child in node.children() {
                    serialize_node_sanitized(child, base_url, ctx, out);
                }
                return;
            }

            // `plaintext` swallows the rest of the document when re-parsed.
            let tag = if name.eq_ignore_ascii_case("plaintext") {
                "pre"
            } else {
                name
            };

            let attrs = sanitized_attributes(name, el.attrs(), base_url);

            out.push('<');
            out.push_str(tag);
            for (k, v) in &attrs {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                out.push_str(&escape_attr(v));
                out.push('"');
            }
            out.push('>');

            if is_void_element(tag) {
                return;
            }

            if drops_leading_newline(tag) && starts_with_newline(node) {
                out.push('\n');
            }

            let child_ctx = Context {
                raw_text: is_raw_text_element(tag),
                in_anchor: ctx.in_anchor || is_anchor,
            };
            for child in node.children() {
                serialize_node_sanitized(child, base_url, child_ctx, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Node::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
        _ => {}
    }
}

fn is_dropped_element(name: &str) -> bool {
    name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")
}

/// The parser strips one newline right after these start tags.
fn drops_leading_newline(name: &str) -> bool {
    matches!(name, "pre" | "textarea" | "listing")
}

fn starts_with_newline(node: ego_tree::NodeRef<Node>) -> bool {
    node.first_child()
        .is_some_and(|child| matches!(child.value(), Node::Text(t) if t.starts_with('\n')))
}

/// Matches the scheme the way URL parsing sees it: leading controls and
/// spaces are ignored and tabs or newlines anywhere are dropped.
fn is_javascript_url(value: &str) -> bool {
    let scheme: String = value
        .trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .take(11)
        .collect();
    scheme.eq_ignore_ascii_case("javascript:")
}

/// Filters and rewrites one element's attributes, sorted by name.
fn sanitized_attributes<'a>(
    name: &str,
    attrs: impl Iterator<Item = (&'a str, &'a str)>,
    base_url: &str,
) -> BTreeMap<String, String> {
    let mut kept: BTreeMap<String, String> = attrs
        .filter(|(k, v)| {
            let handler = k.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("on"));
            let script_href = k.eq_ignore_ascii_case("href") && is_javascript_url(v);
            !handler && !script_href
        })
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if name.eq_ignore_ascii_case("img") {
        if let Some(src) = kept.get_mut("src") {
            if !src.is_empty() {
                *src = resolve_url(src, base_url);
            }
        }
        if let Some(srcset) = kept.get_mut("srcset") {
            *srcset = rewrite_srcset(srcset, base_url);
        }
        kept.insert("loading".to_string(), "lazy".to_string());
    } else if name.eq_ignore_ascii_case("a") {
        let rewritten = kept
            .get("href")
            .filter(|href| !href.is_empty() && !href.starts_with('#'))
            .map(|href| resolve_url(href, base_url));
        match rewritten {
            Some(href) if is_javascript_url(&href) => {
                kept.remove("href");
            }
            Some(href) => {
                kept.insert("href".to_string(), href);
                kept.insert("target".to_string(), "_blank".to_string());
                kept.insert("rel".to_string(), "noopener noreferrer".to_string());
            }
            None => {}
        }
    }

    kept
}

/// Resolves the URL of each `srcset` candidate, keeping its descriptor.
fn rewrite_srcset(srcset: &str, base_url: &str) -> String {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let descriptor: Vec<&str> = parts.collect();
            let resolved = resolve_url(url, base_url);
            Some(if descriptor.is_empty() {
                resolved
            } else {
                format!("{} {}", resolved, descriptor.join(" "))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}
