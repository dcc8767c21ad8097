// ABOUTME: Namespace-aware XML document tree built from quick-xml events.
// ABOUTME: Offers the narrow query surface the normalizer needs: lookup, attributes, text, serialization.

//! A small owned XML tree.
//!
//! Feed normalization only needs tag/namespace-qualified queries, attribute
//! reads, text content and re-serialization of a subtree, so the parser builds
//! this tree once and the rest of the crate never touches quick-xml directly.

use std::fmt::Write as _;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use thiserror::Error;

use crate::html_utils::{decode_entities, escape_attr, escape_text, resolve_reference};

/// The document could not be parsed as well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed XML: {0}")]
pub struct XmlTreeError(pub String);

/// An attribute as written in the source (qualified name, decoded value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// One element with its resolved namespace and children in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `media:content`.
    pub name: String,
    pub local_name: String,
    /// Namespace URI the prefix resolved to, if any.
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

/// A parsed document with exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parses `text`, rejecting anything that is not well-formed.
    ///
    /// Prefixes that were never declared are tolerated and left without a
    /// namespace; everything else a strict XML parser rejects is an error.
    pub fn parse(text: &str) -> Result<Self, XmlTreeError> {
        let mut reader = NsReader::from_str(text);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| XmlTreeError(e.to_string()))?;
            let namespace = namespace_uri(&resolved);

            match event {
                Event::Start(ref e) => {
                    stack.push(start_element(e, namespace)?);
                }
                Event::Empty(ref e) => {
                    let el = start_element(e, namespace)?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| XmlTreeError("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::Text(ref e) => {
                    let raw = String::from_utf8_lossy(e);
                    push_text(&mut stack, &decode_entities(&raw))?;
                }
                Event::CData(ref e) => {
                    let raw = String::from_utf8_lossy(e);
                    push_text(&mut stack, &raw)?;
                }
                // Feeds use HTML entities without declaring them. Known names
                // resolve from the HTML table, unknown ones stay verbatim.
                Event::GeneralRef(ref e) => {
                    let name = String::from_utf8_lossy(e);
                    let text = resolve_reference(&name).unwrap_or_else(|| format!("&{};", name));
                    push_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlTreeError(format!(
                "unclosed element <{}>",
                stack.last().map(|el| el.name.as_str()).unwrap_or_default()
            )));
        }

        root.map(|root| XmlDocument { root })
            .ok_or_else(|| XmlTreeError("document has no root element".to_string()))
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }
}

fn namespace_uri(resolved: &ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn start_element(e: &BytesStart<'_>, namespace: Option<String>) -> Result<XmlElement, XmlTreeError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let local_name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XmlTreeError(format!("bad attribute on <{}>: {}", name, err)))?;
        let raw = String::from_utf8_lossy(&attr.value);
        attributes.push(XmlAttribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: decode_entities(&raw),
        });
    }

    Ok(XmlElement {
        name,
        local_name,
        namespace,
        attributes,
        children: Vec::new(),
    })
}

/// Appends a finished element to its parent, or makes it the root.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> Result<(), XmlTreeError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(el));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(el);
            Ok(())
        }
        None => Err(XmlTreeError(format!("second root element <{}>", el.name))),
    }
}

/// Appends character data to the open element, merging adjacent text nodes.
fn push_text(stack: &mut [XmlElement], text: &str) -> Result<(), XmlTreeError> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(XmlNode::Text(prev)) = parent.children.last_mut() {
                prev.push_str(text);
            } else {
                parent.children.push(XmlNode::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlTreeError("text outside the root element".to_string())),
    }
}

impl XmlElement {
    /// Returns true if this element has the given local name and namespace.
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }

    /// Attribute value by qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Direct element children in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// All descendant elements (excluding `self`) in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// First descendant in document order matching `pred`.
    pub fn find<P>(&self, mut pred: P) -> Option<&XmlElement>
    where
        P: FnMut(&XmlElement) -> bool,
    {
        self.descendants().find(|el| pred(el))
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serializes the children of this element back to markup.
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }
}

fn collect_text(el: &XmlElement, out: &mut String) {
    for child in &el.children {
        match child {
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Element(e) => collect_text(e, out),
        }
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Text(t) => out.push_str(&escape_text(t)),
        XmlNode::Element(el) => {
            let _ = write!(out, "<{}", el.local_name);
            for attr in &el.attributes {
                if attr.name == "xmlns" || attr.name.starts_with("xmlns:") {
                    continue;
                }
                let _ = write!(out, " {}=\"{}\"", attr.name, escape_attr(&attr.value));
            }
            if el.children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in &el.children {
                write_node(child, out);
            }
            let _ = write!(out, "</{}>", el.local_name);
        }
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, XmlNode>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(XmlNode::Element(el)) => {
                    self.stack.push(el.children.iter());
                    return Some(el);
                }
                Some(XmlNode::Text(_)) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MRSS: &str = "http://search.yahoo.com/mrss/";

    #[test]
    fn parses_namespaces_and_attributes() {
        let doc = XmlDocument::parse(
            r#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel>
                <item><media:content url="a.png" medium="image"/></item>
            </channel></rss>"#,
        )
        .unwrap();

        let content = doc.root().find(|el| el.is(Some(MRSS), "content")).unwrap();
        assert_eq!(content.name, "media:content");
        assert_eq!(content.attr("url"), Some("a.png"));
        assert_eq!(content.attr("medium"), Some("image"));
    }

    #[test]
    fn text_content_merges_cdata_and_references() {
        let doc = XmlDocument::parse(
            "<t>Tom &amp; <![CDATA[<b>Jerry</b>]]> &#169; <i>x</i></t>",
        )
        .unwrap();
        assert_eq!(doc.root().text_content(), "Tom & <b>Jerry</b> © x");
    }

    #[test]
    fn undeclared_entities_are_resolved_leniently() {
        let doc = XmlDocument::parse("<t>a&nbsp;b &mdash; &bogus;</t>").unwrap();
        assert_eq!(doc.root().text_content(), "a\u{a0}b \u{2014} &bogus;");
    }

    #[test]
    fn descendants_are_in_document_order() {
        let doc = XmlDocument::parse("<a><b><c/></b><d/></a>").unwrap();
        let names: Vec<_> = doc
            .root()
            .descendants()
            .map(|el| el.local_name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn inner_xml_round_trips_markup() {
        let doc = XmlDocument::parse(
            r#"<content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p class="x">a &lt; b</p><br/></div></content>"#,
        )
        .unwrap();
        assert_eq!(
            doc.root().inner_xml(),
            r#"<div><p class="x">a &lt; b</p><br /></div>"#
        );
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(XmlDocument::parse("<rss><channel></rss>").is_err());
        assert!(XmlDocument::parse("<rss>").is_err());
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("just text").is_err());
        assert!(XmlDocument::parse("<a/><b/>").is_err());
    }

    #[test]
    fn tolerates_undeclared_prefixes() {
        let doc = XmlDocument::parse("<item><content:encoded>hi</content:encoded></item>").unwrap();
        let el = doc.root().find(|el| el.name == "content:encoded").unwrap();
        assert_eq!(el.namespace, None);
        assert_eq!(el.text_content(), "hi");
    }
}
