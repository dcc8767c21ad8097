// ABOUTME: Markup text helpers shared by the XML tree and the content sanitizer.
// ABOUTME: Provides entity decoding plus text/attribute escaping and element classification.

/// Named entities understood when decoding feed text.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{a0}"),
    ("ndash", "–"),
    ("mdash", "—"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201C}"),
    ("rdquo", "\u{201D}"),
    ("hellip", "…"),
    ("copy", "©"),
    ("reg", "®"),
    ("trade", "™"),
    ("bull", "•"),
    ("middot", "·"),
    ("deg", "°"),
    ("times", "×"),
    ("euro", "€"),
    ("pound", "£"),
];

/// Resolves the body of a single reference (`amp`, `#38`, `#x26`) to text.
pub fn resolve_reference(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, text)| (*text).to_string())
}

/// Decodes named and numeric entities in a single left-to-right pass.
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail
            .find(';')
            .filter(|&end| end > 0 && end <= 32)
            .and_then(|end| resolve_reference(&tail[..end]).map(|text| (text, end)));

        match decoded {
            Some((text, end)) => {
                result.push_str(&text);
                rest = &tail[end + 1..];
            }
            None => {
                result.push('&');
                rest = tail;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Escapes character data for HTML serialization.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Check if tag is void element
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose text children are serialized without escaping.
/// `plaintext` is left out: it has no end tag, so its text is escaped.
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "style" | "script" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities_named() {
        assert_eq!(decode_entities("&amp;"), "&");
        assert_eq!(decode_entities("&lt;&gt;"), "<>");
        assert_eq!(decode_entities("&quot;test&quot;"), "\"test\"");
        assert_eq!(decode_entities("&mdash;"), "—");
    }

    #[test]
    fn test_decode_entities_numeric() {
        assert_eq!(decode_entities("&#38;"), "&");
        assert_eq!(decode_entities("&#x26;"), "&");
        assert_eq!(decode_entities("&#169;"), "©");
        assert_eq!(decode_entities("&#xA9;"), "©");
    }

    #[test]
    fn test_decode_entities_single_pass() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&unknown; &#xZZ;"), "&unknown; &#xZZ;");
    }

    #[test]
    fn test_resolve_reference() {
        assert_eq!(resolve_reference("apos").as_deref(), Some("'"));
        assert_eq!(resolve_reference("#65").as_deref(), Some("A"));
        assert_eq!(resolve_reference("bogus"), None);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape_text("\u{a0}"), "&nbsp;");
    }

    #[test]
    fn test_element_classes() {
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("div"));
        assert!(is_raw_text_element("noscript"));
        assert!(!is_raw_text_element("textarea"));
        assert!(!is_raw_text_element("plaintext"));
    }
}
