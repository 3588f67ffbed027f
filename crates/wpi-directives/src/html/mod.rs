//! Minimal HTML tag scanning.
//!
//! Just enough tokenization to find start tags, read and rewrite their
//! attributes, and track element nesting. Everything the scanner does not
//! understand passes through as text.

mod scanner;
mod tag;

use std::borrow::Cow;

pub use scanner::{Scanner, Token};
pub use tag::{Attribute, Tag};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text (no tags inside).
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Whether `name` (lower-case) is a void element.
#[must_use]
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub(crate) fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// Escape a string for use inside a double-quoted attribute value.
///
/// # Example
///
/// ```
/// use wpi_directives::html::escape_html;
///
/// assert_eq!(escape_html(r#"a "b" & <c>"#), "a &quot;b&quot; &amp; &lt;c&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '"', '<', '>']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Decode character references in an attribute value.
///
/// Handles the named references that matter for attribute values and all
/// numeric references. Unknown references are kept verbatim.
#[must_use]
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        if let Some((c, len)) = decode_entity(rest) {
            out.push(c);
            rest = &rest[len..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode one reference at the start of `s` (which begins with `&`).
fn decode_entity(s: &str) -> Option<(char, usize)> {
    const MAX_ENTITY_LEN: usize = 10;

    let semi = s.find(';').filter(|&i| i <= MAX_ENTITY_LEN)?;
    let entity = &s[1..semi];
    let c = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some((c, semi + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_borrowed_when_clean() {
        assert!(matches!(escape_html("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_decode_named_entities() {
        assert_eq!(
            decode_entities("{&quot;a&quot;: &lt;1&gt; &amp; 2}"),
            r#"{"a": <1> & 2}"#
        );
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entities("&#39;x&#x27;"), "'x'");
    }

    #[test]
    fn test_decode_unknown_entity_kept() {
        assert_eq!(decode_entities("a &bogus; b & c"), "a &bogus; b & c");
    }

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("input"));
        assert!(is_void_element("br"));
        assert!(!is_void_element("div"));
    }
}
