//! Markup Escaping
//!
//! Encodes the characters that cannot appear literally in markup:
//! - Text content: `&` `<` `>`
//! - Attribute values: `&` `<` `"` plus tab and line breaks
//!
//! Uses Cow for zero-copy when nothing needs escaping.

use memchr::memchr3;
use std::borrow::Cow;

/// Escape text content
///
/// Returns Borrowed if the input needs no escaping (zero-copy),
/// returns Owned otherwise.
#[inline]
pub fn escape_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if there is anything to escape using SIMD
    if memchr3(b'&', b'<', b'>', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(escape_with(input, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    }))
}

/// Escape an attribute value for a double-quoted attribute
#[inline]
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if memchr3(b'&', b'<', b'"', bytes).is_none() && memchr3(b'\t', b'\n', b'\r', bytes).is_none()
    {
        return Cow::Borrowed(input);
    }
    Cow::Owned(escape_with(input, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    }))
}

fn escape_with(input: &str, replace: impl Fn(char) -> Option<&'static str>) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8 + 8);
    for c in input.chars() {
        match replace(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_escape_borrowed() {
        assert!(matches!(escape_text("plain"), Cow::Borrowed("plain")));
        assert!(matches!(escape_attribute("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        // Quotes are literal in text
        assert_eq!(escape_text("\"q\""), "\"q\"");
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("say \"hi\" & go"), "say &quot;hi&quot; &amp; go");
        assert_eq!(escape_attribute("a\nb"), "a&#xA;b");
        // > is legal inside attribute values
        assert_eq!(escape_attribute("a>b"), "a>b");
    }
}
