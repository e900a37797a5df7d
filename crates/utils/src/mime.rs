//! Helpers for carrying original MIME parts into a message built with
//! `lettre`.
//!
//! `lettre` serializes the outbound headers and the generated parts, but
//! forwarded parts must reach the recipient byte for byte, their own
//! headers and transfer encoding included. Those are spliced into the
//! serialized container right before its closing delimiter.

/// Strips a single trailing line break (`\r\n` or `\n`), which in a MIME
/// body belongs to the following boundary delimiter.
pub fn trim_line_break(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n")
        .or_else(|| data.strip_suffix(b"\n"))
        .unwrap_or(data)
}

/// Appends already serialized parts to a formatted multipart message.
///
/// `formatted` must end with the closing delimiter of `boundary`, the
/// parts are inserted before it in the given order. Returns `None` when
/// the delimiter is not where it is expected.
///
/// ```rust
/// let formatted = b"Subject: Hi\r\n\r\n--b\r\nfirst\r\n--b--\r\n".to_vec();
/// let data = mailrelay_utils::append_parts(formatted, "b", [&b"second"[..]]).unwrap();
/// assert_eq!(data, b"Subject: Hi\r\n\r\n--b\r\nfirst\r\n--b\r\nsecond\r\n--b--\r\n");
/// ```
pub fn append_parts<'a>(
    mut formatted: Vec<u8>,
    boundary: &str,
    parts: impl IntoIterator<Item = &'a [u8]>,
) -> Option<Vec<u8>> {
    let closing = format!("--{boundary}--\r\n");
    if !formatted.ends_with(closing.as_bytes()) {
        return None;
    }
    formatted.truncate(formatted.len() - closing.len());
    for part in parts {
        formatted.extend_from_slice(b"--");
        formatted.extend_from_slice(boundary.as_bytes());
        formatted.extend_from_slice(b"\r\n");
        formatted.extend_from_slice(part);
        formatted.extend_from_slice(b"\r\n");
    }
    formatted.extend_from_slice(closing.as_bytes());
    Some(formatted)
}

/// Returns the content of a display name written as a single RFC 5322
/// quoted-string, resolving its quoted pairs.
///
/// Anything else, including several quoted words next to each other, is
/// returned unchanged.
///
/// ```rust
/// assert_eq!(mailrelay_utils::unquote_phrase("\"Tom & Jerry\""), "Tom & Jerry");
/// assert_eq!(mailrelay_utils::unquote_phrase("\"Ann\" a@x.com;\"Bob\""), "\"Ann\" a@x.com;\"Bob\"");
/// ```
pub fn unquote_phrase(phrase: &str) -> String {
    let Some(inner) = phrase
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return phrase.to_string();
    };

    let mut unquoted = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => unquoted.push(escaped),
                None => return phrase.to_string(),
            },
            '"' => return phrase.to_string(),
            _ => unquoted.push(c),
        }
    }
    unquoted
}
