//! Finding the character encoding of raw HTML bytes.
//!
//! The tree builder only ever sees decoded text. This module picks the encoding from a
//! `<meta charset=...>` or `<meta content="...; charset=...">` declaration in the document head,
//! falling back to a default, and decodes the bytes with [`encoding_rs`].
use std::borrow::Cow;

use encoding_rs::CoderResult;
pub use encoding_rs::{Decoder, Encoding};

use crate::utils::{find_ignore_ascii_case, trace_log};

/// The encoding used when neither the caller nor the document declares one: ISO-8859-1, which
/// the WHATWG encoding standard maps to windows-1252.
pub fn default_encoding() -> &'static Encoding {
    encoding_rs::WINDOWS_1252
}

#[cfg(feature = "jetscii")]
fn find_tag_open(haystack: &[u8]) -> Option<usize> {
    jetscii::bytes!(b'<').find(haystack)
}

#[cfg(not(feature = "jetscii"))]
fn find_tag_open(haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|&b| b == b'<')
}

fn starts_with_ignore_ascii_case(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack
        .get(..prefix.len())
        .map_or(false, |start| start.eq_ignore_ascii_case(prefix))
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Extract the label following `charset=` inside the bytes of one tag.
fn charset_in_tag(mut tag: &[u8]) -> Option<&[u8]> {
    while let Some(index) = find_ignore_ascii_case(tag, b"charset") {
        tag = &tag[index + b"charset".len()..];

        let rest = skip_whitespace(tag);
        let rest = match rest.strip_prefix(b"=") {
            Some(rest) => skip_whitespace(rest),
            None => continue,
        };

        let rest = rest.strip_prefix(b"\"").or_else(|| rest.strip_prefix(b"'")).unwrap_or(rest);
        let end = rest
            .iter()
            .position(|b| matches!(b, b'"' | b'\'' | b';' | b'/' | b'>') || b.is_ascii_whitespace())
            .unwrap_or(rest.len());

        if end > 0 {
            return Some(&rest[..end]);
        }
    }

    None
}

/// Find the charset label declared by the first `<meta>` tag that has one, looking only at the
/// bytes before `</head>`.
///
/// ```
/// use htmlement::encoding::sniff_charset;
///
/// let html = br#"<html><head><META http-equiv="Content-Type" content="text/html; charset=Shift_JIS"></head>"#;
/// assert_eq!(sniff_charset(html), Some("Shift_JIS"));
/// assert_eq!(sniff_charset(b"<head></head><meta charset=utf-8>"), None);
/// ```
pub fn sniff_charset(bytes: &[u8]) -> Option<&str> {
    let mut pos = 0;
    while let Some(offset) = find_tag_open(&bytes[pos..]) {
        let start = pos + offset;
        let rest = &bytes[start..];

        if starts_with_ignore_ascii_case(rest, b"</head") {
            break;
        }

        if starts_with_ignore_ascii_case(rest, b"<meta") {
            let end = rest.iter().position(|&b| b == b'>').unwrap_or(rest.len());
            if let Some(label) = charset_in_tag(&rest[..end]) {
                return std::str::from_utf8(label).ok();
            }
        }

        pos = start + 1;
    }

    None
}

/// Pick the encoding for `bytes`: `explicit` if given, else the declared charset if
/// [`encoding_rs`] knows the label, else `fallback`.
pub fn resolve(bytes: &[u8], explicit: Option<&'static Encoding>, fallback: &'static Encoding) -> &'static Encoding {
    if let Some(encoding) = explicit {
        return encoding;
    }

    match sniff_charset(bytes) {
        Some(label) => match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => encoding,
            None => {
                trace_log!("unknown charset {:?}, using {}", label, fallback.name());
                fallback
            }
        },
        None => {
            trace_log!("no charset declared, using {}", fallback.name());
            fallback
        }
    }
}

/// Decode `bytes` into text, see [`resolve`]. The default fallback is [`default_encoding`].
///
/// A byte order mark takes precedence over any other source. Returns the text and the encoding
/// that was actually used. Malformed sequences become U+FFFD.
pub fn decode<'a>(bytes: &'a [u8], explicit: Option<&'static Encoding>) -> (Cow<'a, str>, &'static Encoding) {
    decode_with_fallback(bytes, explicit, default_encoding())
}

/// Like [`decode`] with a custom fallback encoding.
pub fn decode_with_fallback<'a>(
    bytes: &'a [u8],
    explicit: Option<&'static Encoding>,
    fallback: &'static Encoding,
) -> (Cow<'a, str>, &'static Encoding) {
    let encoding = resolve(bytes, explicit, fallback);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        trace_log!("malformed {} input replaced", used.name());
    }
    (text, used)
}

/// Create a streaming decoder for a document whose first bytes are `head`, see [`resolve`].
///
/// The decoder strips a byte order mark and switches to the encoding it names.
pub fn decoder_for(head: &[u8], explicit: Option<&'static Encoding>) -> Decoder {
    resolve(head, explicit, default_encoding()).new_decoder()
}

/// Decode one chunk of a byte stream. Sequences split across chunks are carried over inside
/// `decoder`. Pass `last` with the final chunk, which may be empty.
pub fn decode_chunk(decoder: &mut Decoder, mut bytes: &[u8], last: bool) -> String {
    let capacity = decoder
        .max_utf8_buffer_length(bytes.len())
        .unwrap_or(bytes.len());
    let mut text = String::with_capacity(capacity);

    loop {
        let (result, read, had_errors) = decoder.decode_to_string(bytes, &mut text, last);
        if had_errors {
            trace_log!("malformed {} input replaced", decoder.encoding().name());
        }
        bytes = &bytes[read..];

        match result {
            CoderResult::InputEmpty => return text,
            CoderResult::OutputFull => text.reserve(
                decoder
                    .max_utf8_buffer_length(bytes.len())
                    .unwrap_or(bytes.len())
                    .max(4),
            ),
        }
    }
}
