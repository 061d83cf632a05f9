//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable (RFC 2045), RFC 2047 encoded words and
//! charset conversion through `encoding_rs`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::{Encoding, UTF_8};
use std::fmt::Write as _;

use crate::error::Result;

/// Maximum encoded line length for Base64 and Quoted-Printable bodies.
pub const LINE_LENGTH: usize = 76;

/// Longest RFC 2047 encoded word allowed by the RFC.
const MAX_ENCODED_WORD: usize = 75;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into [`LINE_LENGTH`] character lines, each
/// terminated by CRLF.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_LENGTH * 2 + 2);
    for start in (0..encoded.len()).step_by(LINE_LENGTH) {
        let end = (start + LINE_LENGTH).min(encoded.len());
        out.push_str(&encoded[start..end]);
        out.push_str("\r\n");
    }
    out
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks become CRLF. Lines are soft-broken with `=` so that no
/// encoded line exceeds [`LINE_LENGTH`], and trailing spaces or tabs are
/// encoded so transports cannot strip them.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut lines = text.split('\n').peekable();

    while let Some(line) = lines.next() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        encode_qp_line(line.as_bytes(), &mut out);
        if lines.peek().is_some() {
            out.push_str("\r\n");
        }
    }
    out
}

fn encode_qp_line(line: &[u8], out: &mut String) {
    let mut width = 0;
    for (i, &byte) in line.iter().enumerate() {
        let is_last = i + 1 == line.len();
        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !is_last,
            _ => false,
        };
        let len = if literal { 1 } else { 3 };

        // Leave room for the trailing '=' of a soft break, unless this is the
        // final token of the line.
        let limit = if is_last { LINE_LENGTH } else { LINE_LENGTH - 1 };
        if width + len > limit {
            out.push_str("=\r\n");
            width = 0;
        }

        if literal {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        width += len;
    }
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Malformed escapes are kept literally rather than rejected, matching what
/// mail readers do with real-world input.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            out.push(byte);
            i += 1;
            continue;
        }

        // Soft line break, possibly with transport padding before it.
        let mut j = i + 1;
        while j < data.len() && (data[j] == b' ' || data[j] == b'\t') {
            j += 1;
        }
        if j == data.len() {
            i = j;
            continue;
        }
        if data[j] == b'\n' {
            i = j + 1;
            continue;
        }
        if data[j] == b'\r' && data.get(j + 1) == Some(&b'\n') {
            i = j + 2;
            continue;
        }

        match (
            data.get(i + 1).copied().and_then(hex_value),
            data.get(i + 2).copied().and_then(hex_value),
        ) {
            (Some(hi), Some(lo)) => {
                out.push((hi << 4) | lo);
                i += 3;
            }
            _ => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    out
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Encodes a header value using RFC 2047 `B` encoded words when it contains
/// anything other than printable ASCII.
///
/// Long values are split into several encoded words on character boundaries
/// and folded onto continuation lines.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    const PREFIX: &str = "=?utf-8?B?";
    const SUFFIX: &str = "?=";

    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !text.contains("=?") {
        return text.to_string();
    }

    // Each 3 input bytes become 4 output characters.
    let max_bytes = (MAX_ENCODED_WORD - PREFIX.len() - SUFFIX.len()) / 4 * 3;

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in text.chars() {
        if chunk.len() + c.len_utf8() > max_bytes {
            words.push(format!("{PREFIX}{}{SUFFIX}", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(format!("{PREFIX}{}{SUFFIX}", encode_base64(chunk.as_bytes())));
    }
    words.join("\r\n ")
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped, as the RFC
/// requires. Words that cannot be decoded are left untouched.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    if !text.contains("=?") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_gap: Option<&str> = None;

    while let Some(start) = rest.find("=?") {
        let before = &rest[..start];
        let Some((decoded, consumed)) = decode_encoded_word(&rest[start..]) else {
            if let Some(gap) = pending_gap.take() {
                out.push_str(gap);
            }
            out.push_str(&rest[..start + 2]);
            rest = &rest[start + 2..];
            continue;
        };

        match pending_gap.take() {
            // Only whitespace between two encoded words: drop it.
            Some(_) if before.trim().is_empty() => {}
            Some(gap) => {
                out.push_str(gap);
                out.push_str(before);
            }
            None => out.push_str(before),
        }
        out.push_str(&decoded);
        rest = &rest[start + consumed..];

        let gap_len = rest.len() - rest.trim_start().len();
        pending_gap = Some(&rest[..gap_len]);
        rest = &rest[gap_len..];
    }

    if let Some(gap) = pending_gap {
        out.push_str(gap);
    }
    out.push_str(rest);
    out
}

/// Decodes one `=?charset?enc?text?=` word at the start of `input`,
/// returning the text and the number of bytes consumed.
fn decode_encoded_word(input: &str) -> Option<(String, usize)> {
    let body = input.strip_prefix("=?")?;
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find("?=")?;
    let encoded = &body[..end];
    if encoded.contains(char::is_whitespace) || charset.is_empty() {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded.as_bytes()).ok()?,
        "Q" | "q" => decode_quoted_printable(encoded.replace('_', " ").as_bytes()),
        _ => return None,
    };
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    // Drop an RFC 2231 language suffix such as `utf-8*en`.
    let charset = charset.split('*').next().unwrap_or(charset);
    Some((decode_charset(&bytes, charset), consumed))
}

/// Decodes bytes in the named charset into a string, replacing anything
/// undecodable. Charset labels resolve through the WHATWG encoding
/// registry; unknown labels are treated as UTF-8.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    let encoding = Encoding::for_label_no_replacement(charset.trim().as_bytes()).unwrap_or(UTF_8);
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Decodes `%XX` escapes, as used by RFC 2231 extended parameters.
#[must_use]
pub fn decode_percent(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).copied().and_then(hex_value),
                bytes.get(i + 2).copied().and_then(hex_value),
            ) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
