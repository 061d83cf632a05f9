//! MIME message structure and part walking.

use std::fmt;

use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string. Unknown values are 7bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A MIME entity: headers plus either a body or child parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    headers: Headers,
    body: Vec<u8>,
    children: Vec<Part>,
}

impl Part {
    /// Parses one entity, recursing into multipart bodies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] if a multipart entity has no
    /// boundary parameter.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (header_block, body) = split_header_body(raw);
        let headers = Headers::parse(header_block);
        let mut part = Self {
            headers,
            body: body.to_vec(),
            children: Vec::new(),
        };

        let content_type = part.content_type();
        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            part.children = split_multipart(body, boundary)
                .into_iter()
                .map(Self::parse)
                .collect::<Result<_>>()?;
        }
        Ok(part)
    }

    /// Returns the part headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw, still transfer-encoded body.
    #[must_use]
    pub fn raw_body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the child parts of a multipart entity.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Gets the content type, defaulting to `text/plain` when the header is
    /// missing or unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(|| ContentType::new("text", "plain"))
    }

    /// Gets the content disposition, if any.
    #[must_use]
    pub fn disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns true if the part has `Content-Disposition: attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition()
            .is_some_and(|d| d.is_attachment())
    }

    /// Returns the part's filename from the disposition `filename`, or the
    /// content type `name` parameter as a fallback.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.disposition()
            .and_then(|d| d.filename())
            .or_else(|| {
                self.content_type()
                    .parameter("name")
                    .map(|n| crate::encoding::decode_rfc2047(n).trim().to_string())
                    .filter(|n| !n.is_empty())
            })
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if Base64 decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&self.body),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the decoded body as text in its declared charset.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        let content_type = self.content_type();
        Ok(decode_charset(&decoded, content_type.charset().unwrap_or("utf-8")))
    }

    /// Returns every non-multipart descendant in depth-first order. A
    /// single-part entity yields itself.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(part) = stack.pop() {
            if part.children.is_empty() && !part.content_type().is_multipart() {
                out.push(part);
            } else {
                stack.extend(part.children.iter().rev());
            }
        }
        out
    }
}

/// A parsed message: the top-level entity and its headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input or a multipart entity without a
    /// boundary.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::Parse("empty message".to_string()));
        }
        Ok(Self {
            root: Part::parse(raw)?,
        })
    }

    /// Returns the top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Returns a top-level header with RFC 2047 words decoded.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.root.headers.get_decoded(name)
    }

    /// Returns the top-level entity.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Returns every leaf part in depth-first order.
    #[must_use]
    pub fn parts(&self) -> Vec<&Part> {
        self.root.leaves()
    }

    /// Returns the parts with `Content-Disposition: attachment`.
    #[must_use]
    pub fn attachments(&self) -> Vec<&Part> {
        self.parts().into_iter().filter(|p| p.is_attachment()).collect()
    }

    /// Returns the decoded text of the first non-attachment part of the
    /// given text subtype (`plain`, `html`).
    ///
    /// Parts whose body fails to decode are skipped.
    #[must_use]
    pub fn first_text(&self, sub_type: &str) -> Option<String> {
        self.parts()
            .into_iter()
            .filter(|p| !p.is_attachment() && p.content_type().is("text", sub_type))
            .find_map(|p| p.body_text().ok())
    }
}

/// Splits at the first empty line. Input that starts with an empty line has
/// no headers; input without one is all headers.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut line_start = 0;
    while line_start < raw.len() {
        let line_end = raw[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |i| line_start + i + 1);
        let line = &raw[line_start..line_end];
        if line == b"\r\n" || line == b"\n" {
            return (&raw[..line_start], &raw[line_end..]);
        }
        line_start = line_end;
    }
    (raw, &[])
}

/// Returns the bodies between `--boundary` delimiter lines. The CRLF that
/// precedes a delimiter belongs to the delimiter. A missing close delimiter
/// ends the last part at the end of input.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut line_start = 0;

    while line_start < body.len() {
        let line_end = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| line_start + i + 1);
        let line = trim_line_end(&body[line_start..line_end]);

        if let Some(rest) = line.strip_prefix(delimiter) {
            let is_close = rest.starts_with(b"--");
            if rest.iter().all(|b| *b == b' ' || *b == b'\t') || is_close {
                if let Some(start) = part_start.take() {
                    parts.push(strip_trailing_newline(&body[start..line_start]));
                }
                if is_close {
                    return parts;
                }
                part_start = Some(line_end);
            }
        }
        line_start = line_end;
    }

    if let Some(start) = part_start {
        parts.push(&body[start.min(body.len())..]);
    }
    parts
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n'))
        .map_or(0, |i| i + 1);
    &line[..end]
}

fn strip_trailing_newline(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}
