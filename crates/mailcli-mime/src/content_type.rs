//! MIME content type and content disposition handling.

use std::fmt;
use std::path::Path;

use crate::encoding::{decode_charset, decode_percent, decode_rfc2047};
use crate::error::{Error, Result};

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart"), lowercase.
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg"), lowercase.
    pub sub_type: String,
    /// Parameters in header order, names lowercase.
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into().to_lowercase(),
            sub_type: sub_type.into().to_lowercase(),
            parameters: Vec::new(),
        }
    }

    /// Creates a `text/plain; charset="utf-8"` content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a `text/html; charset="utf-8"` content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Creates a multipart content type (`mixed`, `alternative`, ...) with
    /// a boundary.
    #[must_use]
    pub fn multipart(sub_type: &str, boundary: impl Into<String>) -> Self {
        Self::new("multipart", sub_type).with_parameter("boundary", boundary)
    }

    /// Guesses the content type from a file extension, falling back to
    /// `application/octet-stream`.
    #[must_use]
    pub fn guess_from_path(path: &Path) -> Self {
        let guessed = mime_guess::from_path(path).first_or_octet_stream();
        Self::new(guessed.type_().as_str(), guessed.subtype().as_str())
    }

    /// Adds or replaces a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        set_parameter(&mut self.parameters, key.into(), value.into());
        self
    }

    /// Returns a parameter value by case-insensitive name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        find_parameter(&self.parameters, name)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns true for the given type and subtype.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type == main_type && self.sub_type == sub_type
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted; value"`.
    /// RFC 2231 extended and continued parameters are merged.
    ///
    /// # Errors
    ///
    /// Returns an error if the `type/subtype` part is missing or empty.
    pub fn parse(s: &str) -> Result<Self> {
        let (essence, parameters) = split_header_value(s);
        let (main_type, sub_type) = essence
            .split_once('/')
            .map(|(m, s)| (m.trim(), s.trim()))
            .filter(|(m, s)| !m.is_empty() && !s.is_empty())
            .ok_or_else(|| Error::InvalidContentType(s.trim().to_string()))?;

        Ok(Self {
            main_type: main_type.to_lowercase(),
            sub_type: sub_type.to_lowercase(),
            parameters,
        })
    }
}

/// Writes `type/subtype; key="value"` with every parameter quoted.
impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        write_parameters(f, &self.parameters)
    }
}

/// Content-Disposition header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type (`inline`, `attachment`, ...), lowercase.
    pub kind: String,
    /// Parameters in header order, names lowercase.
    pub parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Creates an `attachment` disposition with a filename.
    #[must_use]
    pub fn attachment(filename: impl Into<String>) -> Self {
        let mut parameters = Vec::new();
        set_parameter(&mut parameters, "filename".to_string(), filename.into());
        Self {
            kind: "attachment".to_string(),
            parameters,
        }
    }

    /// Parses a Content-Disposition value. Never fails: an empty type is
    /// kept empty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (kind, parameters) = split_header_value(s);
        Self {
            kind: kind.trim().to_lowercase(),
            parameters,
        }
    }

    /// Returns true for the `attachment` disposition type.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind == "attachment"
    }

    /// Returns the decoded `filename` parameter if present and non-blank.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        find_parameter(&self.parameters, "filename")
            .map(|v| decode_rfc2047(v).trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)?;
        write_parameters(f, &self.parameters)
    }
}

fn find_parameter<'a>(parameters: &'a [(String, String)], name: &str) -> Option<&'a str> {
    parameters
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn set_parameter(parameters: &mut Vec<(String, String)>, key: String, value: String) {
    let key = key.to_lowercase();
    match parameters.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => parameters.push((key, value)),
    }
}

fn write_parameters(f: &mut fmt::Formatter<'_>, parameters: &[(String, String)]) -> fmt::Result {
    for (key, value) in parameters {
        write!(f, "; {key}=\"")?;
        for c in value.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("\"")?;
    }
    Ok(())
}

/// One parameter segment of an RFC 2231 split or extended parameter.
struct Section {
    name: String,
    index: u32,
    extended: bool,
    value: String,
}

/// Splits `value; a=b; c="d"` into the leading value and its parameters.
fn split_header_value(s: &str) -> (&str, Vec<(String, String)>) {
    let segments = split_unquoted(s, ';');
    let mut iter = segments.into_iter();
    let head = iter.next().unwrap_or("");

    let mut plain: Vec<(String, String)> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();

    for segment in iter {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = unquote(value.trim());
        if key.is_empty() {
            continue;
        }

        let (base, extended) = key
            .strip_suffix('*')
            .map_or((key.as_str(), false), |b| (b, true));
        if let Some((name, index)) = base
            .rsplit_once('*')
            .and_then(|(n, i)| i.parse::<u32>().ok().map(|i| (n, i)))
        {
            sections.push(Section {
                name: name.to_string(),
                index,
                extended,
                value,
            });
        } else if extended {
            sections.push(Section {
                name: base.to_string(),
                index: 0,
                extended: true,
                value,
            });
        } else {
            set_parameter(&mut plain, key, value);
        }
    }

    for (name, value) in merge_sections(sections) {
        set_parameter(&mut plain, name, value);
    }
    (head.trim(), plain)
}

/// Joins RFC 2231 sections per parameter name and decodes them.
fn merge_sections(mut sections: Vec<Section>) -> Vec<(String, String)> {
    sections.sort_by(|a, b| a.name.cmp(&b.name).then(a.index.cmp(&b.index)));

    let mut merged = Vec::new();
    let mut iter = sections.into_iter().peekable();
    while let Some(first) = iter.next() {
        let name = first.name.clone();
        let mut charset = String::from("utf-8");
        let mut bytes = Vec::new();

        let mut section = Some(first);
        while let Some(current) = section {
            if current.extended {
                let mut value = current.value.as_str();
                if current.index == 0 {
                    // charset'language'percent-encoded
                    let mut pieces = value.splitn(3, '\'');
                    if let (Some(cs), Some(_lang), Some(rest)) =
                        (pieces.next(), pieces.next(), pieces.next())
                    {
                        if !cs.is_empty() {
                            charset = cs.to_string();
                        }
                        value = rest;
                    }
                }
                bytes.extend(decode_percent(value));
            } else {
                bytes.extend_from_slice(current.value.as_bytes());
            }
            section = iter.next_if(|next| next.name == name);
        }
        merged.push((name, decode_charset(&bytes, &charset)));
    }
    merged
}

/// Splits on `sep` outside double-quoted strings.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .map(|v| v.strip_suffix('"').unwrap_or(v))
    else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
