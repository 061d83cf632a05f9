//! Multipart body writer.

use rand::Rng;

use crate::content_type::ContentType;
use crate::header::Headers;

/// Generates a random multipart boundary.
#[must_use]
pub fn generate_boundary() -> String {
    let mut bytes = [0u8; 15];
    rand::thread_rng().fill(&mut bytes);
    bytes.iter().fold(String::with_capacity(30), |mut acc, b| {
        use std::fmt::Write as _;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Writes the body of a multipart entity part by part.
///
/// The output is everything after the entity's own header block: each part
/// is introduced by `--boundary` and the body ends with `--boundary--`.
#[derive(Debug)]
pub struct MultipartWriter {
    boundary: String,
    buf: Vec<u8>,
    parts: usize,
}

impl MultipartWriter {
    /// Creates a writer with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Creates a writer with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buf: Vec::new(),
            parts: 0,
        }
    }

    /// Returns the boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the `multipart/<sub_type>` content type for this writer.
    #[must_use]
    pub fn content_type(&self, sub_type: &str) -> ContentType {
        ContentType::multipart(sub_type, self.boundary.clone())
    }

    /// Appends a part with the given headers and already-encoded body.
    pub fn add_part(&mut self, headers: &Headers, body: &[u8]) {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        self.buf.extend_from_slice(headers.to_string().as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        self.buf.extend_from_slice(body);
        self.parts += 1;
    }

    /// Writes the close delimiter and returns the body.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(b"\r\n--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"--\r\n");
        self.buf
    }
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}
