//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Multipart entity without a boundary parameter.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Input is not a message at all.
    #[error("Parse error: {0}")]
    Parse(String),
}
