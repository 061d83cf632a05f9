//! Error types for mailcli-core.

use mailcli_imap::Uid;
use thiserror::Error;

use crate::config::ValidationError;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport or session failure.
    #[error("IMAP error: {0}")]
    Imap(#[from] mailcli_imap::Error),

    /// The server returned no message for the UID.
    #[error("message {uid} not found in {mailbox}")]
    NotFound {
        /// Mailbox searched.
        mailbox: String,
        /// Requested UID.
        uid: Uid,
    },

    /// No THREAD algorithm is advertised, or the THREAD command failed.
    #[error("server does not support THREAD")]
    ThreadUnsupported,

    /// Input rejected before any network interaction.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// MIME parsing or decoding failed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailcli_mime::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered the fetch without the message body.
    #[error("body of message {uid} not available")]
    BodyUnavailable {
        /// Requested UID.
        uid: Uid,
    },

    /// Outbound transmission failed.
    #[error("transmit error: {0}")]
    Transmit(String),
}

impl Error {
    /// Returns true for [`Error::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`Error::ThreadUnsupported`], the signal to fall
    /// back to plain message listings.
    #[must_use]
    pub const fn is_thread_unsupported(&self) -> bool {
        matches!(self, Self::ThreadUnsupported)
    }
}

/// Result type alias using the core Error.
pub type Result<T> = std::result::Result<T, Error>;
