//! # mailcli-core
//!
//! Mail client core: the logic between a command surface and an IMAP
//! session.
//!
//! This crate provides:
//! - **Query Engine** - newest-first pages of message summaries, listing or
//!   searching
//! - **Thread Negotiator** - THREAD algorithm selection with a clean
//!   fallback to plain listings
//! - **Message Access** - display detail and raw bytes for one UID
//! - **Compose Engine** - RFC 5322 messages with quoted-printable text and
//!   base64 attachments
//! - **Reply Engine** - threading headers, recipients, subject and quoting
//! - **Attachment Extractor** - collision-safe saving to disk
//! - Drafts, sending and mailbox administration
//!
//! The session itself comes from a [`Connector`]; outbound delivery goes
//! through a [`Transmitter`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod config;
mod error;
pub mod service;

pub use compose::{ComposeInput, ReplyInfo, build_message, extract_reply_info};
pub use config::{Account, ImapConfig, Security, SmtpConfig, ValidationError};
pub use error::{Error, Result};
pub use service::{
    Connector, Conversations, MailService, MailboxCounts, MessageDetail, MessageSummary,
    OutgoingRequest, Page, Pagination, PreparedMessage, ReplyTarget, ThreadSummary, Transmitter,
};
