//! Core IMAP types.
//!
//! The value types exchanged with a [`Session`](crate::Session), following
//! RFC 9051 (`IMAP4rev2`), RFC 3501 (`IMAP4rev1`) and RFC 5256 (THREAD).

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod sequence;

pub use capability::{Capabilities, Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{Uid, UidValidity};
pub use mailbox::{ListResponse, MailboxAttribute, MailboxStatus, StatusItem};
pub use sequence::UidSet;
