//! # mailcli-imap
//!
//! The IMAP session boundary used by `mailcli-core`.
//!
//! This crate does not open sockets. A capability-complete client library is
//! wrapped behind the [`Session`] trait, and everything above it speaks in the
//! typed values defined here:
//!
//! - **Identifiers**: [`Uid`] and compressed [`UidSet`]s
//! - **Commands**: [`SearchCriteria`], [`FetchAttribute`], [`StoreAction`] and
//!   the raw [`ThreadCommand`] (RFC 5256)
//! - **Responses**: [`FetchedMessage`], [`Envelope`], [`MailboxStatus`],
//!   [`RawResponse`]
//! - **THREAD parsing**: [`parser::parse_thread_response`] turns the nested
//!   `* THREAD` payload into a [`ThreadNode`] forest that can be flattened
//!   into UID groups
//!
//! ## Example
//!
//! ```ignore
//! use mailcli_imap::{SearchCriteria, Session, ThreadCommand};
//!
//! async fn threads<S: Session>(session: &mut S) -> mailcli_imap::Result<()> {
//!     session.select("INBOX", true).await?;
//!     let command = ThreadCommand::new("REFERENCES", SearchCriteria::All);
//!     let response = session.execute(&command.to_string()).await?;
//!     let forest = mailcli_imap::parser::parse_thread_response(&response.untagged)?;
//!     for group in mailcli_imap::parser::flatten_groups(&forest) {
//!         println!("{group:?}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
mod envelope;
mod error;
pub mod parser;
mod session;
pub mod types;

pub use command::{FetchAttribute, Literal, SearchCriteria, StoreAction, ThreadCommand};
pub use envelope::{Address, Envelope, FetchedMessage};
pub use error::{Error, Result};
pub use parser::ThreadNode;
pub use session::{RawResponse, Session};
pub use types::{
    Capabilities, Capability, Flag, Flags, ListResponse, MailboxAttribute, MailboxStatus, Status,
    StatusItem, Uid, UidSet, UidValidity,
};
