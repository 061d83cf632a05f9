//! The transport session seam.

use std::future::Future;

use tokio::sync::mpsc;

use crate::command::{FetchAttribute, SearchCriteria, StoreAction};
use crate::envelope::FetchedMessage;
use crate::error::Result;
use crate::types::{Capabilities, Flag, ListResponse, MailboxStatus, Status, StatusItem, Uid, UidSet};

/// Result of a raw command sent through [`Session::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status of the tagged completion response.
    pub status: Status,
    /// Human-readable text of the tagged completion response.
    pub text: String,
    /// Untagged response lines received before completion, without CRLF.
    pub untagged: Vec<Vec<u8>>,
}

impl RawResponse {
    /// Creates a successful response carrying the given untagged lines.
    #[must_use]
    pub fn ok(untagged: Vec<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            text: "completed".to_string(),
            untagged,
        }
    }
}

/// An authenticated IMAP session.
///
/// Implementations wrap a client library that owns the connection, TLS and
/// login. A session is opened per top-level operation and ended with
/// [`Session::logout`]. Methods that operate on messages act on the mailbox
/// most recently passed to [`Session::select`].
pub trait Session: Send {
    /// Returns the capability set advertised by the server.
    fn capabilities(&mut self) -> impl Future<Output = Result<Capabilities>> + Send;

    /// Selects a mailbox, read-only when `read_only` is set (EXAMINE).
    fn select(
        &mut self,
        mailbox: &str,
        read_only: bool,
    ) -> impl Future<Output = Result<MailboxStatus>> + Send;

    /// Requests status items for a mailbox without selecting it.
    fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusItem],
    ) -> impl Future<Output = Result<MailboxStatus>> + Send;

    /// Lists mailboxes matching `pattern` under `reference`.
    fn list(
        &mut self,
        reference: &str,
        pattern: &str,
    ) -> impl Future<Output = Result<Vec<ListResponse>>> + Send;

    /// Creates a mailbox.
    fn create(&mut self, mailbox: &str) -> impl Future<Output = Result<()>> + Send;

    /// Searches the selected mailbox and returns matching UIDs in server
    /// order.
    fn uid_search(
        &mut self,
        criteria: &SearchCriteria,
    ) -> impl Future<Output = Result<Vec<Uid>>> + Send;

    /// Fetches `items` for every UID in `uids`, sending each message to `tx`
    /// as it arrives.
    ///
    /// The future resolves once the server completes the command. Delivery
    /// order is not guaranteed to match UID order. Implementations stop
    /// sending once `tx` is closed.
    fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: &[FetchAttribute],
        tx: mpsc::Sender<FetchedMessage>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Changes flags on the given UIDs.
    fn uid_store(
        &mut self,
        uids: &UidSet,
        action: &StoreAction,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Copies the given UIDs to another mailbox.
    fn uid_copy(&mut self, uids: &UidSet, mailbox: &str)
    -> impl Future<Output = Result<()>> + Send;

    /// Moves the given UIDs to another mailbox (RFC 6851).
    fn uid_move(&mut self, uids: &UidSet, mailbox: &str)
    -> impl Future<Output = Result<()>> + Send;

    /// Permanently removes messages flagged `\Deleted`.
    fn expunge(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Appends a message to a mailbox with the given flags.
    fn append(
        &mut self,
        mailbox: &str,
        flags: &[Flag],
        message: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Sends a raw command line and collects its untagged responses.
    ///
    /// The command may carry literals (`{N}\r\n` or `{N+}\r\n` followed
    /// by N bytes). The session sends a synchronizing literal only after the
    /// server's `+` continuation.
    ///
    /// A NO or BAD completion is reported in [`RawResponse::status`], not as
    /// an error; `Err` means the command could not be exchanged at all.
    fn execute(&mut self, command: &str) -> impl Future<Output = Result<RawResponse>> + Send;

    /// Logs out and closes the connection.
    fn logout(&mut self) -> impl Future<Output = Result<()>> + Send;
}
