//! Session lifecycle and the streamed fetch.

use std::future::Future;

use mailcli_imap::{FetchAttribute, FetchedMessage, Session, Uid, UidSet};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::{Account, ImapConfig};
use crate::error::{Error, Result};

/// Capacity of the queue between a fetch producer and its consumer.
const FETCH_QUEUE_DEPTH: usize = 64;

/// Opens authenticated sessions.
///
/// Implementations wrap a client library's dial, TLS and login sequence.
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Session: Session;

    /// Connects and authenticates with the given configuration.
    fn connect(
        &self,
        config: &ImapConfig,
    ) -> impl Future<Output = mailcli_imap::Result<Self::Session>> + Send;
}

/// Entry point for every mailbox operation.
///
/// Each operation opens its own session through the connector and logs
/// out before returning, on success and on error alike. Nothing is shared
/// between operations.
#[derive(Debug, Clone)]
pub struct MailService<C> {
    connector: C,
    account: Account,
}

impl<C: Connector> MailService<C> {
    /// Creates a service for an account.
    #[must_use]
    pub fn new(connector: C, account: Account) -> Self {
        Self { connector, account }
    }

    /// Returns the account.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Returns the connector.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    pub(crate) async fn open(&self) -> Result<C::Session> {
        debug!(host = %self.account.imap.host, "opening session");
        Ok(self.connector.connect(&self.account.imap).await?)
    }

    /// Logs the session out and hands back the operation's result. A failed
    /// logout never masks the result.
    pub(crate) async fn close<T>(&self, mut session: C::Session, result: Result<T>) -> Result<T> {
        if let Err(e) = session.logout().await {
            warn!(error = %e, "logout failed");
        }
        debug!(ok = result.is_ok(), "session closed");
        result
    }
}

/// Runs a UID FETCH and collects every delivered message.
///
/// The producer and the draining consumer run together; the producer's
/// result is inspected only after the queue is empty, so an error
/// mid-stream discards whatever was already received.
pub(crate) async fn fetch_messages<S: Session>(
    session: &mut S,
    uids: &UidSet,
    items: &[FetchAttribute],
) -> Result<Vec<FetchedMessage>> {
    let (tx, mut rx) = mpsc::channel(FETCH_QUEUE_DEPTH);
    let producer = session.uid_fetch(uids, items, tx);
    let consumer = async {
        let mut received = Vec::new();
        while let Some(message) = rx.recv().await {
            received.push(message);
        }
        received
    };

    let (status, received) = tokio::join!(producer, consumer);
    status?;
    debug!(uids = %uids, count = received.len(), "fetch complete");
    Ok(received)
}

/// Fetches a single message, failing with [`Error::NotFound`] when the
/// server returns nothing for the UID.
pub(crate) async fn fetch_one<S: Session>(
    session: &mut S,
    mailbox: &str,
    uid: Uid,
    items: &[FetchAttribute],
) -> Result<FetchedMessage> {
    fetch_messages(session, &UidSet::single(uid), items)
        .await?
        .into_iter()
        .find(|m| m.uid.is_none_or(|u| u == uid))
        .ok_or_else(|| Error::NotFound {
            mailbox: mailbox.to_string(),
            uid,
        })
}

/// Selects a mailbox and fetches one message's full bytes.
pub(crate) async fn fetch_raw_in<S: Session>(
    session: &mut S,
    mailbox: &str,
    uid: Uid,
) -> Result<Vec<u8>> {
    session.select(mailbox, true).await?;
    let message = fetch_one(session, mailbox, uid, &FetchAttribute::RAW).await?;
    message.body.ok_or(Error::BodyUnavailable { uid })
}
