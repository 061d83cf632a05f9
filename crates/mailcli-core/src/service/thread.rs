//! THREAD negotiation and thread listings.
//!
//! The negotiator reads the advertised `THREAD=<ALG>` capabilities, picks
//! an algorithm and runs `UID THREAD`. Its outcome keeps "not advertised"
//! and "advertised but failed" apart; the public listings report both as
//! [`Error::ThreadUnsupported`] so callers can fall back to message
//! listings.

use chrono::{DateTime, FixedOffset};
use mailcli_imap::parser::{flatten_groups, parse_thread_response};
use mailcli_imap::{
    Capabilities, Capability, Literal, SearchCriteria, Session, ThreadCommand, Uid,
};
use tracing::{debug, info, warn};

use super::query::{MessageSummary, Page, Pagination, fetch_summaries, query_page};
use super::session::{Connector, MailService};
use crate::error::{Error, Result};

/// Algorithms tried in order before falling back to the smallest name.
pub const PREFERRED_ALGORITHMS: [&str; 4] =
    ["REFERENCES", "REFS", "ORDEREDSUBJECT", "ORDERED-SUBJECT"];

/// Chooses a THREAD algorithm from the advertised capabilities.
///
/// Returns `None` when no algorithm is advertised.
#[must_use]
pub fn choose_algorithm(capabilities: &Capabilities) -> Option<String> {
    let advertised = capabilities.thread_algorithms();
    PREFERRED_ALGORITHMS
        .iter()
        .find(|preferred| advertised.contains(*preferred))
        .copied()
        .or_else(|| advertised.iter().min().copied())
        .map(ToString::to_string)
}

/// Outcome of a THREAD negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// No `THREAD=` capability was advertised; no command was sent.
    Unsupported,
    /// The command was sent and did not produce threads.
    Failed {
        /// Algorithm that was tried.
        algorithm: String,
        /// Why it failed.
        reason: String,
    },
    /// The command succeeded.
    Threads {
        /// Algorithm used.
        algorithm: String,
        /// One flat, deduplicated UID list per top-level thread, in
        /// server order.
        groups: Vec<Vec<Uid>>,
    },
}

impl Negotiation {
    /// Converts to the thread groups, mapping both failure states to
    /// [`Error::ThreadUnsupported`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadUnsupported`] unless threads were produced.
    pub fn into_groups(self) -> Result<Vec<Vec<Uid>>> {
        match self {
            Self::Threads { groups, .. } => Ok(groups),
            Self::Unsupported | Self::Failed { .. } => Err(Error::ThreadUnsupported),
        }
    }
}

/// Negotiates and runs `UID THREAD` in the selected mailbox.
///
/// Transport failures while reading capabilities propagate; anything that
/// goes wrong once the command has been chosen becomes
/// [`Negotiation::Failed`].
///
/// # Errors
///
/// Returns an error if the capability request fails.
pub async fn negotiate<S: Session>(
    session: &mut S,
    criteria: SearchCriteria,
) -> Result<Negotiation> {
    let capabilities = session.capabilities().await?;
    let Some(algorithm) = choose_algorithm(&capabilities) else {
        debug!("no THREAD capability advertised");
        return Ok(Negotiation::Unsupported);
    };

    let literal = if capabilities.has(&Capability::LiteralPlus) {
        Literal::NonSynchronizing
    } else {
        Literal::Synchronizing
    };
    let command = ThreadCommand::new(algorithm.clone(), criteria).with_literal(literal);
    debug!(%command, "sending THREAD");
    let response = match session.execute(&command.to_string()).await {
        Ok(response) => response,
        Err(e) => return Ok(failed(algorithm, e.to_string())),
    };
    if !response.status.is_ok() {
        return Ok(failed(algorithm, response.text));
    }

    match parse_thread_response(&response.untagged) {
        Ok(forest) => Ok(Negotiation::Threads {
            algorithm,
            groups: flatten_groups(&forest),
        }),
        Err(e) => Ok(failed(algorithm, e.to_string())),
    }
}

fn failed(algorithm: String, reason: String) -> Negotiation {
    warn!(%algorithm, %reason, "THREAD command failed");
    Negotiation::Failed { algorithm, reason }
}

/// Summary of a thread: its newest member stands in for the whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    /// Representative UID, the highest in the thread.
    pub uid: Uid,
    /// Number of messages in the thread.
    pub count: usize,
    /// Member UIDs in thread order.
    pub uids: Vec<Uid>,
    /// Subject of the representative message.
    pub subject: String,
    /// Sender of the representative message.
    pub from: String,
    /// Date of the representative message.
    pub date: Option<DateTime<FixedOffset>>,
}

/// A page of conversations: threads when the server can thread, messages
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversations {
    /// Thread summaries.
    Threads(Page<ThreadSummary>),
    /// Plain message summaries, used when threading is unavailable.
    Messages(Page<MessageSummary>),
}

impl Conversations {
    /// Returns the total number of threads or messages.
    #[must_use]
    pub const fn total(&self) -> usize {
        match self {
            Self::Threads(page) => page.total,
            Self::Messages(page) => page.total,
        }
    }
}

impl<C: Connector> MailService<C> {
    /// Lists a page of threads, newest thread first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadUnsupported`] when the server cannot thread,
    /// or another error if the session fails.
    pub async fn list_threads(
        &self,
        mailbox: &str,
        pagination: Pagination,
    ) -> Result<Page<ThreadSummary>> {
        self.query_threads(mailbox, SearchCriteria::All, pagination)
            .await
    }

    /// Lists a page of threads containing messages that match a full-text
    /// query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadUnsupported`] when the server cannot thread,
    /// or another error if the session fails.
    pub async fn search_threads(
        &self,
        mailbox: &str,
        query: &str,
        pagination: Pagination,
    ) -> Result<Page<ThreadSummary>> {
        self.query_threads(mailbox, SearchCriteria::from_query(Some(query)), pagination)
            .await
    }

    /// Lists threads, falling back to messages when the server cannot
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails.
    pub async fn list_conversations(
        &self,
        mailbox: &str,
        pagination: Pagination,
    ) -> Result<Conversations> {
        self.query_conversations(mailbox, SearchCriteria::All, pagination)
            .await
    }

    /// Searches threads, falling back to messages when the server cannot
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails.
    pub async fn search_conversations(
        &self,
        mailbox: &str,
        query: &str,
        pagination: Pagination,
    ) -> Result<Conversations> {
        self.query_conversations(mailbox, SearchCriteria::from_query(Some(query)), pagination)
            .await
    }

    async fn query_threads(
        &self,
        mailbox: &str,
        criteria: SearchCriteria,
        pagination: Pagination,
    ) -> Result<Page<ThreadSummary>> {
        let mut session = self.open().await?;
        let result = thread_page(&mut session, mailbox, criteria, pagination).await;
        self.close(session, result).await
    }

    async fn query_conversations(
        &self,
        mailbox: &str,
        criteria: SearchCriteria,
        pagination: Pagination,
    ) -> Result<Conversations> {
        let mut session = self.open().await?;
        let result = conversation_page(&mut session, mailbox, criteria, pagination).await;
        self.close(session, result).await
    }
}

async fn conversation_page<S: Session>(
    session: &mut S,
    mailbox: &str,
    criteria: SearchCriteria,
    pagination: Pagination,
) -> Result<Conversations> {
    match thread_page(session, mailbox, criteria.clone(), pagination).await {
        Ok(page) => Ok(Conversations::Threads(page)),
        Err(e) if e.is_thread_unsupported() => {
            info!(mailbox, "threading unavailable, listing messages");
            query_page(session, mailbox, &criteria, pagination)
                .await
                .map(Conversations::Messages)
        }
        Err(e) => Err(e),
    }
}

async fn thread_page<S: Session>(
    session: &mut S,
    mailbox: &str,
    criteria: SearchCriteria,
    pagination: Pagination,
) -> Result<Page<ThreadSummary>> {
    session.select(mailbox, true).await?;

    let mut threads: Vec<(Uid, Vec<Uid>)> = negotiate(session, criteria)
        .await?
        .into_groups()?
        .into_iter()
        .filter_map(|group| group.iter().max().copied().map(|newest| (newest, group)))
        .collect();
    threads.sort_unstable_by_key(|(newest, _)| *newest);
    let total = threads.len();

    let Some(window) = pagination.window(total) else {
        return Ok(Page::empty(total));
    };
    let selected = &threads[window];
    let representatives: Vec<Uid> = selected.iter().map(|(newest, _)| *newest).collect();
    let mut summaries = fetch_summaries(session, &representatives).await?;

    let items = selected
        .iter()
        .rev()
        .map(|(newest, group)| {
            let found = summaries
                .iter()
                .position(|s| s.uid == *newest)
                .map(|i| summaries.swap_remove(i));
            ThreadSummary {
                uid: *newest,
                count: group.len(),
                uids: group.clone(),
                subject: found.as_ref().map(|s| s.subject.clone()).unwrap_or_default(),
                from: found.as_ref().map(|s| s.from.clone()).unwrap_or_default(),
                date: found.and_then(|s| s.date),
            }
        })
        .collect();
    Ok(Page { items, total })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn caps(names: &[&str]) -> Capabilities {
        Capabilities::parse(names.iter().copied())
    }

    #[test]
    fn references_wins() {
        let chosen = choose_algorithm(&caps(&[
            "IMAP4rev1",
            "THREAD=ORDEREDSUBJECT",
            "THREAD=REFERENCES",
        ]));
        assert_eq!(chosen.as_deref(), Some("REFERENCES"));
    }

    #[test]
    fn preference_order() {
        assert_eq!(
            choose_algorithm(&caps(&["THREAD=ORDERED-SUBJECT", "THREAD=REFS"])).as_deref(),
            Some("REFS")
        );
        assert_eq!(
            choose_algorithm(&caps(&["THREAD=ORDERED-SUBJECT", "THREAD=ORDEREDSUBJECT"])).as_deref(),
            Some("ORDEREDSUBJECT")
        );
    }

    #[test]
    fn unknown_algorithms_pick_smallest() {
        assert_eq!(
            choose_algorithm(&caps(&["THREAD=ZEBRA", "THREAD=alpha"])).as_deref(),
            Some("ALPHA")
        );
    }

    #[test]
    fn nothing_advertised() {
        assert!(choose_algorithm(&caps(&[])).is_none());
        assert!(choose_algorithm(&caps(&["IMAP4rev1", "IDLE"])).is_none());
    }

    #[test]
    fn both_failure_states_are_unsupported() {
        assert!(Negotiation::Unsupported.into_groups().unwrap_err().is_thread_unsupported());
        let failed = Negotiation::Failed {
            algorithm: "REFERENCES".to_string(),
            reason: "BAD".to_string(),
        };
        assert!(failed.into_groups().unwrap_err().is_thread_unsupported());
    }
}
