//! Paginated message listing and search.
//!
//! Pages are computed from the count and sorted order of matching UIDs,
//! never from sequence numbers. Page 1 holds the newest messages.

use std::ops::Range;

use chrono::{DateTime, FixedOffset};
use mailcli_imap::{
    Address, FetchAttribute, FetchedMessage, Flags, SearchCriteria, Session, Uid, UidSet,
};
use mailcli_mime::encoding::decode_rfc2047;
use mailcli_mime::parse_date;
use tracing::{debug, warn};

use super::session::{Connector, MailService, fetch_messages};
use crate::error::Result;

/// Page size used when the caller passes zero.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A 1-based page request, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Pagination {
    /// Creates a page request. A zero page becomes 1 and a zero page size
    /// becomes [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub const fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the index range of this page within `total` items sorted
    /// oldest first, or `None` when the page lies past the end.
    ///
    /// Page 1 covers the last `page_size` items, page 2 the ones before,
    /// and the first page to reach index 0 is clamped there.
    #[must_use]
    pub const fn window(&self, total: usize) -> Option<Range<usize>> {
        let skipped = (self.page - 1).saturating_mul(self.page_size);
        if skipped >= total {
            return None;
        }
        let end = total - skipped;
        Some(end.saturating_sub(self.page_size)..end)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, newest first.
    pub items: Vec<T>,
    /// Number of matches across all pages.
    pub total: usize,
}

impl<T> Page<T> {
    pub(crate) const fn empty(total: usize) -> Self {
        Self {
            items: Vec::new(),
            total,
        }
    }
}

/// Summary of a message in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Unique identifier.
    pub uid: Uid,
    /// Message subject.
    pub subject: String,
    /// Sender display string.
    pub from: String,
    /// Date header, when parseable.
    pub date: Option<DateTime<FixedOffset>>,
    /// Size in bytes.
    pub size: u32,
    /// Message flags.
    pub flags: Flags,
}

impl MessageSummary {
    /// Builds a summary from a fetch record, or `None` when the record
    /// lacks a UID or an envelope.
    #[must_use]
    pub fn from_fetched(message: FetchedMessage) -> Option<Self> {
        let Some(uid) = message.uid else {
            warn!("skipping fetch record without UID");
            return None;
        };
        let Some(envelope) = message.envelope else {
            debug!(uid = %uid, "skipping fetch record without envelope");
            return None;
        };
        Some(Self {
            uid,
            subject: envelope
                .subject
                .as_deref()
                .map(decode_rfc2047)
                .unwrap_or_default(),
            from: format_addresses(&envelope.from),
            date: envelope.date.as_deref().and_then(parse_date),
            size: message.size.unwrap_or(0),
            flags: message.flags,
        })
    }
}

/// Joins envelope addresses as `Name <local@host>, ...`.
pub(crate) fn format_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(|a| {
            let mut address = a.clone();
            address.name = address.name.as_deref().map(decode_rfc2047);
            address.to_string()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl<C: Connector> MailService<C> {
    /// Lists a page of messages in a mailbox, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails at any step.
    pub async fn list_messages(
        &self,
        mailbox: &str,
        pagination: Pagination,
    ) -> Result<Page<MessageSummary>> {
        self.query_messages(mailbox, SearchCriteria::All, pagination)
            .await
    }

    /// Lists a page of messages matching a full-text query, newest first.
    ///
    /// A blank query matches every message.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails at any step.
    pub async fn search_messages(
        &self,
        mailbox: &str,
        query: &str,
        pagination: Pagination,
    ) -> Result<Page<MessageSummary>> {
        self.query_messages(mailbox, SearchCriteria::from_query(Some(query)), pagination)
            .await
    }

    async fn query_messages(
        &self,
        mailbox: &str,
        criteria: SearchCriteria,
        pagination: Pagination,
    ) -> Result<Page<MessageSummary>> {
        let mut session = self.open().await?;
        let result = query_page(&mut session, mailbox, &criteria, pagination).await;
        self.close(session, result).await
    }
}

/// Runs the search-window-fetch sequence on an open session.
pub(crate) async fn query_page<S: Session>(
    session: &mut S,
    mailbox: &str,
    criteria: &SearchCriteria,
    pagination: Pagination,
) -> Result<Page<MessageSummary>> {
    session.select(mailbox, true).await?;

    let mut uids = session.uid_search(criteria).await?;
    uids.sort_unstable();
    let total = uids.len();

    let Some(window) = pagination.window(total) else {
        debug!(mailbox, total, page = pagination.page(), "page past end");
        return Ok(Page::empty(total));
    };
    debug!(mailbox, total, start = window.start, end = window.end, "window computed");

    let items = fetch_summaries(session, &uids[window]).await?;
    Ok(Page { items, total })
}

/// Fetches summaries for the given UIDs, sorted strictly newest first.
pub(crate) async fn fetch_summaries<S: Session>(
    session: &mut S,
    uids: &[Uid],
) -> Result<Vec<MessageSummary>> {
    let Some(set) = UidSet::from_uids(uids) else {
        return Ok(Vec::new());
    };
    let mut summaries: Vec<MessageSummary> =
        fetch_messages(session, &set, &FetchAttribute::SUMMARY)
            .await?
            .into_iter()
            .filter_map(MessageSummary::from_fetched)
            .collect();
    summaries.sort_unstable_by(|a, b| b.uid.cmp(&a.uid));
    summaries.dedup_by_key(|s| s.uid);
    Ok(summaries)
}
