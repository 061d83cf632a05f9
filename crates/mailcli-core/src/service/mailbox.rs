//! Mailbox administration and message mutation.

use mailcli_imap::{Flag, MailboxStatus, Session, StatusItem, StoreAction, Uid, UidSet};
use tracing::{debug, info, warn};

use super::session::{Connector, MailService};
use crate::error::Result;

/// Message and unseen counts for a mailbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxCounts {
    /// Number of messages.
    pub messages: u32,
    /// Number of messages without `\Seen`.
    pub unseen: u32,
}

impl From<&MailboxStatus> for MailboxCounts {
    fn from(status: &MailboxStatus) -> Self {
        Self {
            messages: status.exists,
            unseen: status.unseen.unwrap_or(0),
        }
    }
}

impl<C: Connector> MailService<C> {
    /// Returns message and unseen counts without selecting the mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails.
    pub async fn status(&self, mailbox: &str) -> Result<MailboxCounts> {
        let mut session = self.open().await?;
        let result = session
            .status(mailbox, &[StatusItem::Messages, StatusItem::Unseen])
            .await
            .map(|status| MailboxCounts::from(&status))
            .map_err(Into::into);
        self.close(session, result).await
    }

    /// Lists every mailbox name.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails.
    pub async fn list_mailboxes(&self) -> Result<Vec<String>> {
        let mut session = self.open().await?;
        let result = session
            .list("", "*")
            .await
            .map(|mailboxes| mailboxes.into_iter().map(|m| m.name).collect())
            .map_err(Into::into);
        self.close(session, result).await
    }

    /// Creates a mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails or the server refuses.
    pub async fn create_mailbox(&self, name: &str) -> Result<()> {
        let mut session = self.open().await?;
        let result = session.create(name).await.map_err(Into::into);
        self.close(session, result).await
    }

    /// Flags a message `\Deleted` and expunges the mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails.
    pub async fn delete_message(&self, mailbox: &str, uid: Uid) -> Result<()> {
        let mut session = self.open().await?;
        let result = delete_in(&mut session, mailbox, uid).await;
        self.close(session, result).await
    }

    /// Moves a message to another mailbox.
    ///
    /// Uses UID MOVE and falls back to copy, flag and expunge when the
    /// server rejects it.
    ///
    /// # Errors
    ///
    /// Returns an error if both strategies fail.
    pub async fn move_message(&self, mailbox: &str, uid: Uid, destination: &str) -> Result<()> {
        let mut session = self.open().await?;
        let result = move_in(&mut session, mailbox, uid, destination).await;
        self.close(session, result).await
    }

    /// Adds a keyword flag to a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails.
    pub async fn add_tag(&self, mailbox: &str, uid: Uid, tag: &str) -> Result<()> {
        let mut session = self.open().await?;
        let result = tag_in(&mut session, mailbox, uid, tag).await;
        self.close(session, result).await
    }

    /// Appends a raw message to the drafts mailbox with the `\Draft` flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails.
    pub async fn save_draft(&self, raw: &[u8]) -> Result<()> {
        let drafts = self.drafts_mailbox();
        let mut session = self.open().await?;
        let result = session
            .append(drafts, &[Flag::Draft], raw)
            .await
            .map_err(Into::into);
        let result = self.close(session, result).await;
        if result.is_ok() {
            info!(mailbox = drafts, bytes = raw.len(), "draft saved");
        }
        result
    }

    /// Returns the configured drafts mailbox, `Drafts` when blank.
    pub(crate) fn drafts_mailbox(&self) -> &str {
        let configured = self.account().defaults.drafts_mailbox.trim();
        if configured.is_empty() {
            "Drafts"
        } else {
            configured
        }
    }
}

fn deleted() -> StoreAction {
    StoreAction::AddFlags(vec![Flag::Deleted])
}

async fn delete_in<S: Session>(session: &mut S, mailbox: &str, uid: Uid) -> Result<()> {
    session.select(mailbox, false).await?;
    session.uid_store(&UidSet::single(uid), &deleted()).await?;
    session.expunge().await?;
    debug!(mailbox, uid = %uid, "message deleted");
    Ok(())
}

async fn move_in<S: Session>(
    session: &mut S,
    mailbox: &str,
    uid: Uid,
    destination: &str,
) -> Result<()> {
    session.select(mailbox, false).await?;
    let set = UidSet::single(uid);
    match session.uid_move(&set, destination).await {
        Ok(()) => return Ok(()),
        Err(e) => warn!(error = %e, "UID MOVE failed, copying instead"),
    }
    session.uid_copy(&set, destination).await?;
    session.uid_store(&set, &deleted()).await?;
    session.expunge().await?;
    Ok(())
}

async fn tag_in<S: Session>(session: &mut S, mailbox: &str, uid: Uid, tag: &str) -> Result<()> {
    session.select(mailbox, false).await?;
    let action = StoreAction::AddFlags(vec![Flag::Keyword(tag.to_string())]);
    session.uid_store(&UidSet::single(uid), &action).await?;
    Ok(())
}
