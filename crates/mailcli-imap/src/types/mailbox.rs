//! Mailbox types.

use super::{Flags, Uid, UidValidity};

/// Mailbox state reported by SELECT/EXAMINE or STATUS.
///
/// STATUS only fills the items that were requested; the rest stay at their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Number of messages without `\Seen`.
    pub unseen: Option<u32>,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    /// Whether the mailbox was opened read-only.
    pub read_only: bool,
}

/// Item requested by a STATUS command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusItem {
    /// Number of messages.
    Messages,
    /// Number of recent messages.
    Recent,
    /// Next UID.
    UidNext,
    /// UIDVALIDITY.
    UidValidity,
    /// Number of unseen messages.
    Unseen,
}

impl StatusItem {
    /// Returns the item name as written in a STATUS command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
        }
    }
}

impl std::fmt::Display for StatusItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LIST response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub name: String,
}

impl ListResponse {
    /// Returns true unless the mailbox carries `\Noselect`.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.attributes.contains(&MailboxAttribute::NoSelect)
    }
}

/// Mailbox attributes from LIST response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox has children.
    HasChildren,
    // RFC 6154 SPECIAL-USE
    /// All messages (virtual mailbox).
    All,
    /// Archive folder.
    Archive,
    /// Drafts folder.
    Drafts,
    /// Junk/spam folder.
    Junk,
    /// Sent folder.
    Sent,
    /// Trash folder.
    Trash,
    /// Unknown attribute.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses a mailbox attribute string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\NOSELECT" | "\\NONEXISTENT" => Self::NoSelect,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\ALL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            _ => Self::Unknown(s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_empty() {
        let status = MailboxStatus::default();
        assert_eq!(status.exists, 0);
        assert!(status.unseen.is_none());
        assert!(status.flags.is_empty());
        assert!(!status.read_only);
    }

    #[test]
    fn status_item_names() {
        assert_eq!(StatusItem::Messages.to_string(), "MESSAGES");
        assert_eq!(StatusItem::Unseen.as_str(), "UNSEEN");
    }

    #[test]
    fn attribute_parse() {
        assert_eq!(MailboxAttribute::parse("\\Drafts"), MailboxAttribute::Drafts);
        assert_eq!(MailboxAttribute::parse("\\Spam"), MailboxAttribute::Junk);
        assert_eq!(
            MailboxAttribute::parse("\\Custom"),
            MailboxAttribute::Unknown("\\Custom".to_string())
        );
    }

    #[test]
    fn noselect_is_not_selectable() {
        let list = ListResponse {
            attributes: vec![MailboxAttribute::NoSelect],
            delimiter: Some('/'),
            name: "[Gmail]".to_string(),
        };
        assert!(!list.is_selectable());
    }
}
