//! Envelope and FETCH response data.

use crate::types::{Flags, Uid};

/// Parsed ENVELOPE structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Date header, as sent by the server.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Email address from an envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Mailbox name (local part).
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Creates an address from its display name and `local@host` form.
    #[must_use]
    pub fn new(name: Option<&str>, email: &str) -> Self {
        let (mailbox, host) = match email.split_once('@') {
            Some((m, h)) => (Some(m.to_string()), Some(h.to_string())),
            None => (Some(email.to_string()), None),
        };
        Self {
            name: name.map(ToString::to_string),
            mailbox,
            host,
        }
    }

    /// Returns the full email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// `Name <local@host>`, or the bare address when there is no name.
impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let email = self.email().or_else(|| self.mailbox.clone()).unwrap_or_default();
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => write!(f, "{name} <{email}>"),
            _ => f.write_str(&email),
        }
    }
}

/// One message delivered by a UID FETCH.
///
/// Only the attributes that were requested are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Message UID.
    pub uid: Option<Uid>,
    /// Message flags.
    pub flags: Flags,
    /// Envelope structure.
    pub envelope: Option<Envelope>,
    /// `RFC822.SIZE`.
    pub size: Option<u32>,
    /// Full message bytes (`BODY[]`).
    pub body: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_email_requires_host() {
        let addr = Address::new(None, "alice@example.com");
        assert_eq!(addr.email().as_deref(), Some("alice@example.com"));
        let local = Address::new(None, "postmaster");
        assert!(local.email().is_none());
    }

    #[test]
    fn address_display_with_name() {
        let addr = Address::new(Some("Alice Liddell"), "alice@example.com");
        assert_eq!(addr.to_string(), "Alice Liddell <alice@example.com>");
    }

    #[test]
    fn address_display_blank_name_is_bare() {
        let addr = Address::new(Some("  "), "bob@example.com");
        assert_eq!(addr.to_string(), "bob@example.com");
    }
}
