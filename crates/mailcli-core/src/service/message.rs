//! Single-message access.

use chrono::{DateTime, FixedOffset};
use mailcli_imap::{FetchAttribute, Session, Uid};
use mailcli_mime::encoding::decode_rfc2047;
use mailcli_mime::{Message, parse_date};

use super::query::format_addresses;
use super::session::{Connector, MailService, fetch_one, fetch_raw_in};
use crate::error::{Error, Result};

/// A message prepared for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDetail {
    /// UID, when the server reported one.
    pub uid: Option<Uid>,
    /// Message subject.
    pub subject: String,
    /// Sender display string.
    pub from: String,
    /// Recipient display string.
    pub to: String,
    /// Carbon-copy display string.
    pub cc: String,
    /// Date header, when parseable.
    pub date: Option<DateTime<FixedOffset>>,
    /// First `text/plain` part, empty when there is none.
    pub text_body: String,
    /// Filenames of attachment parts. Parts without a filename are left out.
    pub attachments: Vec<String>,
}

impl MessageDetail {
    /// Fills the body fields from a raw message.
    fn with_body(mut self, raw: &[u8]) -> Result<Self> {
        let message = Message::parse(raw)?;
        self.text_body = message.first_text("plain").unwrap_or_default();
        self.attachments = message
            .attachments()
            .into_iter()
            .filter_map(mailcli_mime::Part::filename)
            .collect();
        Ok(self)
    }
}

impl<C: Connector> MailService<C> {
    /// Fetches a message for display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the UID does not exist,
    /// [`Error::BodyUnavailable`] when the server omits the body, or a MIME
    /// or session error.
    pub async fn read_message(&self, mailbox: &str, uid: Uid) -> Result<MessageDetail> {
        let mut session = self.open().await?;
        let result = read_in(&mut session, mailbox, uid).await;
        self.close(session, result).await
    }

    /// Fetches a message's complete raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the UID does not exist,
    /// [`Error::BodyUnavailable`] when the server omits the body, or a
    /// session error.
    pub async fn fetch_raw(&self, mailbox: &str, uid: Uid) -> Result<Vec<u8>> {
        let mut session = self.open().await?;
        let result = fetch_raw_in(&mut session, mailbox, uid).await;
        self.close(session, result).await
    }
}

async fn read_in<S: Session>(session: &mut S, mailbox: &str, uid: Uid) -> Result<MessageDetail> {
    session.select(mailbox, true).await?;
    let message = fetch_one(session, mailbox, uid, &FetchAttribute::FULL).await?;

    let mut detail = MessageDetail {
        uid: message.uid,
        ..Default::default()
    };
    if let Some(envelope) = &message.envelope {
        detail.subject = envelope
            .subject
            .as_deref()
            .map(decode_rfc2047)
            .unwrap_or_default();
        detail.from = format_addresses(&envelope.from);
        detail.to = format_addresses(&envelope.to);
        detail.cc = format_addresses(&envelope.cc);
        detail.date = envelope.date.as_deref().and_then(parse_date);
    }

    let body = message.body.ok_or(Error::BodyUnavailable { uid })?;
    detail.with_body(&body)
}
