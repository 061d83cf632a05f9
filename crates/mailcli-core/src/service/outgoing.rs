//! Outbound flows: sending, saving drafts and sending saved drafts.
//!
//! Transmission itself sits behind [`Transmitter`]; the flows here only
//! prepare the bytes and the envelope recipients.

use std::future::Future;
use std::path::PathBuf;

use mailcli_imap::Uid;
use tracing::{debug, info};

use super::session::{Connector, MailService};
use crate::compose::{
    ComposeInput, apply_quote, build_message, derive_recipients, derive_reply_headers,
    derive_subject, extract_recipients, extract_reply_info, strip_private_headers,
};
use crate::config::ValidationError;
use crate::error::Result;

/// Delivers a finished message.
///
/// Implementations wrap an SMTP client: dial, authenticate, hand over the
/// envelope and the bytes.
pub trait Transmitter: Send + Sync {
    /// Sends `raw` from `from` to every address in `recipients`.
    fn send(
        &self,
        from: &str,
        recipients: &[String],
        raw: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The message a reply answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    /// Mailbox holding the source message.
    pub mailbox: String,
    /// Source message UID.
    pub uid: Uid,
    /// Reply to every recipient, not only the sender.
    pub all: bool,
    /// Quote the source body.
    pub quote: bool,
}

impl ReplyTarget {
    /// Creates a plain reply target.
    #[must_use]
    pub fn new(mailbox: impl Into<String>, uid: Uid) -> Self {
        Self {
            mailbox: mailbox.into(),
            uid,
            all: false,
            quote: false,
        }
    }

    /// Parses a user-supplied UID. A missing or blank mailbox means
    /// `INBOX`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidReplyUid`] unless `uid` is a
    /// positive 32-bit integer.
    pub fn parse(mailbox: Option<&str>, uid: &str) -> std::result::Result<Self, ValidationError> {
        let uid = uid
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(Uid::new)
            .ok_or(ValidationError::InvalidReplyUid)?;
        let mailbox = mailbox.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("INBOX");
        Ok(Self::new(mailbox, uid))
    }

    /// Sets reply-all.
    #[must_use]
    pub const fn with_all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    /// Sets quoting.
    #[must_use]
    pub const fn with_quote(mut self, quote: bool) -> Self {
        self.quote = quote;
        self
    }
}

/// What the user asked to send or save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingRequest {
    /// Explicit To; overrides derived reply recipients when non-empty.
    pub to: Vec<String>,
    /// Explicit Cc; overrides derived reply recipients when non-empty.
    pub cc: Vec<String>,
    /// Bcc recipients.
    pub bcc: Vec<String>,
    /// Reply-To header.
    pub reply_to: String,
    /// Subject; derived from the source message when blank on a reply.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// HTML body.
    pub body_html: String,
    /// Files to attach.
    pub attachments: Vec<PathBuf>,
    /// Message being answered.
    pub reply: Option<ReplyTarget>,
}

/// Message bytes plus the envelope recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedMessage {
    /// Complete message.
    pub raw: Vec<u8>,
    /// To, Cc and Bcc addresses in that order.
    pub recipients: Vec<String>,
}

impl<C: Connector> MailService<C> {
    /// Turns a request into message bytes.
    ///
    /// For a reply the source message is fetched first; threading headers,
    /// recipients, subject and quoting are derived from it. A draft keeps
    /// its Bcc list in the private header and skips the body and recipient
    /// checks that sending requires.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a missing sender, body or
    /// recipient, or any error from fetching the source message or reading
    /// attachments.
    pub async fn prepare_outgoing(
        &self,
        request: &OutgoingRequest,
        for_draft: bool,
    ) -> Result<PreparedMessage> {
        let identity = self.account().identity();
        if identity.is_empty() {
            return Err(ValidationError::MissingFrom.into());
        }

        let mut input = ComposeInput {
            from: identity.to_string(),
            to: request.to.clone(),
            cc: request.cc.clone(),
            bcc: request.bcc.clone(),
            reply_to: request.reply_to.clone(),
            subject: request.subject.clone(),
            body: request.body.clone(),
            body_html: request.body_html.clone(),
            attachments: request.attachments.clone(),
            store_bcc_header: for_draft && !request.bcc.is_empty(),
            ..Default::default()
        };

        if let Some(target) = &request.reply {
            let raw = self.fetch_raw(&target.mailbox, target.uid).await?;
            let info = extract_reply_info(&raw, target.quote)?;

            let headers = derive_reply_headers(&info);
            input.in_reply_to = headers.in_reply_to;
            input.references = headers.references;

            let bodies = apply_quote(&request.body, &request.body_html, target.quote, &info);
            input.body = bodies.plain;
            input.body_html = bodies.html;

            if request.subject.trim().is_empty() && !info.subject.is_empty() {
                input.subject = derive_subject(&info.subject);
            }

            let derived = derive_recipients(&info, identity, target.all);
            if request.to.is_empty() {
                input.to = derived.to;
            }
            if request.cc.is_empty() {
                input.cc = derived.cc;
            }
            debug!(mailbox = %target.mailbox, uid = %target.uid, "reply derived");
        }

        if !for_draft && input.body.trim().is_empty() && input.body_html.trim().is_empty() {
            return Err(ValidationError::MissingBody.into());
        }
        let recipients: Vec<String> = input
            .to
            .iter()
            .chain(&input.cc)
            .chain(&input.bcc)
            .cloned()
            .collect();
        if !for_draft && recipients.is_empty() {
            return Err(ValidationError::MissingRecipients.into());
        }

        let raw = build_message(&input).await?;
        Ok(PreparedMessage { raw, recipients })
    }

    /// Prepares and transmits a message.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::prepare_outgoing`] or the
    /// transmitter.
    pub async fn send_message<T: Transmitter>(
        &self,
        transmitter: &T,
        request: &OutgoingRequest,
    ) -> Result<PreparedMessage> {
        let prepared = self.prepare_outgoing(request, false).await?;
        transmitter
            .send(self.account().identity(), &prepared.recipients, &prepared.raw)
            .await?;
        info!(recipients = prepared.recipients.len(), "message sent");
        Ok(prepared)
    }

    /// Prepares a message as a draft and appends it to the drafts mailbox.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::prepare_outgoing`] or the append.
    pub async fn save_draft_request(&self, request: &OutgoingRequest) -> Result<PreparedMessage> {
        let prepared = self.prepare_outgoing(request, true).await?;
        self.save_draft(&prepared.raw).await?;
        Ok(prepared)
    }

    /// Sends a saved draft.
    ///
    /// Recipients come from the draft's To, Cc, Bcc and private Bcc
    /// headers. Bcc and the private header are removed before
    /// transmission. The draft is deleted afterwards unless `keep` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingRecipients`] when the draft names
    /// nobody, or any fetch, transmit or delete error.
    pub async fn send_draft<T: Transmitter>(
        &self,
        transmitter: &T,
        uid: Uid,
        keep: bool,
    ) -> Result<Vec<String>> {
        let drafts = self.drafts_mailbox();
        let raw = self.fetch_raw(drafts, uid).await?;
        let recipients = extract_recipients(&raw)?;
        if recipients.is_empty() {
            return Err(ValidationError::MissingRecipients.into());
        }

        let outbound = strip_private_headers(&raw);
        transmitter
            .send(self.account().identity(), &recipients, &outbound)
            .await?;
        info!(mailbox = drafts, uid = %uid, recipients = recipients.len(), "draft sent");

        if !keep {
            self.delete_message(drafts, uid).await?;
        }
        Ok(recipients)
    }
}
