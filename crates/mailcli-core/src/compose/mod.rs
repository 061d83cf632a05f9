//! Outbound message construction.
//!
//! [`build_message`] turns a [`ComposeInput`] into RFC 5322 bytes. The
//! reply helpers derive threading headers, recipients, subject and quoted
//! bodies from the message being answered, and the recipient helpers
//! recover a saved draft's envelope before it is sent.

mod builder;
mod recipients;
mod reply;

pub use builder::{AttachmentFile, ComposeInput, build_message, render_message};
pub use recipients::{PRIVATE_BCC_HEADER, extract_recipients, strip_private_headers};
pub use reply::{
    ReplyBodies, ReplyHeaders, ReplyInfo, ReplyRecipients, apply_quote, derive_recipients,
    derive_reply_headers, derive_subject, extract_reply_info, looks_like_html,
};
