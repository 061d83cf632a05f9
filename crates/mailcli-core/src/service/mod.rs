//! Mailbox services.
//!
//! Every operation on [`MailService`] opens its own session through a
//! [`Connector`] and logs out before returning.

mod attachments;
mod mailbox;
mod message;
mod outgoing;
mod query;
mod session;
mod thread;

pub use attachments::save_attachments;
pub use mailbox::MailboxCounts;
pub use message::MessageDetail;
pub use outgoing::{OutgoingRequest, PreparedMessage, ReplyTarget, Transmitter};
pub use query::{DEFAULT_PAGE_SIZE, MessageSummary, Page, Pagination};
pub use session::{Connector, MailService};
pub use thread::{
    Conversations, Negotiation, PREFERRED_ALGORITHMS, ThreadSummary, choose_algorithm, negotiate,
};
