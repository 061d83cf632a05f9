//! # mailcli-mime
//!
//! MIME primitives for reading and writing mail.
//!
//! ## Features
//!
//! - **Part walking**: parse a raw message into nested [`Part`]s and visit
//!   the leaves in order
//! - **Headers**: ordered, case-insensitive [`Headers`] with RFC 2047 decoding
//! - **Content types**: [`ContentType`] and [`ContentDisposition`] with
//!   quoted and RFC 2231 parameters, plus extension-based guessing
//! - **Addresses**: tolerant RFC 5322 address-list parsing into [`Mailbox`]es
//! - **Encodings**: wrapped Base64, Quoted-Printable, RFC 2047 words
//! - **Writing**: [`MultipartWriter`] for multipart bodies
//!
//! ## Parsing
//!
//! ```ignore
//! use mailcli_mime::Message;
//!
//! let message = Message::parse(raw_bytes)?;
//! println!("Subject: {}", message.header("Subject").unwrap_or_default());
//! if let Some(text) = message.first_text("plain") {
//!     println!("{text}");
//! }
//! for part in message.attachments() {
//!     println!("attachment: {:?}", part.filename());
//! }
//! ```
//!
//! ## Writing a multipart body
//!
//! ```ignore
//! use mailcli_mime::{Headers, MultipartWriter, encoding};
//!
//! let mut writer = MultipartWriter::new();
//! let mut headers = Headers::new();
//! headers.add("Content-Type", "text/plain; charset=\"utf-8\"");
//! headers.add("Content-Transfer-Encoding", "quoted-printable");
//! writer.add_part(&headers, encoding::encode_quoted_printable("Hello").as_bytes());
//! let content_type = writer.content_type("mixed");
//! let body = writer.finish();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod builder;
mod content_type;
mod date;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{Mailbox, parse_address, parse_address_list};
pub use builder::{MultipartWriter, generate_boundary};
pub use content_type::{ContentDisposition, ContentType};
pub use date::{format_date, parse_date};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
