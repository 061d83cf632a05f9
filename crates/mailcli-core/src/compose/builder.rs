//! Outbound message construction.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local};
use mailcli_mime::encoding::{encode_base64_wrapped, encode_quoted_printable, encode_rfc2047};
use mailcli_mime::{
    ContentDisposition, ContentType, Headers, MultipartWriter, format_date, parse_address,
};

use super::recipients::PRIVATE_BCC_HEADER;
use crate::config::ValidationError;
use crate::error::Result;

/// Structured input for [`build_message`].
///
/// Empty strings and lists mean "absent": the matching header is not
/// written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeInput {
    /// Sender address. Required.
    pub from: String,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients. Never written as a header.
    pub bcc: Vec<String>,
    /// Reply-To address.
    pub reply_to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// HTML body.
    pub body_html: String,
    /// Message-ID of the message being answered.
    pub in_reply_to: String,
    /// References chain.
    pub references: String,
    /// Files to attach.
    pub attachments: Vec<PathBuf>,
    /// Record Bcc in a private header so a saved draft can recover it.
    pub store_bcc_header: bool,
}

/// A file loaded for attaching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    /// Filename without directories.
    pub filename: String,
    /// Content type guessed from the extension.
    pub content_type: ContentType,
    /// File contents.
    pub data: Vec<u8>,
}

impl AttachmentFile {
    /// Creates an attachment, guessing its type from the filename.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = ContentType::guess_from_path(Path::new(&filename));
        Self {
            filename,
            content_type,
            data,
        }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self::new(filename, data))
    }
}

/// Builds a complete message, reading attachments from disk and stamping
/// the current local time.
///
/// # Errors
///
/// Returns [`ValidationError::MissingFrom`] when `from` is blank, or an I/O
/// error when an attachment cannot be read.
pub async fn build_message(input: &ComposeInput) -> Result<Vec<u8>> {
    if input.from.trim().is_empty() {
        return Err(ValidationError::MissingFrom.into());
    }
    let mut attachments = Vec::with_capacity(input.attachments.len());
    for path in &input.attachments {
        if path.as_os_str().is_empty() {
            continue;
        }
        attachments.push(AttachmentFile::load(path).await?);
    }
    render_message(input, &attachments, &Local::now().fixed_offset())
}

/// Builds a message from already-loaded attachments.
///
/// Headers are written in the order From, To, Cc, Reply-To, Subject,
/// In-Reply-To, References, the private Bcc header, Date, Message-ID,
/// MIME-Version. Without attachments the body is a single quoted-printable
/// text part (`text/html` when only HTML is given,
/// `multipart/alternative` when both are). With attachments it is
/// `multipart/mixed`: the text part first, then each file base64 encoded.
///
/// # Errors
///
/// Returns [`ValidationError::MissingFrom`] when `from` is blank.
pub fn render_message(
    input: &ComposeInput,
    attachments: &[AttachmentFile],
    date: &DateTime<FixedOffset>,
) -> Result<Vec<u8>> {
    let from = input.from.trim();
    if from.is_empty() {
        return Err(ValidationError::MissingFrom.into());
    }

    let mut headers = Headers::new();
    headers.add("From", from);
    add_list(&mut headers, "To", &input.to);
    add_list(&mut headers, "Cc", &input.cc);
    add_text(&mut headers, "Reply-To", &input.reply_to);
    add_text(&mut headers, "Subject", &encode_rfc2047(input.subject.trim()));
    add_text(&mut headers, "In-Reply-To", &input.in_reply_to);
    add_text(&mut headers, "References", &input.references);
    if input.store_bcc_header {
        add_list(&mut headers, PRIVATE_BCC_HEADER, &input.bcc);
    }
    headers.add("Date", format_date(date));
    headers.add("Message-ID", message_id(from));
    headers.add("MIME-Version", "1.0");

    let has_plain = !input.body.trim().is_empty();
    let has_html = !input.body_html.trim().is_empty();

    let body = if attachments.is_empty() {
        if has_plain && has_html {
            let mut writer = MultipartWriter::new();
            let (part, encoded) = text_part(ContentType::text_plain(), &input.body);
            writer.add_part(&part, encoded.as_bytes());
            let (part, encoded) = text_part(ContentType::text_html(), &input.body_html);
            writer.add_part(&part, encoded.as_bytes());
            headers.add("Content-Type", writer.content_type("alternative").to_string());
            writer.finish()
        } else {
            let (content_type, text) = if has_html && !has_plain {
                (ContentType::text_html(), &input.body_html)
            } else {
                (ContentType::text_plain(), &input.body)
            };
            let (part, encoded) = text_part(content_type, text);
            for (name, value) in part.iter() {
                headers.add(name, value);
            }
            encoded.into_bytes()
        }
    } else {
        let mut writer = MultipartWriter::new();
        let (part, encoded) = if has_html && !has_plain {
            text_part(ContentType::text_html(), &input.body_html)
        } else {
            text_part(ContentType::text_plain(), &input.body)
        };
        writer.add_part(&part, encoded.as_bytes());
        for attachment in attachments {
            let mut part = Headers::new();
            part.add(
                "Content-Type",
                attachment
                    .content_type
                    .clone()
                    .with_parameter("name", attachment.filename.clone())
                    .to_string(),
            );
            part.add(
                "Content-Disposition",
                ContentDisposition::attachment(attachment.filename.clone()).to_string(),
            );
            part.add("Content-Transfer-Encoding", "base64");
            writer.add_part(&part, encode_base64_wrapped(&attachment.data).as_bytes());
        }
        headers.add("Content-Type", writer.content_type("mixed").to_string());
        writer.finish()
    };

    let mut raw = headers.to_string().into_bytes();
    raw.extend_from_slice(b"\r\n");
    raw.extend_from_slice(&body);
    Ok(raw)
}

fn text_part(content_type: ContentType, text: &str) -> (Headers, String) {
    let mut headers = Headers::new();
    headers.add("Content-Type", content_type.to_string());
    headers.add("Content-Transfer-Encoding", "quoted-printable");
    (headers, encode_quoted_printable(text))
}

fn add_text(headers: &mut Headers, name: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        headers.add(name, value);
    }
}

fn add_list(headers: &mut Headers, name: &str, values: &[String]) {
    let joined = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    add_text(headers, name, &joined);
}

/// `<32 hex digits@domain of the sender>`.
fn message_id(from: &str) -> String {
    let domain = parse_address(from)
        .and_then(|m| m.email.split_once('@').map(|(_, d)| d.to_string()))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("<{:032x}@{domain}>", rand::random::<u128>())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailcli_mime::{Message, TransferEncoding};

    fn input() -> ComposeInput {
        ComposeInput {
            from: "me@example.com".to_string(),
            to: vec!["you@example.com".to_string()],
            subject: "Hello".to_string(),
            body: "Hi there".to_string(),
            ..Default::default()
        }
    }

    fn render(input: &ComposeInput, attachments: &[AttachmentFile]) -> String {
        let date = DateTime::parse_from_rfc2822("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        String::from_utf8(render_message(input, attachments, &date).unwrap()).unwrap()
    }

    fn header_names(raw: &str) -> Vec<String> {
        raw.split("\r\n\r\n")
            .next()
            .unwrap()
            .split("\r\n")
            .map(|line| line.split_once(':').unwrap().0.to_string())
            .collect()
    }

    #[test]
    fn missing_from_is_rejected() {
        let mut input = input();
        input.from = "  ".to_string();
        let date = Local::now().fixed_offset();
        let err = render_message(&input, &[], &date).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Validation(ValidationError::MissingFrom)
        ));
    }

    #[test]
    fn header_order() {
        let mut input = input();
        input.cc = vec!["cc@example.com".to_string()];
        input.bcc = vec!["hidden@example.com".to_string()];
        input.reply_to = "replies@example.com".to_string();
        input.in_reply_to = "<m1@example.com>".to_string();
        input.references = "<m0@example.com> <m1@example.com>".to_string();
        input.store_bcc_header = true;
        let raw = render(&input, &[]);
        assert_eq!(
            header_names(&raw),
            vec![
                "From",
                "To",
                "Cc",
                "Reply-To",
                "Subject",
                "In-Reply-To",
                "References",
                PRIVATE_BCC_HEADER,
                "Date",
                "Message-ID",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding",
            ]
        );
        assert!(raw.contains("X-Mailcli-Bcc: hidden@example.com\r\n"));
        assert!(raw.contains("Date: Tue, 1 Jul 2003 10:52:37 +0200\r\n"));
        assert!(!raw.contains("\r\nBcc:"));
    }

    #[test]
    fn bcc_is_private_unless_requested() {
        let mut input = input();
        input.bcc = vec!["hidden@example.com".to_string()];
        let raw = render(&input, &[]);
        assert!(!raw.contains("hidden@example.com"));
    }

    #[test]
    fn plain_body_is_quoted_printable() {
        let mut input = input();
        input.body = "Café = good".to_string();
        let raw = render(&input, &[]);
        assert!(raw.contains("Content-Type: text/plain; charset=\"utf-8\"\r\n"));
        assert!(raw.ends_with("\r\n\r\nCaf=C3=A9 =3D good"));
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.first_text("plain").unwrap(), "Café = good");
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let mut input = input();
        input.subject = "Héllo".to_string();
        let raw = render(&input, &[]);
        assert!(raw.contains("Subject: =?utf-8?B?"));
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.header("Subject").unwrap(), "Héllo");
    }

    #[test]
    fn message_id_uses_sender_domain() {
        let raw = render(&input(), &[]);
        let message = Message::parse(raw.as_bytes()).unwrap();
        let id = message.header("Message-ID").unwrap();
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
        assert_eq!(id.len(), "<@example.com>".len() + 32);
    }

    #[test]
    fn html_only_body() {
        let mut input = input();
        input.body.clear();
        input.body_html = "<p>Hi</p>".to_string();
        let raw = render(&input, &[]);
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert!(message.root().content_type().is("text", "html"));
        assert_eq!(message.first_text("html").unwrap(), "<p>Hi</p>");
    }

    #[test]
    fn plain_and_html_are_alternatives() {
        let mut input = input();
        input.body_html = "<p>Hi there</p>".to_string();
        let raw = render(&input, &[]);
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert!(message.root().content_type().is("multipart", "alternative"));
        assert_eq!(message.first_text("plain").unwrap(), "Hi there");
        assert_eq!(message.first_text("html").unwrap(), "<p>Hi there</p>");
    }

    #[test]
    fn attachment_makes_mixed_body() {
        let data: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        let attachment = AttachmentFile::new("report.pdf", data.clone());
        let raw = render(&input(), &[attachment]);
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert!(message.root().content_type().is("multipart", "mixed"));

        let parts = message.parts();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].content_type().is("text", "plain"));
        assert_eq!(parts[0].transfer_encoding(), TransferEncoding::QuotedPrintable);

        let file = parts[1];
        assert_eq!(file.transfer_encoding(), TransferEncoding::Base64);
        assert!(file.content_type().is("application", "pdf"));
        assert_eq!(file.content_type().parameter("name"), Some("report.pdf"));
        assert!(file.is_attachment());
        assert_eq!(file.filename().as_deref(), Some("report.pdf"));
        assert_eq!(file.decode_body().unwrap(), data);

        let body = std::str::from_utf8(file.raw_body()).unwrap();
        let lines: Vec<&str> = body.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[..5].iter().all(|l| l.len() == 76));
        assert!(lines[5].len() <= 76);
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        let attachment = AttachmentFile::new("blob.zzqx", b"x".to_vec());
        assert!(attachment.content_type.is("application", "octet-stream"));
    }

    #[tokio::test]
    async fn build_reads_attachments_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"remember").await.unwrap();

        let mut input = input();
        input.attachments = vec![path, PathBuf::new()];
        let raw = build_message(&input).await.unwrap();
        let message = Message::parse(&raw).unwrap();
        let attachments = message.attachments();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename().as_deref(), Some("notes.txt"));
        assert_eq!(attachments[0].decode_body().unwrap(), b"remember");
    }

    #[tokio::test]
    async fn missing_attachment_is_io_error() {
        let mut input = input();
        input.attachments = vec![PathBuf::from("/definitely/not/here.bin")];
        let err = build_message(&input).await.unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
