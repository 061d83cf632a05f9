//! Sending, replying and the draft round trip.

#![allow(clippy::unwrap_used)]

mod common;

use common::{FakeTransmitter, ME, Script, mailbox_of, raw_message, service, uid};
use mailcli_core::compose::PRIVATE_BCC_HEADER;
use mailcli_core::config::ValidationError;
use mailcli_core::{Error, OutgoingRequest, ReplyTarget};
use mailcli_mime::Message;
use tokio_test::{assert_err, assert_ok};

const SOURCE: &[u8] = b"Message-ID: <src@example.com>\r\n\
References: <root@example.com>\r\n\
From: Bob <bob@example.com>\r\n\
To: me@example.com, Carol <carol@example.com>\r\n\
Cc: dave@example.com, ME@example.com\r\n\
Date: Mon, 2 Jan 2023 10:00:00 +0000\r\n\
Subject: Plans\r\n\
\r\n\
line one\r\n\
line two";

fn source_mailbox() -> Script {
    Script::with_messages([raw_message(7, "Plans", "bob@example.com", SOURCE)])
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn simple_request() -> OutgoingRequest {
    OutgoingRequest {
        to: strings(&["alice@example.com"]),
        subject: "Hello".to_string(),
        body: "hi there".to_string(),
        ..Default::default()
    }
}

fn validation(err: &Error) -> Option<ValidationError> {
    match err {
        Error::Validation(v) => Some(*v),
        _ => None,
    }
}

mod send {
    use super::*;

    #[tokio::test]
    async fn plain_message_skips_imap() {
        let (service, log) = service(Script::default());
        let transmitter = FakeTransmitter::default();

        let prepared = assert_ok!(service.send_message(&transmitter, &simple_request()).await);
        assert_eq!(prepared.recipients, strings(&["alice@example.com"]));

        let (from, recipients, raw) = transmitter.only_message();
        assert_eq!(from, ME);
        assert_eq!(recipients, prepared.recipients);
        assert!(raw.starts_with("From: me@example.com\r\nTo: alice@example.com\r\nSubject: Hello\r\n"));
        assert!(raw.contains("Content-Type: text/plain; charset=\"utf-8\"\r\n"));
        assert_eq!(log.lock().unwrap().connects, 0);
    }

    #[tokio::test]
    async fn transmit_failure_is_reported() {
        let (service, log) = service(Script::default());
        let transmitter = FakeTransmitter::refusing("421 try later");

        let err = assert_err!(service.send_message(&transmitter, &simple_request()).await);
        assert!(matches!(err, Error::Transmit(ref reason) if reason == "421 try later"));
        assert!(transmitter.sent.lock().unwrap().is_empty());
        assert!(log.lock().unwrap().appended.is_empty());
    }

    #[tokio::test]
    async fn bcc_is_an_envelope_recipient_only() {
        let (service, _) = service(Script::default());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            cc: strings(&["carol@example.com"]),
            bcc: strings(&["dave@example.com"]),
            ..simple_request()
        };

        assert_ok!(service.send_message(&transmitter, &request).await);
        let (_, recipients, raw) = transmitter.only_message();
        assert_eq!(
            recipients,
            strings(&["alice@example.com", "carol@example.com", "dave@example.com"])
        );
        assert!(!raw.contains("dave@example.com"));
        assert!(!raw.contains(PRIVATE_BCC_HEADER));
    }

    #[tokio::test]
    async fn body_is_required() {
        let (service, _) = service(Script::default());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            body: "  \n".to_string(),
            ..simple_request()
        };

        let err = assert_err!(service.send_message(&transmitter, &request).await);
        assert_eq!(validation(&err), Some(ValidationError::MissingBody));
        assert!(transmitter.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn html_body_alone_is_enough() {
        let (service, _) = service(Script::default());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            body: String::new(),
            body_html: "<p>hi</p>".to_string(),
            ..simple_request()
        };

        assert_ok!(service.send_message(&transmitter, &request).await);
        let (_, _, raw) = transmitter.only_message();
        assert!(raw.contains("Content-Type: text/html; charset=\"utf-8\""));
    }

    #[tokio::test]
    async fn a_recipient_is_required() {
        let (service, _) = service(Script::default());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            to: Vec::new(),
            ..simple_request()
        };

        let err = assert_err!(service.send_message(&transmitter, &request).await);
        assert_eq!(validation(&err), Some(ValidationError::MissingRecipients));
    }

    #[tokio::test]
    async fn attachments_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        tokio::fs::write(&path, b"a,b\n1,2\n").await.unwrap();

        let (service, _) = service(Script::default());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            attachments: vec![path],
            ..simple_request()
        };
        assert_ok!(service.send_message(&transmitter, &request).await);

        let (_, _, raw) = transmitter.only_message();
        let message = Message::parse(raw.as_bytes()).unwrap();
        let attachments = message.attachments();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename().as_deref(), Some("data.csv"));
        assert_eq!(attachments[0].decode_body().unwrap(), b"a,b\n1,2\n");
        assert_eq!(message.first_text("plain").as_deref(), Some("hi there"));
    }

    #[tokio::test]
    async fn missing_attachment_fails_before_transmit() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(Script::default());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            attachments: vec![dir.path().join("absent.bin")],
            ..simple_request()
        };

        let err = assert_err!(service.send_message(&transmitter, &request).await);
        assert!(matches!(err, Error::Io(_)));
        assert!(transmitter.sent.lock().unwrap().is_empty());
    }
}

mod reply {
    use super::*;

    fn reply_request(target: ReplyTarget) -> OutgoingRequest {
        OutgoingRequest {
            body: "Sounds good".to_string(),
            reply: Some(target),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn reply_goes_to_sender_with_threading_headers() {
        let (service, log) = service(source_mailbox());
        let transmitter = FakeTransmitter::default();
        let target = ReplyTarget::parse(None, "7").unwrap();

        let prepared = assert_ok!(service.send_message(&transmitter, &reply_request(target)).await);
        assert_eq!(prepared.recipients, strings(&["bob@example.com"]));

        let (_, _, raw) = transmitter.only_message();
        assert!(raw.contains("Subject: Re: Plans\r\n"));
        assert!(raw.contains("In-Reply-To: <src@example.com>\r\n"));
        assert!(raw.contains("References: <root@example.com> <src@example.com>\r\n"));
        assert!(!raw.contains("Cc:"));

        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.first_text("plain").as_deref(), Some("Sounds good"));

        let log = log.lock().unwrap();
        assert!(log.issued("EXAMINE INBOX"));
        assert_eq!((log.connects, log.logouts), (1, 1));
    }

    #[tokio::test]
    async fn reply_all_with_quote() {
        let (service, _) = service(source_mailbox());
        let transmitter = FakeTransmitter::default();
        let target = ReplyTarget::parse(Some("INBOX"), "7")
            .unwrap()
            .with_all(true)
            .with_quote(true);

        let prepared = assert_ok!(service.send_message(&transmitter, &reply_request(target)).await);
        assert_eq!(
            prepared.recipients,
            strings(&["bob@example.com", "carol@example.com", "dave@example.com"])
        );

        let (_, _, raw) = transmitter.only_message();
        assert!(raw.contains("To: bob@example.com, carol@example.com\r\n"));
        assert!(raw.contains("Cc: dave@example.com\r\n"));

        let message = Message::parse(raw.as_bytes()).unwrap();
        let plain = message.first_text("plain").unwrap();
        assert!(plain.starts_with("Sounds good"));
        assert!(plain.contains("On Mon, 2 Jan 2023 10:00:00 +0000, Bob <bob@example.com> wrote:"));
        assert!(plain.contains("> line one"));
        assert!(plain.contains("> line two"));

        let html = message.first_text("html").unwrap();
        assert!(html.starts_with("Sounds good<br><br><div class=\"gmail_quote\">"));
        assert!(html.contains("Bob wrote:</div>"));
        assert!(html.contains("<blockquote"));
    }

    #[tokio::test]
    async fn explicit_recipients_and_subject_win() {
        let (service, _) = service(source_mailbox());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            to: strings(&["zed@example.com"]),
            subject: "Different".to_string(),
            ..reply_request(ReplyTarget::new("INBOX", uid(7)).with_all(true))
        };

        let prepared = assert_ok!(service.send_message(&transmitter, &request).await);
        assert_eq!(prepared.recipients, strings(&["zed@example.com", "dave@example.com"]));
        let (_, _, raw) = transmitter.only_message();
        assert!(raw.contains("Subject: Different\r\n"));
    }

    #[tokio::test]
    async fn quote_supplies_missing_body() {
        let (service, _) = service(source_mailbox());
        let transmitter = FakeTransmitter::default();
        let request = OutgoingRequest {
            body: String::new(),
            ..reply_request(ReplyTarget::new("INBOX", uid(7)).with_quote(true))
        };
        assert_ok!(service.send_message(&transmitter, &request).await);
    }

    #[tokio::test]
    async fn missing_source_sends_nothing() {
        let (service, log) = service(mailbox_of(2));
        let transmitter = FakeTransmitter::default();

        let err = assert_err!(
            service
                .send_message(&transmitter, &reply_request(ReplyTarget::new("INBOX", uid(7))))
                .await
        );
        assert!(err.is_not_found());
        assert!(transmitter.sent.lock().unwrap().is_empty());
        assert_eq!(log.lock().unwrap().logouts, 1);
    }
}

mod drafts {
    use super::*;

    const DRAFT: &[u8] = b"From: me@example.com\r\n\
To: alice@example.com\r\n\
Cc: carol@example.com\r\n\
X-Mailcli-Bcc: dave@example.com\r\n\
Subject: later\r\n\
\r\n\
draft body\r\n";

    fn drafts_mailbox(raw: &[u8]) -> Script {
        Script::with_messages([raw_message(3, "later", ME, raw)])
    }

    #[tokio::test]
    async fn saved_draft_keeps_bcc_privately() {
        let (service, log) = service(Script::default());
        let request = OutgoingRequest {
            bcc: strings(&["dave@example.com"]),
            ..simple_request()
        };

        assert_ok!(service.save_draft_request(&request).await);
        let log = log.lock().unwrap();
        let (mailbox, _, raw) = &log.appended[0];
        let raw = String::from_utf8(raw.clone()).unwrap();
        assert_eq!(mailbox, "Drafts");
        assert!(raw.contains("X-Mailcli-Bcc: dave@example.com\r\n"));
        assert!(!raw.contains("\r\nBcc:"));
    }

    #[tokio::test]
    async fn drafts_need_neither_body_nor_recipients() {
        let (service, log) = service(Script::default());
        let request = OutgoingRequest {
            subject: "idea".to_string(),
            ..Default::default()
        };
        let prepared = assert_ok!(service.save_draft_request(&request).await);
        assert!(prepared.recipients.is_empty());
        assert_eq!(log.lock().unwrap().appended.len(), 1);
    }

    #[tokio::test]
    async fn send_draft_strips_private_header_and_deletes() {
        let (service, log) = service(drafts_mailbox(DRAFT));
        let transmitter = FakeTransmitter::default();

        let recipients = assert_ok!(service.send_draft(&transmitter, uid(3), false).await);
        assert_eq!(
            recipients,
            strings(&["alice@example.com", "carol@example.com", "dave@example.com"])
        );

        let (from, sent_to, raw) = transmitter.only_message();
        assert_eq!(from, ME);
        assert_eq!(sent_to, recipients);
        assert!(!raw.contains(PRIVATE_BCC_HEADER));
        assert!(!raw.contains("dave@example.com"));
        assert!(raw.ends_with("\r\n\r\ndraft body\r\n"));

        let log = log.lock().unwrap();
        assert!(log.issued("EXAMINE Drafts"));
        assert!(log.issued("SELECT Drafts"));
        assert!(log.issued("UID STORE 3 +FLAGS.SILENT (\\Deleted)"));
        assert_eq!((log.connects, log.logouts), (2, 2));
    }

    #[tokio::test]
    async fn refused_transmission_keeps_draft() {
        let (service, log) = service(drafts_mailbox(DRAFT));
        let transmitter = FakeTransmitter::refusing("550 relay denied");

        let err = assert_err!(service.send_draft(&transmitter, uid(3), false).await);
        assert!(matches!(err, Error::Transmit(ref reason) if reason == "550 relay denied"));

        let log = log.lock().unwrap();
        assert!(!log.issued("SELECT Drafts"));
        assert!(!log.issued("UID STORE"));
        assert!(!log.issued("EXPUNGE"));
    }

    #[tokio::test]
    async fn keep_leaves_draft_in_place() {
        let (service, log) = service(drafts_mailbox(DRAFT));
        let transmitter = FakeTransmitter::default();

        assert_ok!(service.send_draft(&transmitter, uid(3), true).await);
        assert!(!log.lock().unwrap().issued("UID STORE"));
    }

    #[tokio::test]
    async fn draft_without_recipients_is_rejected() {
        let (service, log) = service(drafts_mailbox(b"From: me@example.com\r\nSubject: x\r\n\r\nbody"));
        let transmitter = FakeTransmitter::default();

        let err = assert_err!(service.send_draft(&transmitter, uid(3), false).await);
        assert_eq!(validation(&err), Some(ValidationError::MissingRecipients));
        assert!(transmitter.sent.lock().unwrap().is_empty());
        assert!(!log.lock().unwrap().issued("UID STORE"));
    }

    #[tokio::test]
    async fn save_then_send_round_trip() {
        let (drafting, log) = service(Script::default());
        let request = OutgoingRequest {
            bcc: strings(&["dave@example.com"]),
            ..simple_request()
        };
        assert_ok!(drafting.save_draft_request(&request).await);
        let saved = log.lock().unwrap().appended[0].2.clone();

        let (service, _) = service(drafts_mailbox(&saved));
        let transmitter = FakeTransmitter::default();
        let recipients = assert_ok!(service.send_draft(&transmitter, uid(3), true).await);
        assert_eq!(recipients, strings(&["alice@example.com", "dave@example.com"]));

        let (_, _, raw) = transmitter.only_message();
        assert!(!raw.contains("dave@example.com"));
        assert!(raw.contains("Subject: Hello\r\n"));
    }
}
