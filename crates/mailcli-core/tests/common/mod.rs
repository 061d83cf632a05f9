//! Scripted in-memory session shared by the integration tests.
//!
//! The fake server holds a fixed set of messages and answers every command
//! from that script. Commands are recorded in wire-like form so tests can
//! assert on what the services issued.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use mailcli_core::config::ImapConfig;
use mailcli_core::{Account, Connector, MailService, Transmitter};
use mailcli_imap::{
    Address, Capabilities, Envelope, Error, FetchAttribute, FetchedMessage, Flag, Flags,
    ListResponse, MailboxStatus, RawResponse, SearchCriteria, Session, Status, StatusItem,
    StoreAction, Uid, UidSet,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Sending identity of the test account.
pub const ME: &str = "me@example.com";

/// How the fake server answers a THREAD command.
#[derive(Debug, Clone, Default)]
pub enum ThreadReply {
    /// `* THREAD ...` lines followed by OK.
    Lines(Vec<String>),
    /// A tagged NO.
    #[default]
    Rejected,
    /// The connection drops.
    Dropped,
}

/// Fixed server state.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Messages by UID.
    pub messages: BTreeMap<u32, FetchedMessage>,
    /// UIDS returned by UID SEARCH in server order; every UID when unset.
    pub search: Option<Vec<u32>>,
    /// Advertised capabilities.
    pub capabilities: Vec<String>,
    /// THREAD behaviour.
    pub thread: ThreadReply,
    /// Fail UID FETCH after delivering this many records.
    pub fetch_fails_after: Option<usize>,
    /// Deliver a record without UID ahead of the real ones.
    pub stray_record: bool,
    /// Reject UID MOVE.
    pub reject_move: bool,
    /// Fail LOGOUT.
    pub logout_fails: bool,
    /// Mailbox names for LIST.
    pub mailboxes: Vec<String>,
}

impl Script {
    /// A script holding the given messages.
    pub fn with_messages(messages: impl IntoIterator<Item = FetchedMessage>) -> Self {
        Self {
            messages: messages
                .into_iter()
                .map(|m| (m.uid.unwrap().get(), m))
                .collect(),
            ..Default::default()
        }
    }

    /// Advertises `THREAD=<alg>` for each algorithm.
    pub fn threading(mut self, algorithms: &[&str], reply: ThreadReply) -> Self {
        self.capabilities = std::iter::once("IMAP4rev1".to_string())
            .chain(algorithms.iter().map(|a| format!("THREAD={a}")))
            .collect();
        self.thread = reply;
        self
    }
}

/// What the fake server observed.
#[derive(Debug, Default)]
pub struct Log {
    /// Commands in issue order.
    pub commands: Vec<String>,
    /// Sessions opened.
    pub connects: usize,
    /// LOGOUT calls.
    pub logouts: usize,
    /// APPENDed messages: mailbox, flags, bytes.
    pub appended: Vec<(String, Vec<Flag>, Vec<u8>)>,
}

impl Log {
    /// True when any recorded command starts with `prefix`.
    pub fn issued(&self, prefix: &str) -> bool {
        self.commands.iter().any(|c| c.starts_with(prefix))
    }
}

/// Session backed by a [`Script`].
pub struct FakeSession {
    script: Arc<Script>,
    log: Arc<Mutex<Log>>,
}

impl FakeSession {
    fn record(&self, command: String) {
        self.log.lock().unwrap().commands.push(command);
    }
}

impl Session for FakeSession {
    async fn capabilities(&mut self) -> mailcli_imap::Result<Capabilities> {
        self.record("CAPABILITY".to_string());
        Ok(Capabilities::parse(
            self.script.capabilities.iter().map(String::as_str),
        ))
    }

    async fn select(
        &mut self,
        mailbox: &str,
        read_only: bool,
    ) -> mailcli_imap::Result<MailboxStatus> {
        let verb = if read_only { "EXAMINE" } else { "SELECT" };
        self.record(format!("{verb} {mailbox}"));
        Ok(MailboxStatus {
            exists: u32::try_from(self.script.messages.len()).unwrap(),
            read_only,
            ..Default::default()
        })
    }

    async fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusItem],
    ) -> mailcli_imap::Result<MailboxStatus> {
        let names: Vec<&str> = items.iter().map(|i| i.as_str()).collect();
        self.record(format!("STATUS {mailbox} ({})", names.join(" ")));
        let unseen = self
            .script
            .messages
            .values()
            .filter(|m| !m.flags.is_seen())
            .count();
        Ok(MailboxStatus {
            exists: u32::try_from(self.script.messages.len()).unwrap(),
            unseen: Some(u32::try_from(unseen).unwrap()),
            ..Default::default()
        })
    }

    async fn list(
        &mut self,
        reference: &str,
        pattern: &str,
    ) -> mailcli_imap::Result<Vec<ListResponse>> {
        self.record(format!("LIST \"{reference}\" {pattern}"));
        Ok(self
            .script
            .mailboxes
            .iter()
            .map(|name| ListResponse {
                attributes: Vec::new(),
                delimiter: Some('/'),
                name: name.clone(),
            })
            .collect())
    }

    async fn create(&mut self, mailbox: &str) -> mailcli_imap::Result<()> {
        self.record(format!("CREATE {mailbox}"));
        Ok(())
    }

    async fn uid_search(&mut self, criteria: &SearchCriteria) -> mailcli_imap::Result<Vec<Uid>> {
        self.record(format!("UID SEARCH {criteria}"));
        let uids = match &self.script.search {
            Some(uids) => uids.clone(),
            None => self.script.messages.keys().copied().collect(),
        };
        Ok(uids.into_iter().filter_map(Uid::new).collect())
    }

    async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: &[FetchAttribute],
        tx: mpsc::Sender<FetchedMessage>,
    ) -> mailcli_imap::Result<()> {
        let names: Vec<&str> = items.iter().map(|i| i.as_str()).collect();
        self.record(format!("UID FETCH {uids} ({})", names.join(" ")));

        let mut records: Vec<FetchedMessage> = self
            .script
            .messages
            .values()
            .filter(|m| m.uid.is_some_and(|u| uids.contains(u)))
            .cloned()
            .collect();
        // Servers answer in sequence order, which need not be UID order.
        records.reverse();
        if self.script.stray_record {
            records.insert(0, FetchedMessage::default());
        }

        for (sent, record) in records.into_iter().enumerate() {
            if self.script.fetch_fails_after == Some(sent) {
                return Err(Error::Bye("connection reset".to_string()));
            }
            if tx.send(record).await.is_err() {
                break;
            }
        }
        if self.script.fetch_fails_after.is_some() {
            return Err(Error::Bye("connection reset".to_string()));
        }
        Ok(())
    }

    async fn uid_store(&mut self, uids: &UidSet, action: &StoreAction) -> mailcli_imap::Result<()> {
        self.record(format!("UID STORE {uids} {action}"));
        Ok(())
    }

    async fn uid_copy(&mut self, uids: &UidSet, mailbox: &str) -> mailcli_imap::Result<()> {
        self.record(format!("UID COPY {uids} {mailbox}"));
        Ok(())
    }

    async fn uid_move(&mut self, uids: &UidSet, mailbox: &str) -> mailcli_imap::Result<()> {
        self.record(format!("UID MOVE {uids} {mailbox}"));
        if self.script.reject_move {
            return Err(Error::Bad("unknown command".to_string()));
        }
        Ok(())
    }

    async fn expunge(&mut self) -> mailcli_imap::Result<()> {
        self.record("EXPUNGE".to_string());
        Ok(())
    }

    async fn append(
        &mut self,
        mailbox: &str,
        flags: &[Flag],
        message: &[u8],
    ) -> mailcli_imap::Result<()> {
        self.record(format!("APPEND {mailbox}"));
        self.log
            .lock()
            .unwrap()
            .appended
            .push((mailbox.to_string(), flags.to_vec(), message.to_vec()));
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> mailcli_imap::Result<RawResponse> {
        self.record(command.to_string());
        match &self.script.thread {
            ThreadReply::Lines(lines) => Ok(RawResponse::ok(
                lines.iter().map(|l| l.as_bytes().to_vec()).collect(),
            )),
            ThreadReply::Rejected => Ok(RawResponse {
                status: Status::No,
                text: "THREAD not allowed".to_string(),
                untagged: Vec::new(),
            }),
            ThreadReply::Dropped => Err(Error::Bye("server shutting down".to_string())),
        }
    }

    async fn logout(&mut self) -> mailcli_imap::Result<()> {
        self.log.lock().unwrap().logouts += 1;
        if self.script.logout_fails {
            return Err(Error::Bye("already gone".to_string()));
        }
        Ok(())
    }
}

/// Connector handing out [`FakeSession`]s over one shared script.
#[derive(Clone)]
pub struct FakeConnector {
    script: Arc<Script>,
    log: Arc<Mutex<Log>>,
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, _config: &ImapConfig) -> mailcli_imap::Result<FakeSession> {
        self.log.lock().unwrap().connects += 1;
        Ok(FakeSession {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        })
    }
}

/// Routes service logs to the test writer, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a service for [`ME`] over the script.
pub fn service(script: Script) -> (MailService<FakeConnector>, Arc<Mutex<Log>>) {
    init_tracing();
    let log = Arc::new(Mutex::new(Log::default()));
    let connector = FakeConnector {
        script: Arc::new(script),
        log: Arc::clone(&log),
    };
    (MailService::new(connector, Account::with_email(ME)), log)
}

/// Records every transmitted message, or refuses them all.
#[derive(Default)]
pub struct FakeTransmitter {
    /// Sender, recipients and bytes per send.
    pub sent: Mutex<Vec<(String, Vec<String>, Vec<u8>)>>,
    /// Reason given for refusing every message.
    pub refuse: Option<String>,
}

impl FakeTransmitter {
    /// A transmitter whose relay rejects everything.
    pub fn refusing(reason: &str) -> Self {
        Self {
            refuse: Some(reason.to_string()),
            ..Default::default()
        }
    }

    /// The single transmitted message as text.
    pub fn only_message(&self) -> (String, Vec<String>, String) {
        let sent = self.sent.lock().unwrap();
        assert_eq!(sent.len(), 1, "expected exactly one transmission");
        let (from, recipients, raw) = &sent[0];
        (
            from.clone(),
            recipients.clone(),
            String::from_utf8(raw.clone()).unwrap(),
        )
    }
}

impl Transmitter for FakeTransmitter {
    async fn send(
        &self,
        from: &str,
        recipients: &[String],
        raw: &[u8],
    ) -> mailcli_core::Result<()> {
        if let Some(reason) = &self.refuse {
            return Err(mailcli_core::Error::Transmit(reason.clone()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((from.to_string(), recipients.to_vec(), raw.to_vec()));
        Ok(())
    }
}

/// Shorthand for a UID.
pub fn uid(n: u32) -> Uid {
    Uid::new(n).unwrap()
}

/// A stored message with envelope and raw bytes.
pub fn message(n: u32, subject: &str, from: &str) -> FetchedMessage {
    let raw = format!(
        "Message-ID: <m{n}@example.com>\r\nFrom: {from}\r\nTo: {ME}\r\nSubject: {subject}\r\n\
Date: Mon, 2 Jan 2023 10:00:00 +0000\r\n\r\nbody of {n}\r\n"
    );
    raw_message(n, subject, from, raw.as_bytes())
}

/// A stored message with explicit raw bytes.
pub fn raw_message(n: u32, subject: &str, from: &str, raw: &[u8]) -> FetchedMessage {
    FetchedMessage {
        uid: Some(uid(n)),
        flags: Flags::new(),
        envelope: Some(Envelope {
            date: Some("Mon, 2 Jan 2023 10:00:00 +0000".to_string()),
            subject: Some(subject.to_string()),
            from: vec![Address::new(None, from)],
            to: vec![Address::new(None, ME)],
            ..Default::default()
        }),
        size: Some(u32::try_from(raw.len()).unwrap()),
        body: Some(raw.to_vec()),
    }
}

/// `count` plain messages with UIDs `1..=count`.
pub fn mailbox_of(count: u32) -> Script {
    Script::with_messages((1..=count).map(|n| message(n, &format!("subject {n}"), "a@example.com")))
}
