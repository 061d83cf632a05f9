//! Command arguments passed to a [`Session`](crate::Session).
//!
//! Each type renders to its wire form through `Display`, which is what a
//! client library receives when it only accepts raw command text.

mod thread;

pub use thread::ThreadCommand;

use crate::types::Flag;

/// SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Text in header or body.
    Text(String),
}

impl SearchCriteria {
    /// Criteria for an optional free-text query: `TEXT "<q>"` when the query
    /// has content, `ALL` otherwise. Line breaks become spaces so the query
    /// stays on one command line.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        match query.map(str::trim) {
            Some(q) if !q.is_empty() => Self::Text(q.replace(['\r', '\n'], " ")),
            _ => Self::All,
        }
    }

    /// Returns true if rendering needs a literal, i.e. the text is not
    /// 7-bit.
    #[must_use]
    pub fn needs_literal(&self) -> bool {
        match self {
            Self::All => false,
            Self::Text(s) => !s.is_ascii(),
        }
    }

    /// Renders the criteria, writing non-ASCII text as a literal of the
    /// given kind.
    pub(crate) fn render(&self, f: &mut std::fmt::Formatter<'_>, literal: Literal) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Text(s) => write!(f, "TEXT {}", Astring { value: s, literal }),
        }
    }
}

impl std::fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.render(f, Literal::Synchronizing)
    }
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAttribute {
    /// UID.
    Uid,
    /// Message flags.
    Flags,
    /// Envelope structure.
    Envelope,
    /// RFC822 size.
    Rfc822Size,
    /// Full message without setting `\Seen` (`BODY.PEEK[]`).
    BodyPeek,
}

impl FetchAttribute {
    /// Attributes needed to build a message summary.
    pub const SUMMARY: [Self; 4] = [Self::Uid, Self::Flags, Self::Envelope, Self::Rfc822Size];

    /// Attributes needed to read a full message.
    pub const FULL: [Self; 3] = [Self::Uid, Self::Envelope, Self::BodyPeek];

    /// Attributes needed to fetch only the raw bytes.
    pub const RAW: [Self; 2] = [Self::Uid, Self::BodyPeek];

    /// Returns the attribute as written in a FETCH command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uid => "UID",
            Self::Flags => "FLAGS",
            Self::Envelope => "ENVELOPE",
            Self::Rfc822Size => "RFC822.SIZE",
            Self::BodyPeek => "BODY.PEEK[]",
        }
    }
}

impl std::fmt::Display for FetchAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// STORE action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Add flags (`+FLAGS.SILENT`).
    AddFlags(Vec<Flag>),
}

impl std::fmt::Display for StoreAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self::AddFlags(flags) = self;
        let names: Vec<&str> = flags.iter().map(Flag::as_str).collect();
        write!(f, "+FLAGS.SILENT ({})", names.join(" "))
    }
}

/// How a literal announces its length (RFC 3501, RFC 7888).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    /// `{N}`: the server must answer with a continuation before the bytes.
    Synchronizing,
    /// `{N+}`: the bytes follow immediately. Needs `LITERAL+`.
    NonSynchronizing,
}

/// An atom when possible, a quoted string with `"` and `\` escaped for other
/// 7-bit text, and a literal for anything else.
pub(crate) struct Astring<'a> {
    pub value: &'a str,
    pub literal: Literal,
}

impl std::fmt::Display for Astring<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.value;
        if !s.is_ascii() || s.contains(['\r', '\n']) {
            let plus = match self.literal {
                Literal::Synchronizing => "",
                Literal::NonSynchronizing => "+",
            };
            return write!(f, "{{{}{plus}}}\r\n{s}", s.len());
        }
        if !s.is_empty() && !s.bytes().any(needs_quoting) {
            return f.write_str(s);
        }
        f.write_str("\"")?;
        for c in s.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("\"")
    }
}

const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}
