//! Reply derivation: threading headers, recipients, subject and quoting.
//!
//! Address comparisons are plain case-insensitive string comparisons; no
//! further canonicalisation is attempted.

use std::collections::HashSet;

use html_escape::encode_safe;
use mailcli_mime::{Message, parse_address, parse_address_list};

use crate::error::Result;

/// Facts taken from the message being answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyInfo {
    /// Message-ID header.
    pub message_id: String,
    /// References header, trimmed.
    pub references: String,
    /// From header as written.
    pub from: String,
    /// Reply-To header as written.
    pub reply_to: String,
    /// To addresses, lowercased.
    pub to: Vec<String>,
    /// Cc addresses, lowercased.
    pub cc: Vec<String>,
    /// Date header as written.
    pub date: String,
    /// Subject header.
    pub subject: String,
    /// First inline `text/plain` body, empty if absent or if it is really
    /// HTML.
    pub body: String,
    /// First inline `text/html` body.
    pub body_html: String,
}

/// Extracts [`ReplyInfo`] from a raw message. Bodies are only read when
/// `include_bodies` is set.
///
/// # Errors
///
/// Returns an error if the message cannot be parsed.
pub fn extract_reply_info(raw: &[u8], include_bodies: bool) -> Result<ReplyInfo> {
    let message = Message::parse(raw)?;
    let header = |name: &str| message.header(name).unwrap_or_default();

    let mut info = ReplyInfo {
        message_id: header("Message-ID"),
        references: header("References").trim().to_string(),
        from: header("From"),
        reply_to: header("Reply-To"),
        to: lowercase_addresses(&header("To")),
        cc: lowercase_addresses(&header("Cc")),
        date: header("Date"),
        subject: header("Subject"),
        ..Default::default()
    };

    if include_bodies {
        info.body = message.first_text("plain").unwrap_or_default();
        info.body_html = message.first_text("html").unwrap_or_default();
        if looks_like_html(&info.body) {
            info.body.clear();
        }
    }
    Ok(info)
}

/// Returns true when text starts like an HTML document or mentions an
/// `<html` tag anywhere.
#[must_use]
pub fn looks_like_html(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    ["<!doctype", "<html", "<head", "<body", "<meta"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
        || lower.contains("<html")
}

/// In-Reply-To and References for a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyHeaders {
    /// The source Message-ID.
    pub in_reply_to: String,
    /// The source References plus the source Message-ID.
    pub references: String,
}

/// Derives threading headers. The source Message-ID is appended to the
/// References chain unless already present.
#[must_use]
pub fn derive_reply_headers(info: &ReplyInfo) -> ReplyHeaders {
    let message_id = info.message_id.trim();
    let references = info.references.trim();
    let references = if references.is_empty() {
        message_id.to_string()
    } else if message_id.is_empty() || references.split_whitespace().any(|r| r == message_id) {
        references.to_string()
    } else {
        format!("{references} {message_id}")
    };
    ReplyHeaders {
        in_reply_to: message_id.to_string(),
        references,
    }
}

/// Recipients of a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyRecipients {
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients; only filled for reply-all.
    pub cc: Vec<String>,
}

/// Derives reply recipients.
///
/// The reply goes to Reply-To, or From when there is none. Reply-all adds
/// the source To list and carries the source Cc list over, minus anything
/// already in To. Both lists exclude `self_address` and are deduplicated
/// keeping the first occurrence.
#[must_use]
pub fn derive_recipients(info: &ReplyInfo, self_address: &str, all: bool) -> ReplyRecipients {
    let reply_address = match info.reply_to.trim() {
        "" => info.from.as_str(),
        reply_to => reply_to,
    };
    let mut to = lowercase_addresses(reply_address);
    if all {
        to.extend(info.to.iter().cloned());
    }
    let to = dedupe(without_self(to, self_address));
    if !all {
        return ReplyRecipients {
            to,
            cc: Vec::new(),
        };
    }

    let in_to: HashSet<String> = to.iter().map(|a| a.to_lowercase()).collect();
    let cc = dedupe(without_self(info.cc.clone(), self_address))
        .into_iter()
        .filter(|a| !in_to.contains(&a.to_lowercase()))
        .collect();
    ReplyRecipients { to, cc }
}

/// Prefixes `Re: ` unless the trimmed subject already starts with `re:` in
/// any case. Blank subjects stay blank.
#[must_use]
pub fn derive_subject(original: &str) -> String {
    let trimmed = original.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let already_reply = trimmed
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if already_reply {
        trimmed.to_string()
    } else {
        format!("Re: {trimmed}")
    }
}

/// Plain and HTML bodies of a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyBodies {
    /// Plain text body.
    pub plain: String,
    /// HTML body.
    pub html: String,
}

/// Appends the quoted source message to the reply bodies.
///
/// Nothing changes unless `quote` is set and the source had a body. The
/// plain body gets an attribution line and the source text with every line
/// prefixed `> `. The HTML body gets a blockquote of the source HTML, or of
/// the escaped source text when there was no HTML part; a blank HTML body
/// starts from the escaped plain reply.
#[must_use]
pub fn apply_quote(plain: &str, html: &str, quote: bool, info: &ReplyInfo) -> ReplyBodies {
    let unchanged = || ReplyBodies {
        plain: plain.to_string(),
        html: html.to_string(),
    };
    if !quote || (info.body.is_empty() && info.body_html.is_empty()) {
        return unchanged();
    }

    let mut out_plain = plain.to_string();
    if !info.body.is_empty() {
        out_plain.push_str(&quote_text(&info.from, &info.date, &info.body));
    }

    let quoted_content = if info.body_html.is_empty() {
        text_to_html(&info.body)
    } else {
        info.body_html.clone()
    };
    let quote_html = quote_html(&info.from, &info.date, &quoted_content);

    let out_html = if html.trim().is_empty() {
        text_to_html(plain.trim()) + &quote_html
    } else {
        format!("{html}{quote_html}")
    };
    ReplyBodies {
        plain: out_plain,
        html: out_html,
    }
}

fn quote_text(from: &str, date: &str, body: &str) -> String {
    let mut out = String::from("\n\n");
    match (date.is_empty(), from.is_empty()) {
        (false, false) => out.push_str(&format!("On {date}, {from} wrote:\n")),
        (_, false) => out.push_str(&format!("{from} wrote:\n")),
        _ => out.push_str("Original message:\n"),
    }
    for line in body.split('\n') {
        out.push_str("> ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn quote_html(from: &str, date: &str, content: &str) -> String {
    let sender = parse_address(from)
        .and_then(|m| m.name)
        .unwrap_or_else(|| from.to_string());
    let date = if date.is_empty() { "an earlier date" } else { date };
    format!(
        "<br><br><div class=\"gmail_quote\"><div class=\"gmail_attr\">On {}, {} wrote:</div>\
<blockquote class=\"gmail_quote\" style=\"margin:0 0 0 .8ex;border-left:1px #ccc solid;padding-left:1ex\">\
{content}</blockquote></div>",
        encode_safe(date),
        encode_safe(&sender),
    )
}

fn text_to_html(text: &str) -> String {
    encode_safe(text).replace('\n', "<br>\n")
}

fn lowercase_addresses(value: &str) -> Vec<String> {
    parse_address_list(value)
        .into_iter()
        .map(|m| m.email.to_lowercase())
        .collect()
}

fn without_self(addresses: Vec<String>, self_address: &str) -> Vec<String> {
    let own = self_address.trim().to_lowercase();
    addresses
        .into_iter()
        .filter(|a| a.to_lowercase() != own)
        .collect()
}

fn dedupe(addresses: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|a| seen.insert(a.to_lowercase()))
        .collect()
}
