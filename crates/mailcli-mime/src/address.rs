//! RFC 5322 address lists.
//!
//! A tolerant parser: it understands display names (quoted or not), angle
//! addresses, comments and groups, and skips entries that carry no
//! `local@domain` address instead of failing the whole list.

use std::fmt;

use crate::encoding::decode_rfc2047;

/// A single mailbox: optional display name plus address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, RFC 2047 decoded.
    pub name: Option<String>,
    /// Address in `local@domain` form, as written.
    pub email: String,
}

impl Mailbox {
    /// Creates a mailbox.
    #[must_use]
    pub fn new(name: Option<&str>, email: impl Into<String>) -> Self {
        Self {
            name: name.map(ToString::to_string).filter(|n| !n.trim().is_empty()),
            email: email.into(),
        }
    }
}

/// `Name <local@domain>`, quoting the name when it contains specials.
impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.email)
            }
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// Parses the first mailbox in a header value.
#[must_use]
pub fn parse_address(value: &str) -> Option<Mailbox> {
    parse_address_list(value).into_iter().next()
}

/// Parses an address list such as a `To` or `Cc` header value.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<Mailbox> {
    split_entries(value)
        .iter()
        .filter_map(|entry| parse_entry(entry))
        .collect()
}

/// Splits on top-level `,` and `;`, dropping group display names.
fn split_entries(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut comment_depth = 0u32;
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes || comment_depth > 0 => {
                current.push(c);
                escaped = true;
            }
            '"' if comment_depth == 0 => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '(' if !in_quotes => {
                comment_depth += 1;
                current.push(c);
            }
            ')' if !in_quotes && comment_depth > 0 => {
                comment_depth -= 1;
                current.push(c);
            }
            '<' if !in_quotes && comment_depth == 0 => {
                in_angle = true;
                current.push(c);
            }
            '>' if !in_quotes && comment_depth == 0 => {
                in_angle = false;
                current.push(c);
            }
            ':' if !in_quotes && !in_angle && comment_depth == 0 => {
                // Group display name.
                current.clear();
            }
            ',' | ';' if !in_quotes && !in_angle && comment_depth == 0 => {
                entries.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    entries.push(current);
    entries.retain(|e| !e.trim().is_empty());
    entries
}

fn parse_entry(entry: &str) -> Option<Mailbox> {
    let entry = entry.trim();

    if let (Some(open), Some(close)) = (entry.rfind('<'), entry.rfind('>')) {
        if close > open {
            let email = strip_comments(&entry[open + 1..close]).trim().to_string();
            if !is_address(&email) {
                return None;
            }
            let name = display_name(&entry[..open]);
            return Some(Mailbox::new(name.as_deref(), email));
        }
    }

    // Bare address, possibly followed by a `(Name)` comment.
    let email = strip_comments(entry).trim().to_string();
    if !is_address(&email) {
        return None;
    }
    let name = comment_text(entry).map(|c| decode_rfc2047(&c));
    Some(Mailbox::new(name.as_deref(), email))
}

fn display_name(raw: &str) -> Option<String> {
    let raw = strip_comments(raw);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let unquoted = if raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2 {
        let mut out = String::new();
        let mut chars = raw[1..raw.len() - 1].chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        out
    } else {
        raw.to_string()
    };
    Some(decode_rfc2047(&unquoted))
}

fn is_address(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Removes `(comments)` outside quoted strings.
fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0u32;
    let mut in_quotes = false;
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            if depth == 0 {
                out.push(c);
            }
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                if depth == 0 {
                    out.push(c);
                }
            }
            '"' if depth == 0 => {
                in_quotes = !in_quotes;
                out.push(c);
            }
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes && depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn comment_text(s: &str) -> Option<String> {
    let open = s.find('(')?;
    let close = s.rfind(')')?;
    (close > open)
        .then(|| s[open + 1..close].trim().to_string())
        .filter(|c| !c.is_empty())
}
