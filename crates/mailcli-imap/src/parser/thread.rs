//! `* THREAD` response parser.
//!
//! The payload is a sequence of parenthesized thread lists. Nesting encodes
//! the reply tree: `(3 6 (4 23)(44 7 96))` is message 3, its child 6, and two
//! branches under 6. Both parsing and flattening use an explicit stack so a
//! deeply branched thread cannot exhaust the call stack.

use tracing::trace;

use crate::error::{Error, Result};
use crate::types::Uid;

/// One node of a thread tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadNode {
    /// A message.
    Uid(Uid),
    /// A parenthesized group of nodes.
    Group(Vec<ThreadNode>),
}

impl ThreadNode {
    /// Returns every UID under this node in depth-first order, keeping only
    /// the first occurrence of each.
    #[must_use]
    pub fn flatten(&self) -> Vec<Uid> {
        let mut out: Vec<Uid> = Vec::new();
        let mut stack: Vec<&Self> = vec![self];

        while let Some(node) = stack.pop() {
            match node {
                Self::Uid(uid) => {
                    if !out.contains(uid) {
                        out.push(*uid);
                    }
                }
                Self::Group(children) => stack.extend(children.iter().rev()),
            }
        }
        out
    }
}

/// Parses the untagged lines of a THREAD command into a forest with one
/// [`ThreadNode::Group`] per top-level thread.
///
/// Lines that are not THREAD responses are ignored, and several THREAD lines
/// are concatenated. A bare `* THREAD` means no messages matched.
///
/// # Errors
///
/// Returns [`Error::Parse`] on unbalanced parentheses, a zero or overflowing
/// UID, or any byte other than digits, spaces and parentheses.
pub fn parse_thread_response(lines: &[Vec<u8>]) -> Result<Vec<ThreadNode>> {
    let mut forest = Vec::new();
    for line in lines {
        if let Some(payload) = thread_payload(line) {
            forest.extend(parse_thread_list(payload)?);
        }
    }
    trace!(threads = forest.len(), "parsed THREAD response");
    Ok(forest)
}

/// Flattens every top-level thread into a UID group, dropping empty groups.
#[must_use]
pub fn flatten_groups(forest: &[ThreadNode]) -> Vec<Vec<Uid>> {
    forest
        .iter()
        .map(ThreadNode::flatten)
        .filter(|group| !group.is_empty())
        .collect()
}

/// Strips `* THREAD` (or a bare `THREAD`) and the line ending.
fn thread_payload(line: &[u8]) -> Option<&[u8]> {
    let line = line.strip_prefix(b"* ").unwrap_or(line);
    let head = line.get(..6)?;
    if !head.eq_ignore_ascii_case(b"THREAD") {
        return None;
    }
    let rest = &line[6..];
    if !(rest.is_empty() || rest[0] == b' ' || rest[0] == b'\r' || rest[0] == b'\n') {
        return None;
    }
    let end = rest
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n'))
        .map_or(0, |i| i + 1);
    Some(&rest[..end])
}

fn parse_thread_list(input: &[u8]) -> Result<Vec<ThreadNode>> {
    let mut forest = Vec::new();
    let mut stack: Vec<Vec<ThreadNode>> = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        match input[pos] {
            b' ' => pos += 1,
            b'(' => {
                stack.push(Vec::new());
                pos += 1;
            }
            b')' => {
                let children = stack.pop().ok_or_else(|| parse_error(pos, "unexpected ')'"))?;
                let group = ThreadNode::Group(children);
                match stack.last_mut() {
                    Some(parent) => parent.push(group),
                    None => forest.push(group),
                }
                pos += 1;
            }
            b'0'..=b'9' => {
                let start = pos;
                while pos < input.len() && input[pos].is_ascii_digit() {
                    pos += 1;
                }
                let uid = parse_uid(&input[start..pos], start)?;
                stack
                    .last_mut()
                    .ok_or_else(|| parse_error(start, "UID outside of a thread list"))?
                    .push(ThreadNode::Uid(uid));
            }
            other => {
                return Err(parse_error(
                    pos,
                    &format!("unexpected byte {:?}", char::from(other)),
                ));
            }
        }
    }

    if stack.is_empty() {
        Ok(forest)
    } else {
        Err(parse_error(input.len(), "unterminated thread list"))
    }
}

fn parse_uid(digits: &[u8], position: usize) -> Result<Uid> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .and_then(Uid::new)
        .ok_or_else(|| parse_error(position, "invalid UID in thread list"))
}

fn parse_error(position: usize, message: &str) -> Error {
    Error::Parse {
        position,
        message: message.to_string(),
    }
}
