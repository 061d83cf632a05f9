//! Recipient recovery from saved drafts.

use mailcli_mime::{Headers, Message, parse_address_list};

use crate::error::Result;

/// Non-standard header that keeps Bcc recipients in a saved draft.
pub const PRIVATE_BCC_HEADER: &str = "X-Mailcli-Bcc";

/// Lists every recipient address of a raw message: To, Cc, Bcc, then the
/// private Bcc header, in header order.
///
/// # Errors
///
/// Returns an error if the message cannot be parsed.
pub fn extract_recipients(raw: &[u8]) -> Result<Vec<String>> {
    let message = Message::parse(raw)?;
    let headers = message.headers();

    let mut recipients: Vec<String> = ["To", "Cc", "Bcc"]
        .iter()
        .flat_map(|name| headers.get_all(name))
        .flat_map(parse_address_list)
        .map(|mailbox| mailbox.email)
        .collect();
    recipients.extend(
        headers
            .get_all(PRIVATE_BCC_HEADER)
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(ToString::to_string),
    );
    Ok(recipients)
}

/// Removes Bcc and the private Bcc header from a raw message so it can be
/// transmitted. The body is kept byte for byte.
#[must_use]
pub fn strip_private_headers(raw: &[u8]) -> Vec<u8> {
    let (block, body) = split_at_blank_line(raw);
    let mut headers = Headers::parse(block);
    if !headers.contains("Bcc") && !headers.contains(PRIVATE_BCC_HEADER) {
        return raw.to_vec();
    }
    headers.remove("Bcc");
    headers.remove(PRIVATE_BCC_HEADER);

    let mut out = headers.to_string().into_bytes();
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

/// Splits after the first empty line, accepting CRLF or bare LF.
fn split_at_blank_line(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut start = 0;
    while start < raw.len() {
        let end = raw[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |i| start + i + 1);
        let line = &raw[start..end];
        if line == b"\r\n" || line == b"\n" {
            return (&raw[..start], &raw[end..]);
        }
        start = end;
    }
    (raw, &[])
}
