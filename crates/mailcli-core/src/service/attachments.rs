//! Saving attachments to disk.

use std::path::{Path, PathBuf};

use mailcli_imap::Uid;
use mailcli_mime::Message;
use tracing::{debug, info};

use super::session::{Connector, MailService};
use crate::error::Result;

/// Suffixes `-1` through `-(MAX_SUFFIX - 1)` are tried before giving up
/// and overwriting.
const MAX_SUFFIX: u32 = 1000;

impl<C: Connector> MailService<C> {
    /// Downloads every attachment of a message into `dir`.
    ///
    /// Returns the paths written, in part order.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be fetched or parsed, or a
    /// file cannot be written.
    pub async fn download_attachments(
        &self,
        mailbox: &str,
        uid: Uid,
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let raw = self.fetch_raw(mailbox, uid).await?;
        let saved = save_attachments(&raw, dir).await?;
        info!(mailbox, uid = %uid, count = saved.len(), "attachments saved");
        Ok(saved)
    }
}

/// Writes the decoded content of every attachment part of `raw` into
/// `dir`, creating it if needed.
///
/// Parts without a filename are saved as `attachment-N`, where N counts the
/// files saved so far plus one. Directory components are stripped from
/// filenames. An existing file is never overwritten while a `name-K.ext`
/// alternative is free.
///
/// # Errors
///
/// Returns an error if the message cannot be parsed or decoded, or a file
/// cannot be written.
pub async fn save_attachments(raw: &[u8], dir: &Path) -> Result<Vec<PathBuf>> {
    let message = Message::parse(raw)?;
    tokio::fs::create_dir_all(dir).await?;

    let mut saved = Vec::new();
    for part in message.attachments() {
        let fallback = format!("attachment-{}", saved.len() + 1);
        let filename = part
            .filename()
            .as_deref()
            .and_then(base_name)
            .unwrap_or(fallback);
        let target = unique_path(&dir.join(filename)).await?;
        tokio::fs::write(&target, part.decode_body()?).await?;
        debug!(path = %target.display(), "attachment written");
        saved.push(target);
    }
    Ok(saved)
}

/// Final path component of a filename, accepting both separators.
fn base_name(filename: &str) -> Option<String> {
    filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(ToString::to_string)
}

/// Returns `path` if it is free, else the first free `stem-K.ext`.
async fn unique_path(path: &Path) -> Result<PathBuf> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(path.to_path_buf());
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    for k in 1..MAX_SUFFIX {
        let candidate = path.with_file_name(format!("{stem}-{k}{extension}"));
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Ok(path.to_path_buf())
}
