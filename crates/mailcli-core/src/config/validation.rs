//! Configuration and request validation.

use super::model::{ImapConfig, SmtpConfig};

/// A value rejected before any session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// IMAP host is empty.
    EmptyImapHost,
    /// IMAP port is invalid.
    InvalidImapPort,
    /// IMAP username is empty.
    EmptyImapUsername,
    /// IMAP password is empty.
    EmptyImapPassword,
    /// SMTP host is empty.
    EmptySmtpHost,
    /// SMTP port is invalid.
    InvalidSmtpPort,
    /// SMTP username is empty.
    EmptySmtpUsername,
    /// SMTP password is empty.
    EmptySmtpPassword,
    /// Outgoing message has no sender.
    MissingFrom,
    /// Outgoing message has no recipients.
    MissingRecipients,
    /// Outgoing message has neither a plain nor an HTML body.
    MissingBody,
    /// Reply target UID is not a positive integer.
    InvalidReplyUid,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyImapHost => "IMAP server is required",
            Self::InvalidImapPort => "IMAP port must be 1-65535",
            Self::EmptyImapUsername => "IMAP username is required",
            Self::EmptyImapPassword => "IMAP password is required",
            Self::EmptySmtpHost => "SMTP server is required",
            Self::InvalidSmtpPort => "SMTP port must be 1-65535",
            Self::EmptySmtpUsername => "SMTP username is required",
            Self::EmptySmtpPassword => "SMTP password is required",
            Self::MissingFrom => "From address is required",
            Self::MissingRecipients => "At least one recipient is required",
            Self::MissingBody => "Message body is required",
            Self::InvalidReplyUid => "Reply UID must be a positive integer",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyImapHost => "imap_host",
            Self::InvalidImapPort => "imap_port",
            Self::EmptyImapUsername => "imap_username",
            Self::EmptyImapPassword => "imap_password",
            Self::EmptySmtpHost => "smtp_host",
            Self::InvalidSmtpPort => "smtp_port",
            Self::EmptySmtpUsername => "smtp_username",
            Self::EmptySmtpPassword => "smtp_password",
            Self::MissingFrom => "from",
            Self::MissingRecipients => "recipients",
            Self::MissingBody => "body",
            Self::InvalidReplyUid => "reply_uid",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a configuration section.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate the IMAP section.
///
/// # Errors
///
/// Returns every `ValidationError` found.
pub fn validate_imap(config: &ImapConfig) -> ValidationResult {
    let mut errors = Vec::new();
    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyImapHost);
    }
    if config.port == 0 {
        errors.push(ValidationError::InvalidImapPort);
    }
    if config.username.trim().is_empty() {
        errors.push(ValidationError::EmptyImapUsername);
    }
    if config.password.is_empty() {
        errors.push(ValidationError::EmptyImapPassword);
    }
    finish(errors)
}

/// Validate the SMTP section.
///
/// # Errors
///
/// Returns every `ValidationError` found.
pub fn validate_smtp(config: &SmtpConfig) -> ValidationResult {
    let mut errors = Vec::new();
    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpHost);
    }
    if config.port == 0 {
        errors.push(ValidationError::InvalidSmtpPort);
    }
    if config.username.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpUsername);
    }
    if config.password.is_empty() {
        errors.push(ValidationError::EmptySmtpPassword);
    }
    finish(errors)
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
