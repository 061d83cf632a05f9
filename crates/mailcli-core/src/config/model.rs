//! Account model types.

use serde::{Deserialize, Serialize};

/// Mask written over secrets by [`Account::redacted`].
pub const REDACTED: &str = "****";

/// Security/encryption mode for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    #[serde(rename = "starttls")]
    StartTls,
}

impl Security {
    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// IMAP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImapConfig {
    /// Server hostname.
    pub host: String,
    /// Server port (default: 993 for TLS, 143 otherwise).
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Skip certificate verification. Only for test servers.
    pub insecure_skip_verify: bool,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl ImapConfig {
    /// Get default port for the security mode.
    #[must_use]
    pub const fn default_port(security: Security) -> u16 {
        match security {
            Security::None | Security::StartTls => 143,
            Security::Tls => 993,
        }
    }
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Self::default_port(Security::Tls),
            security: Security::Tls,
            insecure_skip_verify: false,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// SMTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port (default: 587 for STARTTLS, 465 for TLS).
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Skip certificate verification. Only for test servers.
    pub insecure_skip_verify: bool,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl SmtpConfig {
    /// Get default port for the security mode.
    #[must_use]
    pub const fn default_port(security: Security) -> u16 {
        match security {
            Security::None => 25,
            Security::StartTls => 587,
            Security::Tls => 465,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Self::default_port(Security::StartTls),
            security: Security::StartTls,
            insecure_skip_verify: false,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Defaults applied when a caller leaves a choice open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Mailbox drafts are saved to and sent from.
    pub drafts_mailbox: String,
    /// Mailbox used when none is given.
    pub mailbox: String,
    /// Page size used when none is given.
    pub page_size: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            drafts_mailbox: "Drafts".to_string(),
            mailbox: "INBOX".to_string(),
            page_size: crate::service::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Resolved account configuration.
///
/// Loading and merging configuration files is left to the caller; the core
/// only consumes the resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    /// Sending address. Falls back to the IMAP username when empty.
    pub email: String,
    /// IMAP configuration.
    pub imap: ImapConfig,
    /// SMTP configuration.
    pub smtp: SmtpConfig,
    /// Defaults.
    pub defaults: Defaults,
}

impl Account {
    /// Create a new account with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account whose IMAP and SMTP usernames are its address.
    #[must_use]
    pub fn with_email(email: &str) -> Self {
        let mut account = Self {
            email: email.to_string(),
            ..Default::default()
        };
        account.imap.username = email.to_string();
        account.smtp.username = email.to_string();
        account
    }

    /// Returns the address messages are sent from and replies exclude.
    #[must_use]
    pub fn identity(&self) -> &str {
        let email = self.email.trim();
        if email.is_empty() {
            self.imap.username.trim()
        } else {
            email
        }
    }

    /// Returns a copy with passwords masked, safe to print or log.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut masked = self.clone();
        if !masked.imap.password.is_empty() {
            masked.imap.password = REDACTED.to_string();
        }
        if !masked.smtp.password.is_empty() {
            masked.smtp.password = REDACTED.to_string();
        }
        masked
    }
}
