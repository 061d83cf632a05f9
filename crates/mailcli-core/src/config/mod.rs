//! Account configuration.
//!
//! Provides the resolved account model and its validation.

mod model;
mod validation;

pub use model::{Account, Defaults, ImapConfig, REDACTED, Security, SmtpConfig};
pub use validation::{ValidationError, ValidationResult, validate_imap, validate_smtp};
