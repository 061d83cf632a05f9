//! THREAD command (RFC 5256).

use super::{Literal, SearchCriteria};

/// Charset sent with THREAD when the caller does not pick one.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// A `UID THREAD` command.
///
/// Rendered through `Display` as raw command text, for example
/// `UID THREAD REFERENCES UTF-8 ALL`, and handed to
/// [`Session::execute`](crate::Session::execute). Non-ASCII search text is
/// sent as a literal, synchronizing unless [`Self::with_literal`] says
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadCommand {
    algorithm: String,
    charset: String,
    criteria: SearchCriteria,
    literal: Literal,
}

impl ThreadCommand {
    /// Creates a command for the given algorithm with the default charset.
    #[must_use]
    pub fn new(algorithm: impl Into<String>, criteria: SearchCriteria) -> Self {
        Self {
            algorithm: algorithm.into(),
            charset: DEFAULT_CHARSET.to_string(),
            criteria,
            literal: Literal::Synchronizing,
        }
    }

    /// Overrides the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Picks the literal form, `{N+}` when the server advertises `LITERAL+`.
    #[must_use]
    pub const fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = literal;
        self
    }

    /// Returns the algorithm name.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }
}

impl std::fmt::Display for ThreadCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UID THREAD {} {} ", self.algorithm, self.charset)?;
        self.criteria.render(f, self.literal)
    }
}
