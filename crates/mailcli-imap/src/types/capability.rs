//! Server capabilities and response status.

/// Response status from a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// IDLE command support (RFC 2177)
    Idle,
    /// UIDPLUS extension (RFC 4315)
    UidPlus,
    /// MOVE extension (RFC 6851)
    Move,
    /// SORT extension (RFC 5256)
    Sort,
    /// Non-synchronizing literals (RFC 7888)
    LiteralPlus,
    /// THREAD algorithm (RFC 5256), upper-cased, e.g. `REFERENCES`
    Thread(String),
    /// AUTH mechanism
    Auth(String),
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "IDLE" => Self::Idle,
            "UIDPLUS" => Self::UidPlus,
            "MOVE" => Self::Move,
            "SORT" => Self::Sort,
            "LITERAL+" => Self::LiteralPlus,
            _ => {
                if let Some(algorithm) = upper.strip_prefix("THREAD=") {
                    Self::Thread(algorithm.to_string())
                } else if let Some(mechanism) = upper.strip_prefix("AUTH=") {
                    Self::Auth(mechanism.to_string())
                } else {
                    Self::Unknown(s.to_string())
                }
            }
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::Idle => write!(f, "IDLE"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::Move => write!(f, "MOVE"),
            Self::Sort => write!(f, "SORT"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::Thread(alg) => write!(f, "THREAD={alg}"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// The capability set advertised by a server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(Vec<Capability>);

impl Capabilities {
    /// Creates a capability set.
    #[must_use]
    pub fn new(capabilities: Vec<Capability>) -> Self {
        Self(capabilities)
    }

    /// Parses capability names as they appear in a CAPABILITY response.
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self(names.into_iter().map(Capability::parse).collect())
    }

    /// Returns true if the capability is advertised.
    #[must_use]
    pub fn has(&self, capability: &Capability) -> bool {
        self.0.contains(capability)
    }

    /// Returns every advertised THREAD algorithm, in advertisement order.
    #[must_use]
    pub fn thread_algorithms(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|cap| match cap {
                Capability::Thread(alg) => Some(alg.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns an iterator over the capabilities.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }

    /// Returns true if no capability is advertised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
