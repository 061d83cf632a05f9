//! Message identifiers.

use std::num::NonZeroU32;

/// Unique identifier for a message.
///
/// UIDs are assigned by the server in ascending order as messages arrive and
/// are never reused while the message exists. Combined with `UIDVALIDITY`,
/// they uniquely identify a message within a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl Uid {
    /// Creates a new UID.
    ///
    /// Returns `None` if the value is 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Uid {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| crate::Error::Protocol(format!("invalid UID: {s}")))
    }
}

/// UIDVALIDITY value for a mailbox.
///
/// If this value changes, all previously seen UIDs are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UidValidity(pub NonZeroU32);

impl UidValidity {
    /// Creates a new UIDVALIDITY.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
mod tests {
    use super::*;

    mod uid_tests {
        use super::*;

        #[test]
        fn new_zero_returns_none() {
            assert!(Uid::new(0).is_none());
        }

        #[test]
        fn display() {
            let uid = Uid::new(12345).unwrap();
            assert_eq!(format!("{uid}"), "12345");
        }

        #[test]
        fn ordering() {
            let uid1 = Uid::new(100).unwrap();
            let uid2 = Uid::new(200).unwrap();
            assert!(uid1 < uid2);
        }

        #[test]
        fn from_str_accepts_padded_number() {
            let uid: Uid = " 42 ".parse().unwrap();
            assert_eq!(uid.get(), 42);
        }

        #[test]
        fn from_str_rejects_zero_and_garbage() {
            assert!("0".parse::<Uid>().is_err());
            assert!("abc".parse::<Uid>().is_err());
            assert!("-3".parse::<Uid>().is_err());
        }
    }

    mod uid_validity_tests {
        use super::*;

        #[test]
        fn new_valid() {
            let uv = UidValidity::new(987654321).unwrap();
            assert_eq!(uv.get(), 987654321);
        }

        #[test]
        fn new_zero_returns_none() {
            assert!(UidValidity::new(0).is_none());
        }
    }
}
