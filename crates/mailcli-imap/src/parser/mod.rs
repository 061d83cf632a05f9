//! Parsers for raw untagged response data.
//!
//! Only responses that typed session primitives do not already cover live
//! here. Today that is the RFC 5256 `* THREAD` response returned by a raw
//! [`ThreadCommand`](crate::ThreadCommand).

mod thread;

pub use thread::{ThreadNode, flatten_groups, parse_thread_response};
