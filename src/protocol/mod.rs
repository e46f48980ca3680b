//! Memcache Text Protocol Framing
//!
//! This module turns raw protocol chunks into fully validated commands.
//!
//! ## Overview
//!
//! Each in-flight client request is tracked by one [`RequestEntry`]. The
//! connection feeds it chunks in the order they arrived; the entry parses the
//! header line, validates the arguments and, for `set`/`add`, accumulates the
//! data block until exactly `<bytes>` bytes have arrived.
//!
//! ## Modules
//!
//! - `types`: `Action`, `PushStatus` and the `Reply` wire format
//! - `parser`: stateless header helpers and `FrameError`
//! - `entry`: the `RequestEntry` state machine
//!
//! ## Example
//!
//! ```
//! use lemcache::protocol::{Action, FrameError, RequestEntry};
//!
//! let mut entry = RequestEntry::new();
//! entry.push(b"get foo\r\n").unwrap();
//! assert_eq!(entry.action(), Action::Get);
//!
//! let mut entry = RequestEntry::new();
//! let err = entry.push(b"set foo x 0 3\r\n").unwrap_err();
//! assert!(matches!(err, FrameError::InvalidFlag(_)));
//! assert_eq!(err.client_reply().serialize(), b"CLIENT_ERROR bad command line format\r\n");
//! ```

pub mod entry;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use entry::{Phase, RequestEntry, DEFAULT_MAX_ITEM_SIZE};
pub use parser::{FrameError, FrameResult};
pub use types::{Action, PushStatus, Reply, CRLF};
