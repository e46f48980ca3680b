//! Header Parsing Helpers
//!
//! Stateless functions used by [`RequestEntry`](super::entry::RequestEntry)
//! to cut a chunk into header and inline payload, tokenize the header and
//! validate numeric fields. None of them hold state, so any number of
//! connections can share them freely.
//!
//! ## Header Tokenizing
//!
//! The header line is trimmed of surrounding whitespace and split on single
//! spaces. Consecutive spaces therefore produce empty tokens, which fail
//! numeric validation instead of being silently skipped:
//!
//! ```text
//! "set foo 0 0 3"   -> ["set", "foo", "0", "0", "3"]
//! "set foo  0 0 3"  -> ["set", "foo", "", "0", "0", "3"]
//! ```

use crate::protocol::types::Reply;
use thiserror::Error;

/// Errors raised while framing a request.
///
/// Every variant is a local failure of the current entry caused by
/// malformed client input. None of them are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The chunk was empty or held nothing but a line delimiter
    #[error("empty request")]
    EmptyRequest,

    /// The first header token is not a supported command
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A required positional argument is absent
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// A token follows the last argument the command accepts
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    /// The flags field is not a non-negative integer
    #[error("invalid flags: {0}")]
    InvalidFlag(String),

    /// The exptime field is not a non-negative integer
    #[error("invalid expiration time: {0}")]
    InvalidExpiration(String),

    /// The bytes field is not a non-negative integer
    #[error("invalid byte length: {0}")]
    InvalidByteLength(String),

    /// The declared payload length exceeds the configured item size
    #[error("item too large: {declared} bytes (max: {max})")]
    ItemTooLarge { declared: usize, max: usize },

    /// More payload arrived than the header declared
    #[error("data overflow: received {received} bytes, declared {declared}")]
    DataOverflow { declared: usize, received: usize },

    /// The entry already completed or failed and accepts no more chunks
    #[error("request entry already closed")]
    EntryClosed,
}

impl FrameError {
    /// Maps the failure to the standard wire reply for the client.
    pub fn client_reply(&self) -> Reply {
        match self {
            FrameError::EmptyRequest | FrameError::UnknownCommand(_) => Reply::Error,
            FrameError::MissingArgument(_)
            | FrameError::UnexpectedArgument(_)
            | FrameError::InvalidFlag(_) => Reply::client_error("bad command line format"),
            FrameError::InvalidExpiration(_) => {
                Reply::client_error("found invalid expiration time")
            }
            FrameError::InvalidByteLength(_) | FrameError::DataOverflow { .. } => {
                Reply::client_error("bad data chunk")
            }
            FrameError::ItemTooLarge { .. } => Reply::server_error("object too large for cache"),
            FrameError::EntryClosed => Reply::server_error("request entry already closed"),
        }
    }
}

/// Result type for framing operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// Finds the first occurrence of `delimiter` in `buf`.
#[inline]
pub fn find_delimiter(buf: &[u8], delimiter: &[u8]) -> Option<usize> {
    if delimiter.is_empty() || buf.len() < delimiter.len() {
        return None;
    }
    buf.windows(delimiter.len()).position(|w| w == delimiter)
}

/// Splits a chunk at the first delimiter into `(header, remainder)`.
///
/// Without a delimiter the whole chunk is the header and the remainder is empty.
pub fn split_header<'a>(chunk: &'a [u8], delimiter: &[u8]) -> (&'a [u8], &'a [u8]) {
    match find_delimiter(chunk, delimiter) {
        Some(pos) => (&chunk[..pos], &chunk[pos + delimiter.len()..]),
        None => (chunk, &[]),
    }
}

/// Trims surrounding ASCII whitespace and splits on single spaces.
///
/// Returns an empty vector for a blank line.
pub fn tokenize(header: &[u8]) -> Vec<&[u8]> {
    let trimmed = header.trim_ascii();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(|&b| b == b' ').collect()
}

/// Parses a token that must consist entirely of ASCII digits.
///
/// Signs, whitespace, empty tokens and values that overflow `T` are rejected.
pub fn parse_numeric<T: std::str::FromStr>(token: &[u8]) -> Option<T> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Removes one trailing `delimiter` from `chunk`, if present.
#[inline]
pub fn strip_delimiter<'a>(chunk: &'a [u8], delimiter: &[u8]) -> &'a [u8] {
    chunk.strip_suffix(delimiter).unwrap_or(chunk)
}

/// Lossy rendering of a token for error messages.
#[inline]
pub(crate) fn token_string(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}
