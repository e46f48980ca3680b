//! Memcache Text Protocol Types
//!
//! This module defines the vocabulary shared by the framer and its callers:
//! the command classification, the outcome of a single `push`, and the
//! replies written back to the client.
//!
//! ## Protocol Format
//!
//! Every request starts with a header line terminated by CRLF (`\r\n`).
//! Storage commands follow the header with a data block of exactly
//! `<bytes>` bytes, itself terminated by CRLF.
//!
//! ```text
//! get <key>\r\n
//! delete <key> [noreply]\r\n
//! quit\r\n
//! set <key> <flags> <exptime> <bytes> [noreply]\r\n<data>\r\n
//! add <key> <flags> <exptime> <bytes> [noreply]\r\n<data>\r\n
//! ```
//!
//! ## Replies
//!
//! `STORED\r\n`, `NOT_STORED\r\n`, `DELETED\r\n`, `NOT_FOUND\r\n`,
//! `VALUE <key> <flags> <bytes>\r\n<data>\r\nEND\r\n`, `END\r\n`,
//! `ERROR\r\n`, `CLIENT_ERROR <msg>\r\n`, `SERVER_ERROR <msg>\r\n`.

use bytes::Bytes;
use std::fmt;

/// The line terminator of the memcache text protocol
pub const CRLF: &[u8] = b"\r\n";

/// Command tokens as they appear on the wire
pub mod token {
    pub const GET: &[u8] = b"get";
    pub const SET: &[u8] = b"set";
    pub const ADD: &[u8] = b"add";
    pub const DELETE: &[u8] = b"delete";
    pub const QUIT: &[u8] = b"quit";
    pub const NOREPLY: &[u8] = b"noreply";
}

/// The command a request entry has been classified as.
///
/// `None` until a header has been parsed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    Get,
    Set,
    Add,
    Delete,
    Quit,
}

impl Action {
    /// Classifies a command token. Matching is case-sensitive.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            token::GET => Some(Action::Get),
            token::SET => Some(Action::Set),
            token::ADD => Some(Action::Add),
            token::DELETE => Some(Action::Delete),
            token::QUIT => Some(Action::Quit),
            _ => None,
        }
    }

    /// Returns true for commands that carry a data block.
    #[inline]
    pub fn has_payload(&self) -> bool {
        matches!(self, Action::Set | Action::Add)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Get => "get",
            Action::Set => "set",
            Action::Add => "add",
            Action::Delete => "delete",
            Action::Quit => "quit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcome of feeding one chunk into a request entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// The entry is still waiting for payload bytes
    NeedMore,
    /// The entry is fully determined and ready to be executed
    Complete,
}

impl PushStatus {
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, PushStatus::Complete)
    }
}

/// A reply line (or block) sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `STORED`
    Stored,
    /// `NOT_STORED`
    NotStored,
    /// `DELETED`
    Deleted,
    /// `NOT_FOUND`
    NotFound,
    /// `VALUE <key> <flags> <bytes>` + data block + `END`
    Value { key: Bytes, flags: u32, data: Bytes },
    /// `END` on its own: a get miss
    End,
    /// `ERROR`: unknown or empty command
    Error,
    /// `CLIENT_ERROR <message>`
    ClientError(String),
    /// `SERVER_ERROR <message>`
    ServerError(String),
}

impl Reply {
    pub fn client_error(msg: impl Into<String>) -> Self {
        Reply::ClientError(msg.into())
    }

    pub fn server_error(msg: impl Into<String>) -> Self {
        Reply::ServerError(msg.into())
    }

    /// Serializes the reply to its wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Stored => buf.extend_from_slice(b"STORED"),
            Reply::NotStored => buf.extend_from_slice(b"NOT_STORED"),
            Reply::Deleted => buf.extend_from_slice(b"DELETED"),
            Reply::NotFound => buf.extend_from_slice(b"NOT_FOUND"),
            Reply::Value { key, flags, data } => {
                buf.extend_from_slice(b"VALUE ");
                buf.extend_from_slice(key);
                buf.push(b' ');
                buf.extend_from_slice(flags.to_string().as_bytes());
                buf.push(b' ');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(b"END");
            }
            Reply::End => buf.extend_from_slice(b"END"),
            Reply::Error => buf.extend_from_slice(b"ERROR"),
            Reply::ClientError(msg) => {
                buf.extend_from_slice(b"CLIENT_ERROR ");
                buf.extend_from_slice(msg.as_bytes());
            }
            Reply::ServerError(msg) => {
                buf.extend_from_slice(b"SERVER_ERROR ");
                buf.extend_from_slice(msg.as_bytes());
            }
        }
        buf.extend_from_slice(CRLF);
    }

    /// Returns true for the three error reply kinds.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Reply::Error | Reply::ClientError(_) | Reply::ServerError(_)
        )
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wire = self.serialize();
        let line_end = wire
            .windows(CRLF.len())
            .position(|w| w == CRLF)
            .unwrap_or(wire.len());
        f.write_str(&String::from_utf8_lossy(&wire[..line_end]))
    }
}
