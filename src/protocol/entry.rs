//! Request Entry State Machine
//!
//! A [`RequestEntry`] tracks the framing progress of exactly one client
//! request. The caller feeds it raw chunks in arrival order through
//! [`RequestEntry::push`]; the entry decides what each chunk means.
//!
//! ## Phases
//!
//! ```text
//!                  push(header)
//!  AwaitingHeader ─────────────────────────────┐
//!        │                                     │ get / delete / quit
//!        │ set / add                           ▼
//!        ▼                                 Complete
//!  AwaitingPayload ── len(data) == bytes ──────▲
//!        │
//!        │ len(data) > bytes
//!        ▼
//!     Failed
//! ```
//!
//! `Complete` and `Failed` are terminal: further pushes return
//! [`FrameError::EntryClosed`]. Header validation failures leave the entry
//! in `AwaitingHeader` with every field untouched, since all fields are
//! validated before any of them is committed.
//!
//! ## Payload Framing
//!
//! The declared `<bytes>` count is the only boundary signal for the data
//! block, so accumulation is strict: one trailing delimiter is stripped
//! from each data chunk, the data is never truncated or padded, and the
//! first chunk that would take the buffer past the declared length fails
//! the entry with [`FrameError::DataOverflow`] without being appended.

use crate::protocol::parser::{
    parse_numeric, split_header, strip_delimiter, token_string, tokenize, FrameError, FrameResult,
};
use crate::protocol::types::{token, Action, PushStatus, CRLF};
use bytes::{Bytes, BytesMut};

/// Default ceiling on a declared payload length (1 MB, same as memcached)
pub const DEFAULT_MAX_ITEM_SIZE: usize = 1024 * 1024;

/// Where an entry is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No header has been parsed yet
    AwaitingHeader,
    /// A `set`/`add` header was accepted; payload bytes are still owed
    AwaitingPayload,
    /// The command is fully determined
    Complete,
    /// The payload overflowed its declared length
    Failed,
}

/// A fully validated header, built before anything is written to the entry.
#[derive(Debug)]
struct Header {
    action: Action,
    key: Bytes,
    flags: u32,
    exp_time: u64,
    bytes: usize,
    noreply: bool,
}

/// Per-request framing state for one memcache text command.
///
/// # Example
///
/// ```
/// use lemcache::protocol::{Action, PushStatus, RequestEntry};
///
/// let mut entry = RequestEntry::new();
/// assert_eq!(entry.push(b"set foo 0 0 3\r\n").unwrap(), PushStatus::NeedMore);
/// assert_eq!(entry.push(b"bar\r\n").unwrap(), PushStatus::Complete);
///
/// assert_eq!(entry.action(), Action::Set);
/// assert_eq!(entry.key(), b"foo");
/// assert_eq!(entry.data(), b"bar");
/// ```
#[derive(Debug, Clone)]
pub struct RequestEntry {
    phase: Phase,
    action: Action,
    key: Bytes,
    flags: u32,
    exp_time: u64,
    bytes: usize,
    noreply: bool,
    data: BytesMut,
    delimiter: &'static [u8],
    max_item_size: usize,
}

impl Default for RequestEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestEntry {
    /// Creates an entry using CRLF and the default item size ceiling.
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingHeader,
            action: Action::None,
            key: Bytes::new(),
            flags: 0,
            exp_time: 0,
            bytes: 0,
            noreply: false,
            data: BytesMut::new(),
            delimiter: CRLF,
            max_item_size: DEFAULT_MAX_ITEM_SIZE,
        }
    }

    /// Creates an entry that uses `delimiter` as its line terminator.
    ///
    /// An empty delimiter falls back to CRLF.
    pub fn with_delimiter(delimiter: &'static [u8]) -> Self {
        let mut entry = Self::new();
        if !delimiter.is_empty() {
            entry.delimiter = delimiter;
        }
        entry
    }

    /// Creates an entry that rejects payloads declared larger than `max`.
    pub fn with_max_item_size(max: usize) -> Self {
        let mut entry = Self::new();
        entry.max_item_size = max;
        entry
    }

    /// Feeds the next chunk received from the client.
    ///
    /// # Returns
    ///
    /// - `Ok(PushStatus::Complete)` - the command is ready to execute
    /// - `Ok(PushStatus::NeedMore)` - payload bytes are still missing
    /// - `Err(e)` - the input is malformed; see [`FrameError`]
    pub fn push(&mut self, chunk: &[u8]) -> FrameResult<PushStatus> {
        match self.phase {
            Phase::AwaitingHeader => self.push_header(chunk),
            Phase::AwaitingPayload => self.push_data(chunk),
            Phase::Complete | Phase::Failed => Err(FrameError::EntryClosed),
        }
    }

    /// Returns the entry to `AwaitingHeader`, keeping its delimiter and size ceiling.
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingHeader;
        self.action = Action::None;
        self.key = Bytes::new();
        self.flags = 0;
        self.exp_time = 0;
        self.bytes = 0;
        self.noreply = false;
        self.data.clear();
    }

    // ========================================================================
    // Header phase
    // ========================================================================

    fn push_header(&mut self, chunk: &[u8]) -> FrameResult<PushStatus> {
        if chunk.is_empty() || chunk == self.delimiter {
            return Err(FrameError::EmptyRequest);
        }

        let (line, remainder) = split_header(chunk, self.delimiter);
        let tokens = tokenize(line);
        let (name, args) = tokens.split_first().ok_or(FrameError::EmptyRequest)?;

        let action = Action::from_token(name)
            .ok_or_else(|| FrameError::UnknownCommand(token_string(name)))?;

        let header = match action {
            Action::Get => Self::validate_get(args)?,
            Action::Delete => Self::validate_delete(args)?,
            Action::Quit => Header {
                action: Action::Quit,
                key: Bytes::new(),
                flags: 0,
                exp_time: 0,
                bytes: 0,
                noreply: false,
            },
            Action::Set | Action::Add => self.validate_storage(action, args)?,
            // from_token never yields None
            Action::None => return Err(FrameError::UnknownCommand(token_string(name))),
        };

        self.commit(header);

        if !self.action.has_payload() {
            self.phase = Phase::Complete;
            return Ok(PushStatus::Complete);
        }

        self.phase = Phase::AwaitingPayload;
        self.data = BytesMut::with_capacity(self.bytes);

        if !remainder.is_empty() {
            return self.push_data(remainder);
        }

        if self.bytes == 0 {
            self.phase = Phase::Complete;
            return Ok(PushStatus::Complete);
        }

        Ok(PushStatus::NeedMore)
    }

    /// `get <key>`
    fn validate_get(args: &[&[u8]]) -> FrameResult<Header> {
        let key = required_key(args)?;
        if let Some(extra) = args.get(1) {
            return Err(FrameError::UnexpectedArgument(token_string(extra)));
        }

        Ok(Header {
            action: Action::Get,
            key,
            flags: 0,
            exp_time: 0,
            bytes: 0,
            noreply: false,
        })
    }

    /// `delete <key> [noreply]`
    fn validate_delete(args: &[&[u8]]) -> FrameResult<Header> {
        let key = required_key(args)?;
        let noreply = trailing_noreply(&args[1..])?;

        Ok(Header {
            action: Action::Delete,
            key,
            flags: 0,
            exp_time: 0,
            bytes: 0,
            noreply,
        })
    }

    /// `set|add <key> <flags> <exptime> <bytes> [noreply]`
    fn validate_storage(&self, action: Action, args: &[&[u8]]) -> FrameResult<Header> {
        let key = required_key(args)?;

        let flags_token = args.get(1).ok_or(FrameError::MissingArgument("flags"))?;
        let flags = parse_numeric::<u32>(flags_token)
            .ok_or_else(|| FrameError::InvalidFlag(token_string(flags_token)))?;

        let exp_token = args.get(2).ok_or(FrameError::MissingArgument("exptime"))?;
        let exp_time = parse_numeric::<u64>(exp_token)
            .ok_or_else(|| FrameError::InvalidExpiration(token_string(exp_token)))?;

        let bytes_token = args.get(3).ok_or(FrameError::MissingArgument("bytes"))?;
        let bytes = parse_numeric::<usize>(bytes_token)
            .ok_or_else(|| FrameError::InvalidByteLength(token_string(bytes_token)))?;

        if bytes > self.max_item_size {
            return Err(FrameError::ItemTooLarge {
                declared: bytes,
                max: self.max_item_size,
            });
        }

        let noreply = trailing_noreply(&args[4..])?;

        Ok(Header {
            action,
            key,
            flags,
            exp_time,
            bytes,
            noreply,
        })
    }

    fn commit(&mut self, header: Header) {
        self.action = header.action;
        self.key = header.key;
        self.flags = header.flags;
        self.exp_time = header.exp_time;
        self.bytes = header.bytes;
        self.noreply = header.noreply;
    }

    // ========================================================================
    // Payload phase
    // ========================================================================

    fn push_data(&mut self, chunk: &[u8]) -> FrameResult<PushStatus> {
        let is_terminator = chunk == self.delimiter;

        // A bare delimiter once the count is reached is the end-of-data marker
        if is_terminator && self.data.len() == self.bytes {
            self.phase = Phase::Complete;
            return Ok(PushStatus::Complete);
        }

        let piece = if is_terminator {
            chunk
        } else {
            strip_delimiter(chunk, self.delimiter)
        };

        let received = self.data.len() + piece.len();
        if received > self.bytes {
            self.phase = Phase::Failed;
            return Err(FrameError::DataOverflow {
                declared: self.bytes,
                received,
            });
        }

        self.data.extend_from_slice(piece);

        if received == self.bytes {
            self.phase = Phase::Complete;
            Ok(PushStatus::Complete)
        } else {
            Ok(PushStatus::NeedMore)
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// The target key; empty for `quit` and before a header is parsed.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// A cheap clone of the key.
    pub fn key_bytes(&self) -> Bytes {
        self.key.clone()
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Expiration time as sent by the client, in seconds.
    pub fn exp_time(&self) -> u64 {
        self.exp_time
    }

    /// Declared payload length.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Payload accumulated so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the entry and returns its payload without copying.
    pub fn into_data(self) -> Bytes {
        self.data.freeze()
    }

    pub fn noreply(&self) -> bool {
        self.noreply
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Payload bytes still owed; zero outside `AwaitingPayload`.
    pub fn remaining(&self) -> usize {
        match self.phase {
            Phase::AwaitingPayload => self.bytes - self.data.len(),
            _ => 0,
        }
    }

    pub fn delimiter(&self) -> &'static [u8] {
        self.delimiter
    }

    pub fn max_item_size(&self) -> usize {
        self.max_item_size
    }
}

/// The first argument, which must be present and non-empty.
fn required_key(args: &[&[u8]]) -> FrameResult<Bytes> {
    match args.first() {
        Some(key) if !key.is_empty() => Ok(Bytes::copy_from_slice(key)),
        _ => Err(FrameError::MissingArgument("key")),
    }
}

/// Accepts nothing, or a single `noreply` token.
fn trailing_noreply(rest: &[&[u8]]) -> FrameResult<bool> {
    match rest {
        [] => Ok(false),
        [t] if *t == token::NOREPLY => Ok(true),
        [t] => Err(FrameError::UnexpectedArgument(token_string(t))),
        [_, extra, ..] => Err(FrameError::UnexpectedArgument(token_string(extra))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(input: &[u8]) -> RequestEntry {
        let mut entry = RequestEntry::new();
        assert_eq!(entry.push(input).unwrap(), PushStatus::Complete);
        entry
    }

    #[test]
    fn test_set_inline_payload() {
        let entry = complete(b"set foo 0 0 3\r\nbar\r\n");
        assert_eq!(entry.action(), Action::Set);
        assert_eq!(entry.key(), b"foo");
        assert_eq!(entry.flags(), 0);
        assert_eq!(entry.exp_time(), 0);
        assert_eq!(entry.bytes(), 3);
        assert_eq!(entry.data(), b"bar");
        assert!(entry.is_complete());
    }

    #[test]
    fn test_get() {
        let entry = complete(b"get foo\r\n");
        assert_eq!(entry.action(), Action::Get);
        assert_eq!(entry.key(), b"foo");
        assert_eq!(entry.bytes(), 0);
        assert!(entry.data().is_empty());
    }

    #[test]
    fn test_delete() {
        let entry = complete(b"delete foo\r\n");
        assert_eq!(entry.action(), Action::Delete);
        assert_eq!(entry.key(), b"foo");
        assert!(!entry.noreply());
    }

    #[test]
    fn test_delete_noreply() {
        let entry = complete(b"delete foo noreply\r\n");
        assert!(entry.noreply());
    }

    #[test]
    fn test_quit() {
        let entry = complete(b"quit\r\n");
        assert_eq!(entry.action(), Action::Quit);
        assert!(entry.key().is_empty());
    }

    #[test]
    fn test_quit_ignores_arguments() {
        let entry = complete(b"quit now please\r\n");
        assert_eq!(entry.action(), Action::Quit);
    }

    #[test]
    fn test_header_without_delimiter() {
        let entry = complete(b"get foo");
        assert_eq!(entry.key(), b"foo");
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let entry = complete(b"  get foo \r\n");
        assert_eq!(entry.key(), b"foo");
    }

    #[test]
    fn test_empty_request() {
        let mut entry = RequestEntry::new();
        assert_eq!(entry.push(b""), Err(FrameError::EmptyRequest));
        assert_eq!(entry.push(b"\r\n"), Err(FrameError::EmptyRequest));
        assert_eq!(entry.push(b"   \r\n"), Err(FrameError::EmptyRequest));
        assert_eq!(entry.phase(), Phase::AwaitingHeader);
        assert_eq!(entry.action(), Action::None);
    }

    #[test]
    fn test_unknown_command() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"incr foo 1\r\n"),
            Err(FrameError::UnknownCommand("incr".to_string()))
        );
        assert_eq!(
            entry.push(b"GET foo\r\n"),
            Err(FrameError::UnknownCommand("GET".to_string()))
        );
        assert_eq!(entry.action(), Action::None);
    }

    #[test]
    fn test_missing_key() {
        let mut entry = RequestEntry::new();
        assert_eq!(entry.push(b"get\r\n"), Err(FrameError::MissingArgument("key")));
        assert_eq!(
            entry.push(b"delete\r\n"),
            Err(FrameError::MissingArgument("key"))
        );
        assert_eq!(
            entry.push(b"get  foo\r\n"),
            Err(FrameError::MissingArgument("key"))
        );
    }

    #[test]
    fn test_get_rejects_multiple_keys() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"get a b\r\n"),
            Err(FrameError::UnexpectedArgument("b".to_string()))
        );
    }

    #[test]
    fn test_set_missing_fields() {
        let mut entry = RequestEntry::new();
        assert_eq!(entry.push(b"set\r\n"), Err(FrameError::MissingArgument("key")));
        assert_eq!(
            entry.push(b"set foo\r\n"),
            Err(FrameError::MissingArgument("flags"))
        );
        assert_eq!(
            entry.push(b"set foo 0\r\n"),
            Err(FrameError::MissingArgument("exptime"))
        );
        assert_eq!(
            entry.push(b"set foo 0 0\r\n"),
            Err(FrameError::MissingArgument("bytes"))
        );
    }

    #[test]
    fn test_set_invalid_flag() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"set foo x 0 3\r\n"),
            Err(FrameError::InvalidFlag("x".to_string()))
        );
        assert_eq!(entry.phase(), Phase::AwaitingHeader);
        assert_eq!(entry.action(), Action::None);
    }

    #[test]
    fn test_set_invalid_expiration() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"set foo 0 -1 3\r\n"),
            Err(FrameError::InvalidExpiration("-1".to_string()))
        );
    }

    #[test]
    fn test_set_invalid_byte_length() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"set foo 0 0 3x\r\n"),
            Err(FrameError::InvalidByteLength("3x".to_string()))
        );
    }

    #[test]
    fn test_double_space_fails_numeric_validation() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"set foo  0 0 3\r\n"),
            Err(FrameError::InvalidFlag(String::new()))
        );
    }

    #[test]
    fn test_set_noreply() {
        let mut entry = RequestEntry::new();
        entry.push(b"set foo 1 2 3 noreply\r\n").unwrap();
        assert!(entry.noreply());
        assert_eq!(entry.flags(), 1);
        assert_eq!(entry.exp_time(), 2);
    }

    #[test]
    fn test_set_unexpected_trailing_token() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"set foo 0 0 3 maybe\r\n"),
            Err(FrameError::UnexpectedArgument("maybe".to_string()))
        );
        assert_eq!(
            entry.push(b"set foo 0 0 3 noreply extra\r\n"),
            Err(FrameError::UnexpectedArgument("extra".to_string()))
        );
    }

    #[test]
    fn test_add_is_classified() {
        let entry = complete(b"add foo 7 100 2\r\nhi\r\n");
        assert_eq!(entry.action(), Action::Add);
        assert_eq!(entry.flags(), 7);
        assert_eq!(entry.exp_time(), 100);
        assert_eq!(entry.data(), b"hi");
    }

    #[test]
    fn test_set_then_payload_chunk() {
        let mut entry = RequestEntry::new();
        assert_eq!(entry.push(b"set foo 0 0 3\r\n").unwrap(), PushStatus::NeedMore);
        assert_eq!(entry.phase(), Phase::AwaitingPayload);
        assert_eq!(entry.remaining(), 3);
        assert_eq!(entry.push(b"bar\r\n").unwrap(), PushStatus::Complete);
        assert_eq!(entry.data(), b"bar");
        assert_eq!(entry.remaining(), 0);
    }

    #[test]
    fn test_payload_across_several_chunks() {
        let mut entry = RequestEntry::new();
        entry.push(b"set foo 0 0 10\r\n").unwrap();
        assert_eq!(entry.push(b"hello").unwrap(), PushStatus::NeedMore);
        assert_eq!(entry.remaining(), 5);
        assert_eq!(entry.push(b"wor").unwrap(), PushStatus::NeedMore);
        assert_eq!(entry.push(b"ld\r\n").unwrap(), PushStatus::Complete);
        assert_eq!(entry.data(), b"helloworld");
    }

    #[test]
    fn test_zero_length_payload_completes_on_header() {
        let entry = complete(b"set foo 0 0 0\r\n");
        assert_eq!(entry.bytes(), 0);
        assert!(entry.data().is_empty());
    }

    #[test]
    fn test_zero_length_payload_with_terminator() {
        let entry = complete(b"set foo 0 0 0\r\n\r\n");
        assert!(entry.data().is_empty());
    }

    #[test]
    fn test_bare_delimiter_counts_as_data_before_length_reached() {
        let mut entry = RequestEntry::new();
        entry.push(b"set foo 0 0 4\r\n").unwrap();
        assert_eq!(entry.push(b"ab").unwrap(), PushStatus::NeedMore);
        assert_eq!(entry.push(b"\r\n").unwrap(), PushStatus::Complete);
        assert_eq!(entry.data(), b"ab\r\n");
    }

    #[test]
    fn test_inline_exact_fit_without_terminator() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"set foo 0 0 3\r\nbar").unwrap(),
            PushStatus::Complete
        );
        assert_eq!(entry.data(), b"bar");
    }

    #[test]
    fn test_inline_bare_delimiter_is_data() {
        let mut entry = RequestEntry::new();
        assert_eq!(
            entry.push(b"set foo 0 0 2\r\n\r\n").unwrap(),
            PushStatus::Complete
        );
        assert_eq!(entry.data(), b"\r\n");
        assert_eq!(entry.push(b"\r\n"), Err(FrameError::EntryClosed));
    }

    #[test]
    fn test_oversized_byte_count_is_invalid() {
        let mut entry = RequestEntry::new();
        assert!(matches!(
            entry.push(b"set foo 0 0 99999999999999999999999\r\n"),
            Err(FrameError::InvalidByteLength(_))
        ));
    }

    #[test]
    fn test_tab_only_header_is_empty() {
        let mut entry = RequestEntry::new();
        assert_eq!(entry.push(b"\t\r\n"), Err(FrameError::EmptyRequest));
    }

    #[test]
    fn test_payload_keeps_inner_delimiter() {
        let entry = complete(b"set foo 0 0 4\r\na\r\nb\r\n");
        assert_eq!(entry.data(), b"a\r\nb");
    }

    #[test]
    fn test_data_overflow() {
        let mut entry = RequestEntry::new();
        entry.push(b"set foo 0 0 2\r\n").unwrap();
        assert_eq!(
            entry.push(b"abcd\r\n"),
            Err(FrameError::DataOverflow {
                declared: 2,
                received: 4
            })
        );
        assert_eq!(entry.phase(), Phase::Failed);
        assert!(entry.data().is_empty());
    }

    #[test]
    fn test_inline_overflow() {
        let mut entry = RequestEntry::new();
        assert!(matches!(
            entry.push(b"set foo 0 0 1\r\ntoo much\r\n"),
            Err(FrameError::DataOverflow { declared: 1, .. })
        ));
        assert_eq!(entry.phase(), Phase::Failed);
    }

    #[test]
    fn test_overflow_keeps_prior_data() {
        let mut entry = RequestEntry::new();
        entry.push(b"set foo 0 0 5\r\n").unwrap();
        entry.push(b"abc").unwrap();
        assert!(entry.push(b"def").is_err());
        assert_eq!(entry.data(), b"abc");
        assert_eq!(entry.key(), b"foo");
        assert_eq!(entry.bytes(), 5);
    }

    #[test]
    fn test_overflow_regardless_of_chunking() {
        let payload = b"0123456789";
        for split in 1..payload.len() - 1 {
            let mut entry = RequestEntry::new();
            entry.push(b"set k 0 0 9\r\n").unwrap();

            let first = entry.push(&payload[..split]);
            let result = first.and_then(|_| entry.push(&payload[split..]));
            assert!(
                matches!(result, Err(FrameError::DataOverflow { declared: 9, .. })),
                "split at {} gave {:?}",
                split,
                result
            );
        }
    }

    #[test]
    fn test_chunked_delivery_matches_single_chunk() {
        let payload = b"the quick brown fox";
        let header = format!("set k 0 0 {}\r\n", payload.len());

        let mut whole = RequestEntry::new();
        whole.push(header.as_bytes()).unwrap();
        let mut single = payload.to_vec();
        single.extend_from_slice(CRLF);
        assert_eq!(whole.push(&single).unwrap(), PushStatus::Complete);

        for size in 1..=payload.len() {
            let mut entry = RequestEntry::new();
            entry.push(header.as_bytes()).unwrap();

            let mut status = PushStatus::NeedMore;
            for piece in payload.chunks(size) {
                status = entry.push(piece).unwrap();
            }

            assert_eq!(status, PushStatus::Complete, "chunk size {}", size);
            assert_eq!(entry.data(), whole.data());
        }
    }

    #[test]
    fn test_push_after_complete_is_rejected() {
        let mut entry = complete(b"get foo\r\n");
        assert_eq!(entry.push(b"get bar\r\n"), Err(FrameError::EntryClosed));
        assert_eq!(entry.key(), b"foo");
    }

    #[test]
    fn test_push_after_failure_is_rejected() {
        let mut entry = RequestEntry::new();
        entry.push(b"set foo 0 0 1\r\n").unwrap();
        assert!(entry.push(b"xx").is_err());
        assert_eq!(entry.push(b"x"), Err(FrameError::EntryClosed));
    }

    #[test]
    fn test_overflow_after_reset_keeps_header_fields() {
        let mut entry = RequestEntry::new();
        entry.push(b"set foo 3 4 5\r\n").unwrap();
        entry.push(b"hello\r\n").unwrap();
        entry.reset();

        entry.push(b"set bar 1 1 1\r\n").unwrap();
        let before = (entry.key().to_vec(), entry.flags(), entry.bytes());
        assert!(entry.push(b"oops").is_err());
        assert_eq!(before, (entry.key().to_vec(), entry.flags(), entry.bytes()));
    }

    #[test]
    fn test_reset() {
        let mut entry = RequestEntry::with_max_item_size(16);
        entry.push(b"set foo 1 2 3 noreply\r\nabc\r\n").unwrap();
        entry.reset();

        assert_eq!(entry.phase(), Phase::AwaitingHeader);
        assert_eq!(entry.action(), Action::None);
        assert!(entry.key().is_empty());
        assert!(entry.data().is_empty());
        assert!(!entry.noreply());
        assert_eq!(entry.max_item_size(), 16);
    }

    #[test]
    fn test_item_too_large() {
        let mut entry = RequestEntry::with_max_item_size(4);
        assert_eq!(
            entry.push(b"set foo 0 0 5\r\n"),
            Err(FrameError::ItemTooLarge {
                declared: 5,
                max: 4
            })
        );
        assert_eq!(entry.phase(), Phase::AwaitingHeader);
        assert_eq!(entry.push(b"set foo 0 0 4\r\n").unwrap(), PushStatus::NeedMore);
    }

    #[test]
    fn test_custom_delimiter() {
        let mut entry = RequestEntry::with_delimiter(b"\n");
        assert_eq!(entry.push(b"set foo 0 0 3\n").unwrap(), PushStatus::NeedMore);
        assert_eq!(entry.push(b"bar\n").unwrap(), PushStatus::Complete);
        assert_eq!(entry.data(), b"bar");

        let mut entry = RequestEntry::with_delimiter(b"\n");
        assert_eq!(entry.push(b"\n"), Err(FrameError::EmptyRequest));
    }

    #[test]
    fn test_into_data() {
        let entry = complete(b"set foo 0 0 3\r\nbar\r\n");
        assert_eq!(entry.into_data(), Bytes::from("bar"));
    }
}
