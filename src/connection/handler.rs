//! Connection Handler Module
//!
//! Each client connection runs its own loop: read bytes, cut them into
//! chunks, push the chunks into the current [`RequestEntry`], execute the
//! entry once it completes and write the reply.
//!
//! ## Chunking
//!
//! The entry owns interpretation; this loop owns chunk boundaries.
//!
//! ```text
//! Phase::AwaitingHeader   -> one line, up to and including CRLF
//! Phase::AwaitingPayload  -> remaining() + 2 bytes (data + CRLF)
//! ```
//!
//! When the two bytes after the declared data are not CRLF, the chunk runs on
//! to the next CRLF instead. It overflows the entry, is answered with
//! `CLIENT_ERROR bad data chunk`, and the whole bad data line is consumed.
//! After a header declaring an oversized item the declared data block is
//! skipped unread.
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. TCP is a stream, so a read can
//! end mid-line or carry several pipelined requests; chunks are split off the
//! front of the buffer only once they are whole.

use crate::commands::{CommandHandler, Outcome};
use crate::protocol::parser::find_delimiter;
use crate::protocol::{
    FrameError, Phase, PushStatus, Reply, RequestEntry, DEFAULT_MAX_ITEM_SIZE,
};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Slack on top of the item size for the header line and its terminators
const HEADER_ALLOWANCE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Connections turned away at the limit
    pub connections_rejected: AtomicU64,
    /// Total requests executed
    pub commands_processed: AtomicU64,
    /// Requests rejected by the framer
    pub client_errors: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_error(&self) {
        self.client_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Whether the loop keeps going after a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Handles a single client connection.
pub struct ConnectionHandler<S> {
    /// The client stream, buffered for writes
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes received but not yet framed
    buffer: BytesMut,

    /// The request currently being framed
    entry: RequestEntry,

    /// Ceiling on declared payload length
    max_item_size: usize,

    /// Bytes of a rejected oversized payload still to skip
    discard: usize,

    /// An empty data block completed on its header; its terminator is next
    skip_terminator: bool,

    /// The command handler (shared storage)
    command_handler: CommandHandler,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler using the default item size ceiling.
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            entry: RequestEntry::new(),
            max_item_size: DEFAULT_MAX_ITEM_SIZE,
            discard: 0,
            skip_terminator: false,
            command_handler,
            stats,
        }
    }

    /// Sets the largest payload a `set`/`add` header may declare.
    pub fn with_max_item_size(mut self, max_item_size: usize) -> Self {
        self.max_item_size = max_item_size;
        self.entry = RequestEntry::with_max_item_size(max_item_size);
        self
    }

    /// Runs the connection until the client quits, disconnects or errors.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client quit"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The read-frame-execute-reply loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(chunk) = self.next_chunk() {
                if self.handle_chunk(&chunk).await? == Flow::Close {
                    return Ok(());
                }
            }

            self.read_more_data().await?;
        }
    }

    /// Splits the next whole chunk off the buffer, if one has arrived.
    fn next_chunk(&mut self) -> Option<BytesMut> {
        if self.discard > 0 {
            let skipped = self.discard.min(self.buffer.len());
            let _ = self.buffer.split_to(skipped);
            self.discard -= skipped;
            if self.discard > 0 {
                return None;
            }
        }

        let delimiter = self.entry.delimiter();

        if self.skip_terminator {
            if self.buffer.len() < delimiter.len() {
                return None;
            }
            self.skip_terminator = false;
            if self.buffer.starts_with(delimiter) {
                let _ = self.buffer.split_to(delimiter.len());
            }
        }

        match self.entry.phase() {
            Phase::AwaitingPayload => {
                let remaining = self.entry.remaining();
                let needed = remaining + delimiter.len();
                if self.buffer.len() < needed {
                    trace!(
                        client = %self.addr,
                        buffered = self.buffer.len(),
                        needed = needed,
                        "Waiting for payload"
                    );
                    return None;
                }

                if self.buffer[..needed].ends_with(delimiter) {
                    return Some(self.buffer.split_to(needed));
                }

                // Data runs past the declared length: hand over the whole line
                let pos = find_delimiter(&self.buffer[remaining..], delimiter)?;
                Some(self.buffer.split_to(remaining + pos + delimiter.len()))
            }
            _ => {
                let pos = find_delimiter(&self.buffer, delimiter)?;
                Some(self.buffer.split_to(pos + delimiter.len()))
            }
        }
    }

    /// Pushes one chunk into the current entry and acts on the result.
    async fn handle_chunk(&mut self, chunk: &[u8]) -> Result<Flow, ConnectionError> {
        match self.entry.push(chunk) {
            Ok(PushStatus::NeedMore) => {
                trace!(
                    client = %self.addr,
                    remaining = self.entry.remaining(),
                    "Request needs more data"
                );
                Ok(Flow::Continue)
            }
            Ok(PushStatus::Complete) => {
                let fresh = RequestEntry::with_max_item_size(self.max_item_size);
                let entry = std::mem::replace(&mut self.entry, fresh);

                debug!(
                    client = %self.addr,
                    command = %entry.action(),
                    bytes = entry.bytes(),
                    "Request complete"
                );
                self.stats.command_processed();
                self.skip_terminator = entry.action().has_payload() && entry.bytes() == 0;

                match self.command_handler.execute(entry) {
                    Outcome::Reply(reply) => {
                        self.send_reply(&reply).await?;
                        Ok(Flow::Continue)
                    }
                    Outcome::Silent => Ok(Flow::Continue),
                    Outcome::Close => Ok(Flow::Close),
                }
            }
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Rejected request");
                self.stats.client_error();

                if let FrameError::ItemTooLarge { declared, .. } = e {
                    self.discard = declared.saturating_add(self.entry.delimiter().len());
                }
                self.entry.reset();

                self.send_reply(&e.client_reply()).await?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= self.max_item_size + HEADER_ALLOWANCE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            let idle = self.buffer.is_empty() && self.entry.phase() == Phase::AwaitingHeader;
            return Err(if idle {
                ConnectionError::ClientDisconnected
            } else {
                ConnectionError::UnexpectedEof
            });
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Writes a reply to the client.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let bytes = reply.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.addr,
            reply = %reply,
            bytes = bytes.len(),
            "Sent reply"
        );
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Client disconnected between requests
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Client disconnected in the middle of a request
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a client connection to completion.
///
/// # Arguments
///
/// * `stream` - The TCP stream for this connection
/// * `addr` - The client's socket address
/// * `command_handler` - The command handler for executing requests
/// * `stats` - Shared connection statistics
/// * `max_item_size` - Largest payload a request may declare
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    max_item_size: usize,
) {
    if let Err(e) = stream.set_nodelay(true) {
        trace!(client = %addr, error = %e, "Could not disable Nagle");
    }

    let handler = ConnectionHandler::new(stream, addr, command_handler, stats)
        .with_max_item_size(max_item_size);

    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
