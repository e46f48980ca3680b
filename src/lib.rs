//! # lemcache - An In-Memory Cache Speaking the Memcache Text Protocol
//!
//! The heart of the crate is [`protocol::RequestEntry`], an incremental
//! request framer: the connection pushes raw chunks into it and it reports
//! whether the request needs more bytes, is complete or is malformed. The
//! framer does no I/O, so it can be driven from a socket loop, a test or a
//! benchmark alike.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              lemcache                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │ chunks           │                         │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌─────────────────────────────┐  │
//! │                     │RequestEntry │    │        StorageEngine        │  │
//! │                     │  (framer)   │    │   64 x RwLock<HashMap>      │  │
//! │                     └─────────────┘    └─────────────────────────────┘  │
//! │                                               ▲                         │
//! │                                               │                         │
//! │                                 ┌─────────────┴─────────────┐           │
//! │                                 │      ExpirySweeper        │           │
//! │                                 └───────────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use lemcache::protocol::{Action, PushStatus, RequestEntry};
//!
//! let mut entry = RequestEntry::new();
//! assert_eq!(entry.push(b"set greeting 0 0 5\r\n").unwrap(), PushStatus::NeedMore);
//! assert_eq!(entry.push(b"hello\r\n").unwrap(), PushStatus::Complete);
//! assert_eq!(entry.action(), Action::Set);
//! assert_eq!(entry.data(), b"hello");
//! ```
//!
//! ## Supported Commands
//!
//! - `get <key>`
//! - `set <key> <flags> <exptime> <bytes> [noreply]` followed by the data block
//! - `add <key> <flags> <exptime> <bytes> [noreply]` followed by the data block
//! - `delete <key> [noreply]`
//! - `quit`
//!
//! ## Module Overview
//!
//! - [`protocol`]: the request framer, its errors and wire replies
//! - [`storage`]: sharded item store with memcache expiry semantics
//! - [`commands`]: executes completed requests
//! - [`connection`]: per-client read loop
//! - [`server`]: accept loop and connection limit
//! - [`config`]: server configuration and CLI flags

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

pub use commands::{CommandHandler, Outcome};
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{FrameError, PushStatus, RequestEntry};
pub use server::Server;
pub use storage::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper, StorageEngine};

/// The default port lemcache listens on (same as memcached)
pub const DEFAULT_PORT: u16 = 11211;

/// The default host lemcache binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of lemcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
