//! Connection Handler Module
//!
//! Manages individual client connections. Each connection runs in its own
//! Tokio task and owns one in-flight [`RequestEntry`](crate::protocol::RequestEntry).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (main.rs)                                │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept() (refused past max_connections)
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ Cut chunk   │───>│ entry.push  │     │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘     │
//! │                                               │ Complete    │
//! │                                               ▼             │
//! │                     ┌─────────────┐    ┌─────────────┐     │
//! │                     │ Send reply  │<───│ Execute     │     │
//! │                     └─────────────┘    └─────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use lemcache::connection::{handle_connection, ConnectionStats};
//! use lemcache::commands::CommandHandler;
//! use lemcache::storage::StorageEngine;
//! use std::sync::Arc;
//!
//! let storage = Arc::new(StorageEngine::new());
//! let stats = Arc::new(ConnectionStats::new());
//! let handler = CommandHandler::new(storage);
//!
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler, stats, 1024 * 1024));
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
