//! TCP accept loop
//!
//! Hands every accepted socket to its own [`handle_connection`] task. Each
//! task holds one permit of a semaphore sized to `max_connections`; the
//! permit is taken in the accept loop itself, so a burst of queued clients
//! cannot slip past the limit before their tasks start.

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::StorageEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Sent to clients refused at the connection limit.
pub const TOO_MANY_CONNECTIONS: &[u8] = b"SERVER_ERROR too many open connections\r\n";

/// A memcache server bound to a listener.
pub struct Server {
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
    limit: Arc<Semaphore>,
    max_item_size: usize,
}

impl Server {
    pub fn new(
        listener: TcpListener,
        config: &Config,
        storage: Arc<StorageEngine>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            listener,
            storage,
            stats,
            limit: Arc::new(Semaphore::new(config.max_connections)),
            max_item_size: config.max_item_size,
        }
    }

    /// Accepts connections until the task is dropped.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let permit = match Arc::clone(&self.limit).try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            self.stats.connection_rejected();
                            warn!(client = %addr, "Connection limit reached");
                            refuse(stream, addr).await;
                            continue;
                        }
                    };

                    let handler = CommandHandler::new(Arc::clone(&self.storage));
                    let stats = Arc::clone(&self.stats);
                    let max_item_size = self.max_item_size;

                    tokio::spawn(async move {
                        handle_connection(stream, addr, handler, stats, max_item_size).await;
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

async fn refuse(mut stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.write_all(TOO_MANY_CONNECTIONS).await {
        debug!(client = %addr, error = %e, "Could not send refusal");
    }
}
