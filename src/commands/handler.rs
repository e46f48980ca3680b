//! Command Execution
//!
//! Turns a completed [`RequestEntry`] into a storage operation and the
//! reply the client should see.
//!
//! | Request  | Storage call              | Reply                          |
//! |----------|---------------------------|--------------------------------|
//! | `get`    | `StorageEngine::get`      | `VALUE ... END` or `END`       |
//! | `set`    | `StorageEngine::set`      | `STORED`                       |
//! | `add`    | `StorageEngine::add`      | `STORED` or `NOT_STORED`       |
//! | `delete` | `StorageEngine::delete`   | `DELETED` or `NOT_FOUND`       |
//! | `quit`   | none                      | connection closes, no reply    |
//!
//! Storage and delete requests carrying `noreply` execute normally but
//! produce no reply.

use crate::protocol::{Action, Reply, RequestEntry};
use crate::storage::{Expiration, StorageEngine};
use std::sync::Arc;
use tracing::debug;

/// What the connection should do after a request executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Write this reply and keep reading
    Reply(Reply),
    /// Write nothing and keep reading (`noreply`)
    Silent,
    /// Close the connection (`quit`)
    Close,
}

/// Executes completed requests against the shared storage engine.
#[derive(Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// Executes a completed entry.
    ///
    /// An entry that has not completed yields `SERVER_ERROR`; the
    /// connection only hands over entries whose `push` returned `Complete`.
    pub fn execute(&self, entry: RequestEntry) -> Outcome {
        if !entry.is_complete() {
            return Outcome::Reply(Reply::server_error("incomplete request"));
        }

        let noreply = entry.noreply();
        let reply = match entry.action() {
            Action::Get => self.cmd_get(&entry),
            Action::Set | Action::Add => self.cmd_store(entry),
            Action::Delete => self.cmd_delete(&entry),
            Action::Quit => return Outcome::Close,
            // A complete entry always carries a command
            Action::None => Reply::Error,
        };

        if noreply {
            Outcome::Silent
        } else {
            Outcome::Reply(reply)
        }
    }

    fn cmd_get(&self, entry: &RequestEntry) -> Reply {
        match self.storage.get(entry.key()) {
            Some(item) => Reply::Value {
                key: entry.key_bytes(),
                flags: item.flags,
                data: item.value,
            },
            None => Reply::End,
        }
    }

    fn cmd_store(&self, entry: RequestEntry) -> Reply {
        let action = entry.action();
        let key = entry.key_bytes();
        let flags = entry.flags();
        let expiration = Expiration::from_exptime(entry.exp_time());
        let value = entry.into_data();

        debug!(
            command = %action,
            bytes = value.len(),
            flags = flags,
            "Storing item"
        );

        let stored = match action {
            Action::Add => self.storage.add(key, value, flags, expiration),
            _ => {
                self.storage.set(key, value, flags, expiration);
                true
            }
        };

        if stored {
            Reply::Stored
        } else {
            Reply::NotStored
        }
    }

    fn cmd_delete(&self, entry: &RequestEntry) -> Reply {
        if self.storage.delete(entry.key()) {
            Reply::Deleted
        } else {
            Reply::NotFound
        }
    }

    /// The shared storage engine.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }
}
