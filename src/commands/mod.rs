//! Command Handler Module
//!
//! Executes fully framed requests against the storage engine and decides
//! what goes back on the wire.
//!
//! ```text
//! Client chunks
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RequestEntry   │  (protocol module)
//! └────────┬────────┘
//!          │ complete
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;

pub use handler::{CommandHandler, Outcome};
