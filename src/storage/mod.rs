//! Storage Engine Module
//!
//! The item store that completed requests are executed against: a
//! thread-safe, sharded map from key to `{value, flags, expiry}` plus a
//! background sweeper for expired items.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```

pub mod engine;
pub mod expiry;

pub use engine::{Expiration, Item, StorageEngine, StorageStats, MAX_RELATIVE_EXPTIME};
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper};
