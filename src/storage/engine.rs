//! Sharded In-Memory Cache
//!
//! This module implements the item store that services completed
//! `get`/`set`/`add`/`delete` requests. It is a concurrent HashMap split
//! into shards, with per-item flags and expiration.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are distributed across shards by hash, so connections touching
//! different keys rarely contend on the same lock.
//!
//! ## Expiration
//!
//! Memcache exptime values are interpreted as follows:
//! - `0`: never expires
//! - up to 30 days (2,592,000 s): relative seconds from now
//! - anything larger: an absolute Unix timestamp
//!
//! Expired items are removed lazily on access and by the background
//! [`ExpirySweeper`](super::expiry::ExpirySweeper).

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Number of shards for the storage engine.
const NUM_SHARDS: usize = 64;

/// Largest exptime treated as a relative offset (30 days, in seconds)
pub const MAX_RELATIVE_EXPTIME: u64 = 60 * 60 * 24 * 30;

/// When an item stops being visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// The item lives until deleted or replaced
    Never,
    /// The item expires after the given duration
    After(Duration),
    /// The requested time is already in the past
    Expired,
}

impl Expiration {
    /// Interprets a client exptime relative to the current wall clock.
    pub fn from_exptime(exp_time: u64) -> Self {
        let now_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_exptime_at(exp_time, now_unix)
    }

    /// Interprets a client exptime given the current Unix time in seconds.
    pub fn from_exptime_at(exp_time: u64, now_unix: u64) -> Self {
        match exp_time {
            0 => Expiration::Never,
            t if t <= MAX_RELATIVE_EXPTIME => Expiration::After(Duration::from_secs(t)),
            t if t > now_unix => Expiration::After(Duration::from_secs(t - now_unix)),
            _ => Expiration::Expired,
        }
    }

    fn deadline(&self, now: Instant) -> Option<Instant> {
        match self {
            Expiration::Never => None,
            Expiration::After(ttl) => now.checked_add(*ttl),
            Expiration::Expired => Some(now),
        }
    }
}

/// A stored value together with its client flags and expiry.
#[derive(Debug, Clone)]
pub struct Item {
    /// The data block exactly as the client sent it
    pub value: Bytes,
    /// Opaque client flags, echoed back on `get`
    pub flags: u32,
    /// When this item expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Item {
    pub fn new(value: Bytes, flags: u32, expiration: Expiration) -> Self {
        Self {
            value,
            flags,
            expires_at: expiration.deadline(Instant::now()),
        }
    }

    /// Checks if this item has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }
}

/// A single shard containing a portion of the items.
#[derive(Debug, Default)]
struct Shard {
    items: RwLock<HashMap<Bytes, Item>>,
}

/// The item store shared by every connection.
///
/// # Thread Safety
///
/// Wrap it in an `Arc` and hand a clone to each connection; all
/// operations take `&self`.
///
/// # Example
///
/// ```
/// use lemcache::storage::{Expiration, StorageEngine};
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
/// engine.set(Bytes::from("name"), Bytes::from("lem"), 7, Expiration::Never);
///
/// let item = engine.get(&Bytes::from("name")).unwrap();
/// assert_eq!(item.value, Bytes::from("lem"));
/// assert_eq!(item.flags, 7);
///
/// // add only stores absent keys
/// assert!(!engine.add(Bytes::from("name"), Bytes::from("x"), 0, Expiration::Never));
/// ```
pub struct StorageEngine {
    shards: Vec<Shard>,

    /// Statistics: number of stored items (approximate, includes not-yet-swept expired items)
    key_count: AtomicU64,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: GET operations that found a live item
    hit_count: AtomicU64,

    /// Statistics: total SET/ADD operations
    set_count: AtomicU64,

    /// Statistics: total DELETE operations
    del_count: AtomicU64,

    /// Statistics: number of expired items cleaned up
    expired_count: AtomicU64,
}

/// Snapshot of the engine counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub get_ops: u64,
    pub get_hits: u64,
    pub set_ops: u64,
    pub del_ops: u64,
    pub expired: u64,
}

impl StorageEngine {
    /// Creates a new empty storage engine.
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            key_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Returns the shard responsible for `key`.
    #[inline]
    fn get_shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % NUM_SHARDS;
        &self.shards[index]
    }

    /// Stores an item unconditionally.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new key was created, `false` if an existing key was replaced.
    pub fn set(&self, key: Bytes, value: Bytes, flags: u32, expiration: Expiration) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(&key);
        let mut items = shard.items.write();

        let is_new = items
            .insert(key, Item::new(value, flags, expiration))
            .is_none();

        if is_new {
            self.key_count.fetch_add(1, Ordering::Relaxed);
        }

        is_new
    }

    /// Stores an item only if the key is absent (or its item has expired).
    ///
    /// # Returns
    ///
    /// Returns `true` if the item was stored.
    pub fn add(&self, key: Bytes, value: Bytes, flags: u32, expiration: Expiration) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(&key);
        let mut items = shard.items.write();

        match items.get(&key).map(Item::is_expired) {
            Some(false) => false,
            Some(true) => {
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                items.insert(key, Item::new(value, flags, expiration));
                true
            }
            None => {
                self.key_count.fetch_add(1, Ordering::Relaxed);
                items.insert(key, Item::new(value, flags, expiration));
                true
            }
        }
    }

    /// Gets the item for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired; expired items
    /// are removed on the way out.
    pub fn get(&self, key: &[u8]) -> Option<Item> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(key);

        // Fast path under the read lock
        {
            let items = shard.items.read();
            match items.get(key) {
                Some(item) if !item.is_expired() => {
                    self.hit_count.fetch_add(1, Ordering::Relaxed);
                    return Some(item.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut items = shard.items.write();
        match items.get(key).map(Item::is_expired) {
            Some(true) => {
                items.remove(key);
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                None
            }
            // Replaced by another connection between the two locks
            Some(false) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                items.get(key).cloned()
            }
            None => None,
        }
    }

    /// Deletes a key.
    ///
    /// # Returns
    ///
    /// Returns `true` if a live item was deleted, `false` if none existed.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(key);
        let mut items = shard.items.write();

        match items.remove(key) {
            Some(item) => {
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                if item.is_expired() {
                    self.expired_count.fetch_add(1, Ordering::Relaxed);
                    false
                } else {
                    true
                }
            }
            None => false,
        }
    }

    /// Returns the approximate number of stored items.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    /// Returns true if no items are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the engine counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            get_ops: self.get_count.load(Ordering::Relaxed),
            get_hits: self.hit_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }

    /// Removes expired items from all shards.
    ///
    /// # Returns
    ///
    /// Returns the number of items that were removed.
    pub fn cleanup_expired(&self) -> u64 {
        let mut cleaned = 0u64;

        for shard in &self.shards {
            let mut items = shard.items.write();
            let before = items.len();
            items.retain(|_, item| !item.is_expired());
            cleaned += (before - items.len()) as u64;
        }

        if cleaned > 0 {
            self.key_count.fetch_sub(cleaned, Ordering::Relaxed);
            self.expired_count.fetch_add(cleaned, Ordering::Relaxed);
        }

        cleaned
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn key(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn test_set_get() {
        let engine = StorageEngine::new();
        assert!(engine.set(key("k"), key("v"), 3, Expiration::Never));

        let item = engine.get(b"k").unwrap();
        assert_eq!(item.value, key("v"));
        assert_eq!(item.flags, 3);
        assert!(item.expires_at.is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let engine = StorageEngine::new();
        assert!(engine.set(key("k"), key("one"), 0, Expiration::Never));
        assert!(!engine.set(key("k"), key("two"), 1, Expiration::Never));

        let item = engine.get(b"k").unwrap();
        assert_eq!(item.value, key("two"));
        assert_eq!(item.flags, 1);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let engine = StorageEngine::new();
        assert!(engine.get(b"nope").is_none());
        assert_eq!(engine.stats().get_ops, 1);
        assert_eq!(engine.stats().get_hits, 0);
    }

    #[test]
    fn test_add() {
        let engine = StorageEngine::new();
        assert!(engine.add(key("k"), key("first"), 0, Expiration::Never));
        assert!(!engine.add(key("k"), key("second"), 0, Expiration::Never));
        assert_eq!(engine.get(b"k").unwrap().value, key("first"));
    }

    #[test]
    fn test_add_replaces_expired() {
        let engine = StorageEngine::new();
        engine.set(key("k"), key("old"), 0, Expiration::Expired);
        assert!(engine.add(key("k"), key("new"), 0, Expiration::Never));
        assert_eq!(engine.get(b"k").unwrap().value, key("new"));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_delete() {
        let engine = StorageEngine::new();
        engine.set(key("k"), key("v"), 0, Expiration::Never);
        assert!(engine.delete(b"k"));
        assert!(!engine.delete(b"k"));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_expired_item_is_invisible() {
        let engine = StorageEngine::new();
        engine.set(key("k"), key("v"), 0, Expiration::Expired);
        assert!(engine.get(b"k").is_none());
        assert_eq!(engine.len(), 0);
        assert_eq!(engine.stats().expired, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let engine = StorageEngine::new();
        engine.set(
            key("k"),
            key("v"),
            0,
            Expiration::After(Duration::from_millis(20)),
        );
        assert!(engine.get(b"k").is_some());
        thread::sleep(Duration::from_millis(40));
        assert!(engine.get(b"k").is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let engine = StorageEngine::new();
        for i in 0..10 {
            engine.set(key(&format!("gone{}", i)), key("v"), 0, Expiration::Expired);
        }
        engine.set(key("stay"), key("v"), 0, Expiration::Never);

        assert_eq!(engine.cleanup_expired(), 10);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.stats().expired, 10);
    }

    #[test]
    fn test_expiration_from_exptime() {
        let now = 1_700_000_000;
        assert_eq!(Expiration::from_exptime_at(0, now), Expiration::Never);
        assert_eq!(
            Expiration::from_exptime_at(60, now),
            Expiration::After(Duration::from_secs(60))
        );
        assert_eq!(
            Expiration::from_exptime_at(MAX_RELATIVE_EXPTIME, now),
            Expiration::After(Duration::from_secs(MAX_RELATIVE_EXPTIME))
        );
        assert_eq!(
            Expiration::from_exptime_at(now + 100, now),
            Expiration::After(Duration::from_secs(100))
        );
        assert_eq!(
            Expiration::from_exptime_at(now - 100, now),
            Expiration::Expired
        );
    }

    #[test]
    fn test_concurrent_access() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for t in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    let k = key(&format!("t{}:{}", t, i));
                    engine.set(k.clone(), key("v"), t, Expiration::Never);
                    assert_eq!(engine.get(&k).unwrap().flags, t);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 8 * 500);
    }
}
