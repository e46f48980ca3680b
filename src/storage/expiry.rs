//! Background Expiry Sweeper
//!
//! Items whose exptime has passed are dropped lazily when a `get`, `add`
//! or `delete` touches them. Items nobody asks for again would otherwise
//! sit in memory forever, so this task periodically sweeps every shard.
//!
//! ## Adaptive Interval
//!
//! After each sweep the interval is adjusted from the fraction of items
//! that had expired: a high fraction halves it (down to `min_interval`),
//! an idle sweep doubles it (up to `max_interval`).

use crate::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Starting interval between sweeps (default: 1s)
    pub base_interval: Duration,

    /// Shortest interval the sweeper will speed up to (default: 100ms)
    pub min_interval: Duration,

    /// Longest interval the sweeper will back off to (default: 10s)
    pub max_interval: Duration,

    /// Expired fraction above which the sweeper speeds up
    pub speedup_threshold: f64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(1),
            min_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(10),
            speedup_threshold: 0.25,
        }
    }
}

impl ExpiryConfig {
    /// Computes the next interval from the outcome of one sweep.
    pub fn next_interval(&self, current: Duration, scanned: u64, expired: u64) -> Duration {
        if scanned > 0 && expired as f64 / scanned as f64 > self.speedup_threshold {
            (current / 2).max(self.min_interval)
        } else if expired == 0 {
            (current * 2).min(self.max_interval)
        } else {
            current
        }
    }
}

/// Handle to the running sweeper task.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Spawns the sweeper on the current Tokio runtime.
    pub fn start(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(engine, config, shutdown_rx));
        info!("Background expiry sweeper started");

        Self { shutdown_tx }
    }

    /// Signals the task to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper stopped");
                    return;
                }
            }
        }

        let scanned = engine.len();
        let expired = engine.cleanup_expired();
        let next = config.next_interval(interval, scanned, expired);

        if expired > 0 {
            debug!(
                expired = expired,
                remaining = engine.len(),
                next_interval_ms = next.as_millis() as u64,
                "Expired items swept"
            );
        } else if next != interval {
            trace!(next_interval_ms = next.as_millis() as u64, "Sweeper backing off");
        }

        interval = next;
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper(engine: Arc<StorageEngine>) -> ExpirySweeper {
    ExpirySweeper::start(engine, ExpiryConfig::default())
}
