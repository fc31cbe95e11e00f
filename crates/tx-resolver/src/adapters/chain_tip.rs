//! Chain Tip Adapters
//!
//! `SharedChainTip` is the process-wide blue score cell; `ChainTipPoller`
//! is a publisher that keeps it current from a `BlueScoreFeed`.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{BlueScore, UNKNOWN_BLUE_SCORE};
use crate::ports::{BlueScoreFeed, ChainTipSource};

/// Shortest poll interval; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Shared chain-tip cell. Starts at the "unknown" sentinel.
#[derive(Clone)]
pub struct SharedChainTip {
    cell: Arc<watch::Sender<BlueScore>>,
}

impl Default for SharedChainTip {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedChainTip {
    /// Create a cell holding [`UNKNOWN_BLUE_SCORE`].
    pub fn new() -> Self {
        let (cell, _) = watch::channel(UNKNOWN_BLUE_SCORE);
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Publish a new reading. Returns whether subscribers were notified.
    pub fn publish(&self, score: BlueScore) -> bool {
        self.cell.send_if_modified(|current| {
            if *current == score {
                return false;
            }
            *current = score;
            true
        })
    }
}

impl ChainTipSource for SharedChainTip {
    fn blue_score(&self) -> BlueScore {
        *self.cell.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<BlueScore> {
        self.cell.subscribe()
    }
}

/// Polls a blue score feed and publishes into a [`SharedChainTip`].
pub struct ChainTipPoller<F: BlueScoreFeed> {
    feed: Arc<F>,
    tip: SharedChainTip,
    interval: Duration,
}

impl<F: BlueScoreFeed + 'static> ChainTipPoller<F> {
    /// Create a poller. Intervals below 1ms are raised to 1ms.
    pub fn new(feed: Arc<F>, tip: SharedChainTip, interval: Duration) -> Self {
        Self {
            feed,
            tip,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Poll once. Failures are logged and leave the tip untouched.
    pub async fn poll_once(&self) -> Option<BlueScore> {
        match self.feed.fetch_blue_score().await {
            Ok(score) => {
                if self.tip.publish(score) {
                    debug!(blue_score = score, "[tx-resolver] Chain tip updated");
                }
                Some(score)
            }
            Err(e) => {
                warn!("[tx-resolver] Chain tip poll failed: {}", e);
                None
            }
        }
    }

    /// Poll every interval until `shutdown` flips to `true` or its sender is
    /// dropped. The first poll happens one interval after spawning; call
    /// [`poll_once`](Self::poll_once) beforehand for an immediate reading.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // Skip the immediate tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.poll_once().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("[tx-resolver] Chain tip poller stopped");
        })
    }
}
