//! # Outbound Ports
//!
//! Traits for external dependencies: the indexer API, the chain-tip state and
//! the retry timer.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;

use crate::domain::{BlueScore, ClientError, SourceTransaction, Transaction, TransactionId};

/// Detail text the indexer returns for ids it has not ingested yet.
pub const NOT_FOUND_DETAIL: &str = "Transaction not found";

/// Outcome of a primary fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Indexer returned the transaction.
    Found(Transaction),
    /// Indexer has not ingested the id (lag, not a permanent error).
    NotFound,
}

/// Projection requested from the batch endpoint.
///
/// Partial result sets are always accepted: the batch call may return fewer
/// records than requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchProjection {
    /// Only `transaction_id` and `outputs` are needed.
    pub outputs_only: bool,
}

impl Default for BatchProjection {
    fn default() -> Self {
        Self { outputs_only: true }
    }
}

/// Transaction data client - outbound port.
#[async_trait]
pub trait TransactionDataClient: Send + Sync {
    /// Fetch one transaction by id.
    async fn fetch_transaction(&self, id: &TransactionId) -> Result<FetchOutcome, ClientError>;

    /// Fetch many transactions in one request. May return fewer records
    /// than requested, in any order.
    async fn fetch_transactions_batch(
        &self,
        ids: &[TransactionId],
        projection: BatchProjection,
    ) -> Result<Vec<SourceTransaction>, ClientError>;
}

/// Source of blue score readings for the chain-tip publisher.
#[async_trait]
pub trait BlueScoreFeed: Send + Sync {
    /// Current virtual chain blue score.
    async fn fetch_blue_score(&self) -> Result<BlueScore, ClientError>;
}

/// Read-only view of the process-wide chain tip.
pub trait ChainTipSource: Send + Sync {
    /// Latest observed blue score; `0` until known.
    fn blue_score(&self) -> BlueScore;

    /// Change notifications.
    fn subscribe(&self) -> watch::Receiver<BlueScore>;
}

/// Timer used between not-found retries.
#[async_trait]
pub trait RetryScheduler: Send + Sync {
    /// Suspend for `duration`.
    async fn delay(&self, duration: Duration);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockState {
    transactions: HashMap<TransactionId, Transaction>,
    not_found_remaining: HashMap<TransactionId, u32>,
    fetch_errors: HashMap<TransactionId, ClientError>,
    sources: HashMap<TransactionId, SourceTransaction>,
    batch_error: Option<ClientError>,
    blue_score: BlueScore,
    fetch_calls: HashMap<TransactionId, u32>,
    batch_requests: Vec<(Vec<TransactionId>, BatchProjection)>,
}

/// Scripted in-memory indexer for testing.
///
/// Unknown ids answer `NotFound` forever.
#[derive(Default)]
pub struct MockTransactionClient {
    state: Mutex<MockState>,
}

impl MockTransactionClient {
    /// Empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `tx` on its own id.
    pub fn with_transaction(mut self, tx: Transaction) -> Self {
        self.state
            .get_mut()
            .transactions
            .insert(tx.transaction_id.clone(), tx);
        self
    }

    /// Answer `NotFound` for the first `times` fetches of `id`.
    pub fn with_not_found(mut self, id: impl Into<TransactionId>, times: u32) -> Self {
        self.state
            .get_mut()
            .not_found_remaining
            .insert(id.into(), times);
        self
    }

    /// Fail every fetch of `id`.
    pub fn with_fetch_error(mut self, id: impl Into<TransactionId>, error: ClientError) -> Self {
        self.state.get_mut().fetch_errors.insert(id.into(), error);
        self
    }

    /// Serve `source` from the batch endpoint.
    pub fn with_source(mut self, source: SourceTransaction) -> Self {
        self.state
            .get_mut()
            .sources
            .insert(source.transaction_id.clone(), source);
        self
    }

    /// Fail every batch request.
    pub fn with_batch_error(mut self, error: ClientError) -> Self {
        self.state.get_mut().batch_error = Some(error);
        self
    }

    /// Set the blue score returned by the feed.
    pub fn set_blue_score(&self, score: BlueScore) {
        self.state.lock().blue_score = score;
    }

    /// Primary fetches issued for `id`.
    pub fn fetch_count(&self, id: &TransactionId) -> u32 {
        self.state.lock().fetch_calls.get(id).copied().unwrap_or(0)
    }

    /// Batch requests issued, in order.
    pub fn batch_requests(&self) -> Vec<(Vec<TransactionId>, BatchProjection)> {
        self.state.lock().batch_requests.clone()
    }
}

#[async_trait]
impl TransactionDataClient for MockTransactionClient {
    async fn fetch_transaction(&self, id: &TransactionId) -> Result<FetchOutcome, ClientError> {
        let mut state = self.state.lock();
        *state.fetch_calls.entry(id.clone()).or_insert(0) += 1;

        if let Some(err) = state.fetch_errors.get(id) {
            return Err(err.clone());
        }
        if let Some(remaining) = state.not_found_remaining.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(FetchOutcome::NotFound);
            }
        }
        Ok(state
            .transactions
            .get(id)
            .cloned()
            .map_or(FetchOutcome::NotFound, FetchOutcome::Found))
    }

    async fn fetch_transactions_batch(
        &self,
        ids: &[TransactionId],
        projection: BatchProjection,
    ) -> Result<Vec<SourceTransaction>, ClientError> {
        let mut state = self.state.lock();
        state.batch_requests.push((ids.to_vec(), projection));

        if let Some(err) = &state.batch_error {
            return Err(err.clone());
        }
        // Reverse order so callers cannot rely on request order.
        Ok(ids
            .iter()
            .rev()
            .filter_map(|id| state.sources.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl BlueScoreFeed for MockTransactionClient {
    async fn fetch_blue_score(&self) -> Result<BlueScore, ClientError> {
        Ok(self.state.lock().blue_score)
    }
}

/// Scheduler that records requested delays and returns at once.
#[derive(Default)]
pub struct RecordingScheduler {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingScheduler {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl RetryScheduler for RecordingScheduler {
    async fn delay(&self, duration: Duration) {
        self.delays.lock().push(duration);
        tokio::task::yield_now().await;
    }
}
