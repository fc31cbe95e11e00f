//! # Transaction Resolver
//!
//! Bounded-retry state machine for the primary transaction:
//!
//! ```text
//! Idle → Fetching → Resolved
//!                 → NotFound(n) → (delay) → Fetching
//!                 → PermanentlyNotFound      (n == max attempts)
//!                 → Failed                   (hard error, no retry)
//! ```
//!
//! Every load is tagged with an epoch taken when it starts. All state
//! mutations go through [`TransactionResolver::apply`], which drops them when
//! the epoch is no longer current, so a superseded load (including a retry
//! timer that fires late) is inert.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::enricher::InputEnricher;
use crate::algorithms::derive_status_with_threshold;
use crate::config::ResolverConfig;
use crate::domain::{
    BlueScore, ConfirmationStatus, ResolutionPhase, ResolverError, Transaction, TransactionId,
    TransactionView,
};
use crate::ports::{
    BatchProjection, FetchOutcome, ResolveOutcome, RetryScheduler, TransactionDataClient,
    TransactionExplorerApi,
};

/// Transaction resolver - owns the view cell for the current identifier.
pub struct TransactionResolver<C: TransactionDataClient, S: RetryScheduler> {
    /// Configuration.
    config: ResolverConfig,
    /// Indexer client.
    client: Arc<C>,
    /// Retry timer.
    scheduler: Arc<S>,
    /// Source-transaction enrichment.
    enricher: InputEnricher<C>,
    /// View cell observed by the presentation surface.
    state: watch::Sender<TransactionView>,
}

impl<C: TransactionDataClient, S: RetryScheduler> TransactionResolver<C, S> {
    /// Create a new resolver.
    pub fn new(config: ResolverConfig, client: Arc<C>, scheduler: Arc<S>) -> Self {
        let projection = BatchProjection {
            outputs_only: config.outputs_only_batch,
        };
        let enricher = InputEnricher::new(Arc::clone(&client), projection);
        let (state, _) = watch::channel(TransactionView::default());
        Self {
            config,
            client,
            scheduler,
            enricher,
            state,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Current view snapshot.
    pub fn snapshot(&self) -> TransactionView {
        self.state.borrow().clone()
    }

    /// Watch the view cell.
    pub fn subscribe_view(&self) -> watch::Receiver<TransactionView> {
        self.state.subscribe()
    }

    /// Load `id` and drive it to a terminal phase.
    ///
    /// Any previous load is superseded first: its result, lookup, error flag
    /// and retry counter are cleared.
    pub async fn resolve(&self, id: TransactionId) -> Result<ResolveOutcome, ResolverError> {
        if id.is_empty() {
            return Err(ResolverError::InvalidIdentifier);
        }
        let epoch = self.begin_load(&id);
        self.drive(id, epoch).await
    }

    /// Start a new load for `id`, returning its epoch.
    fn begin_load(&self, id: &TransactionId) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|view| {
            view.epoch += 1;
            epoch = view.epoch;
            view.id = Some(id.clone());
            view.phase = ResolutionPhase::Idle;
            view.transaction = None;
            view.source_lookup = None;
            view.error = false;
            view.retry_count = 0;
        });
        debug!(tx_id = %id, epoch, "[tx-resolver] Load started");
        epoch
    }

    /// Apply `mutate` only if `epoch` is still current. Returns whether it ran.
    fn apply(&self, epoch: u64, mutate: impl FnOnce(&mut TransactionView)) -> bool {
        self.state.send_if_modified(|view| {
            if view.epoch != epoch {
                return false;
            }
            mutate(view);
            true
        })
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.state.borrow().epoch == epoch
    }

    fn superseded(&self, id: &TransactionId, epoch: u64) -> ResolveOutcome {
        debug!(tx_id = %id, epoch, "[tx-resolver] Discarding stale load");
        ResolveOutcome::Superseded
    }

    async fn drive(&self, id: TransactionId, epoch: u64) -> Result<ResolveOutcome, ResolverError> {
        let max_attempts = self.config.max_not_found_attempts.max(1);

        loop {
            let mut attempt = 0;
            if !self.apply(epoch, |view| {
                attempt = view.retry_count + 1;
                view.phase = ResolutionPhase::Fetching { attempt };
            }) {
                return Ok(self.superseded(&id, epoch));
            }

            debug!(tx_id = %id, epoch, attempt, "[tx-resolver] Fetching transaction");
            match self.client.fetch_transaction(&id).await {
                Ok(FetchOutcome::Found(tx)) => return Ok(self.store(&id, epoch, tx).await),
                Ok(FetchOutcome::NotFound) => {
                    let mut attempts = 0;
                    if !self.apply(epoch, |view| {
                        view.retry_count += 1;
                        attempts = view.retry_count;
                        view.phase = if attempts >= max_attempts {
                            ResolutionPhase::PermanentlyNotFound { attempts }
                        } else {
                            ResolutionPhase::NotFound { attempts }
                        };
                    }) {
                        return Ok(self.superseded(&id, epoch));
                    }

                    if attempts >= max_attempts {
                        warn!(
                            tx_id = %id, attempts,
                            "[tx-resolver] Transaction still not indexed, giving up"
                        );
                        return Ok(ResolveOutcome::PermanentlyNotFound { attempts });
                    }

                    warn!(
                        tx_id = %id, attempts,
                        "[tx-resolver] Transaction not indexed yet, retrying in {}ms",
                        self.config.retry_delay_ms
                    );
                    self.scheduler.delay(self.config.retry_delay()).await;
                    if !self.is_current(epoch) {
                        return Ok(self.superseded(&id, epoch));
                    }
                }
                Err(source) => {
                    let reason = source.to_string();
                    if !self.apply(epoch, |view| {
                        view.error = true;
                        view.transaction = None;
                        view.source_lookup = None;
                        view.phase = ResolutionPhase::Failed { reason };
                    }) {
                        return Ok(self.superseded(&id, epoch));
                    }
                    return Err(ResolverError::Fetch { id, source });
                }
            }
        }
    }

    /// Store a fetched transaction, then enrich its inputs.
    async fn store(&self, id: &TransactionId, epoch: u64, tx: Transaction) -> ResolveOutcome {
        let tx = Arc::new(tx);
        if !self.apply(epoch, |view| {
            view.transaction = Some(Arc::clone(&tx));
            view.phase = ResolutionPhase::Resolved;
            view.error = false;
        }) {
            return self.superseded(id, epoch);
        }
        info!(
            tx_id = %id,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            "[tx-resolver] Transaction resolved"
        );

        let lookup = Arc::new(self.enricher.enrich(&tx).await);
        if !self.apply(epoch, |view| view.source_lookup = Some(lookup)) {
            debug!(tx_id = %id, epoch, "[tx-resolver] Discarding stale enrichment");
        }
        ResolveOutcome::Resolved(tx)
    }
}

impl<C, S> TransactionResolver<C, S>
where
    C: TransactionDataClient + 'static,
    S: RetryScheduler + 'static,
{
    /// Navigate to `id` without awaiting the load.
    ///
    /// The load starts (and supersedes the previous one) before this returns;
    /// fetching runs on the runtime. Hard failures are logged.
    pub fn navigate(self: &Arc<Self>, id: impl Into<TransactionId>) -> JoinHandle<()> {
        let id = id.into();
        let resolver = Arc::clone(self);

        if id.is_empty() {
            warn!("[tx-resolver] Ignoring navigation to an empty identifier");
            return tokio::spawn(async {});
        }
        let epoch = resolver.begin_load(&id);

        tokio::spawn(async move {
            if let Err(e) = resolver.drive(id, epoch).await {
                error!("[tx-resolver] {}", e);
            }
        })
    }
}

#[async_trait]
impl<C, S> TransactionExplorerApi for TransactionResolver<C, S>
where
    C: TransactionDataClient + 'static,
    S: RetryScheduler + 'static,
{
    async fn resolve(&self, id: TransactionId) -> Result<ResolveOutcome, ResolverError> {
        TransactionResolver::resolve(self, id).await
    }

    fn view(&self) -> TransactionView {
        self.snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<TransactionView> {
        self.subscribe_view()
    }

    fn confirmation_status(&self, chain_tip: BlueScore) -> Option<ConfirmationStatus> {
        let view = self.state.borrow();
        let tx = view.transaction.as_deref()?;
        Some(derive_status_with_threshold(
            tx,
            chain_tip,
            self.config.confirmed_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientError;
    use crate::ports::{MockTransactionClient, RecordingScheduler};
    use std::time::Duration;

    fn tx(id: &str) -> Transaction {
        Transaction {
            transaction_id: TransactionId::from(id),
            is_accepted: true,
            accepting_block_blue_score: Some(100),
            ..Default::default()
        }
    }

    fn resolver(
        client: MockTransactionClient,
    ) -> (
        TransactionResolver<MockTransactionClient, RecordingScheduler>,
        Arc<MockTransactionClient>,
        Arc<RecordingScheduler>,
    ) {
        let client = Arc::new(client);
        let scheduler = Arc::new(RecordingScheduler::new());
        let resolver = TransactionResolver::new(
            ResolverConfig::for_testing(),
            Arc::clone(&client),
            Arc::clone(&scheduler),
        );
        (resolver, client, scheduler)
    }

    #[test]
    fn test_initial_view_is_idle() {
        let (resolver, _, _) = resolver(MockTransactionClient::new());
        let view = resolver.snapshot();
        assert_eq!(view.phase, ResolutionPhase::Idle);
        assert!(view.is_loading());
        assert_eq!(view.epoch, 0);
    }

    #[tokio::test]
    async fn test_resolves_on_first_attempt() {
        let (resolver, client, scheduler) =
            resolver(MockTransactionClient::new().with_transaction(tx("a")));

        let outcome = resolver.resolve(TransactionId::from("a")).await.unwrap();

        assert_eq!(outcome.transaction().unwrap().transaction_id.as_str(), "a");
        let view = resolver.snapshot();
        assert_eq!(view.phase, ResolutionPhase::Resolved);
        assert!(view.is_enriched());
        assert_eq!(view.retry_count, 0);
        assert_eq!(client.fetch_count(&TransactionId::from("a")), 1);
        assert!(scheduler.delays().is_empty());
    }

    #[tokio::test]
    async fn test_retries_not_found_then_resolves() {
        let (resolver, client, scheduler) = resolver(
            MockTransactionClient::new()
                .with_transaction(tx("a"))
                .with_not_found("a", 3),
        );

        let outcome = resolver.resolve(TransactionId::from("a")).await.unwrap();

        assert!(matches!(outcome, ResolveOutcome::Resolved(_)));
        assert_eq!(client.fetch_count(&TransactionId::from("a")), 4);
        assert_eq!(scheduler.delays(), vec![Duration::from_secs(1); 3]);
        assert_eq!(resolver.snapshot().retry_count, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (resolver, client, scheduler) = resolver(MockTransactionClient::new());

        let outcome = resolver.resolve(TransactionId::from("missing")).await.unwrap();

        assert_eq!(outcome, ResolveOutcome::PermanentlyNotFound { attempts: 10 });
        assert_eq!(client.fetch_count(&TransactionId::from("missing")), 10);
        assert_eq!(scheduler.delays().len(), 9);

        let view = resolver.snapshot();
        assert_eq!(view.phase, ResolutionPhase::PermanentlyNotFound { attempts: 10 });
        assert!(view.transaction.is_none());
        assert!(!view.error);
    }

    #[tokio::test]
    async fn test_hard_error_sets_flag_without_retry() {
        let (resolver, client, scheduler) = resolver(
            MockTransactionClient::new()
                .with_fetch_error("a", ClientError::Decode("bad json".to_string())),
        );

        let result = resolver.resolve(TransactionId::from("a")).await;

        assert!(matches!(result, Err(ResolverError::Fetch { .. })));
        assert_eq!(client.fetch_count(&TransactionId::from("a")), 1);
        assert!(scheduler.delays().is_empty());

        let view = resolver.snapshot();
        assert!(view.error);
        assert!(view.transaction.is_none());
        assert!(matches!(view.phase, ResolutionPhase::Failed { .. }));
    }

    #[tokio::test]
    async fn test_new_identifier_clears_previous_state() {
        let (resolver, _, _) = resolver(
            MockTransactionClient::new()
                .with_transaction(tx("a"))
                .with_fetch_error("b", ClientError::Network("down".to_string())),
        );

        resolver.resolve(TransactionId::from("a")).await.unwrap();
        let first_epoch = resolver.snapshot().epoch;
        let _ = resolver.resolve(TransactionId::from("b")).await;

        let view = resolver.snapshot();
        assert_eq!(view.id, Some(TransactionId::from("b")));
        assert!(view.epoch > first_epoch);
        assert!(view.transaction.is_none());
        assert!(view.source_lookup.is_none());

        resolver.resolve(TransactionId::from("a")).await.unwrap();
        let view = resolver.snapshot();
        assert!(!view.error);
        assert_eq!(view.retry_count, 0);
    }

    #[tokio::test]
    async fn test_empty_identifier_rejected() {
        let (resolver, client, _) = resolver(MockTransactionClient::new());
        let result = resolver.resolve(TransactionId::from("  ")).await;
        assert_eq!(result, Err(ResolverError::InvalidIdentifier));
        assert_eq!(resolver.snapshot().epoch, 0);
        assert_eq!(client.fetch_count(&TransactionId::from("")), 0);
    }

    #[tokio::test]
    async fn test_confirmation_status_through_api() {
        let (resolver, _, _) = resolver(MockTransactionClient::new().with_transaction(tx("a")));
        assert!(resolver.confirmation_status(50_100).is_none());

        TransactionExplorerApi::resolve(&resolver, TransactionId::from("a"))
            .await
            .unwrap();

        let status = resolver.confirmation_status(50_100).unwrap();
        assert_eq!(status.confirmations, Some(50_000));
    }

    #[tokio::test]
    async fn test_navigate_logs_and_completes() {
        let client = Arc::new(
            MockTransactionClient::new()
                .with_fetch_error("a", ClientError::Network("down".to_string())),
        );
        let resolver = Arc::new(TransactionResolver::new(
            ResolverConfig::for_testing(),
            Arc::clone(&client),
            Arc::new(RecordingScheduler::new()),
        ));

        resolver.navigate("a").await.unwrap();

        assert!(resolver.snapshot().error);
        assert_eq!(client.fetch_count(&TransactionId::from("a")), 1);
    }

    #[tokio::test]
    async fn test_navigate_ignores_empty_identifier() {
        let client = Arc::new(MockTransactionClient::new().with_transaction(tx("a")));
        let resolver = Arc::new(TransactionResolver::new(
            ResolverConfig::for_testing(),
            Arc::clone(&client),
            Arc::new(RecordingScheduler::new()),
        ));
        resolver.navigate("a").await.unwrap();
        let before = resolver.snapshot();

        resolver.navigate(" \t").await.unwrap();

        assert_eq!(resolver.snapshot(), before);
        assert_eq!(resolver.snapshot().id, Some(TransactionId::from("a")));
        assert_eq!(client.fetch_count(&TransactionId::from("")), 0);
    }
}
