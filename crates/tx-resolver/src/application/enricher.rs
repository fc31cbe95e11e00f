//! # Input Enricher
//!
//! Batch-resolves the source transactions of a resolved transaction's inputs.
//! Best-effort: failures are logged and yield an empty lookup, never an error
//! on the primary resolution path.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::algorithms::{build_lookup, collect_source_ids};
use crate::domain::{ClientError, SourceLookup, Transaction};
use crate::ports::{BatchProjection, TransactionDataClient};

/// Input enrichment engine.
pub struct InputEnricher<C: TransactionDataClient> {
    client: Arc<C>,
    projection: BatchProjection,
}

impl<C: TransactionDataClient> InputEnricher<C> {
    /// Create an enricher issuing batch requests with `projection`.
    pub fn new(client: Arc<C>, projection: BatchProjection) -> Self {
        Self { client, projection }
    }

    /// Build the source lookup for `tx`, absorbing failures.
    pub async fn enrich(&self, tx: &Transaction) -> SourceLookup {
        match self.try_enrich(tx).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(
                    tx_id = %tx.transaction_id,
                    "[tx-resolver] Input enrichment failed: {}", e
                );
                SourceLookup::new()
            }
        }
    }

    /// Build the source lookup for `tx`.
    ///
    /// One batch request for all distinct source ids; no request at all when
    /// there are none.
    pub async fn try_enrich(&self, tx: &Transaction) -> Result<SourceLookup, ClientError> {
        let ids = collect_source_ids(&tx.inputs);
        if ids.is_empty() {
            debug!(tx_id = %tx.transaction_id, "[tx-resolver] No source transactions to enrich");
            return Ok(SourceLookup::new());
        }

        debug!(
            tx_id = %tx.transaction_id,
            "[tx-resolver] Fetching {} source transactions", ids.len()
        );
        let records = self
            .client
            .fetch_transactions_batch(&ids, self.projection)
            .await?;
        let lookup = build_lookup(&ids, records);

        if lookup.len() < ids.len() {
            debug!(
                tx_id = %tx.transaction_id,
                "[tx-resolver] Batch returned {}/{} source transactions",
                lookup.len(),
                ids.len()
            );
        }
        info!(
            tx_id = %tx.transaction_id,
            "[tx-resolver] Enriched {} source transactions", lookup.len()
        );
        Ok(lookup)
    }
}
