//! # Inbound Ports
//!
//! API trait the presentation surface drives.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::{
    BlueScore, ConfirmationStatus, ResolverError, Transaction, TransactionId, TransactionView,
};

/// Result of one load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Transaction fetched and stored.
    Resolved(Arc<Transaction>),
    /// Retry bound exhausted without the indexer ever finding the id.
    PermanentlyNotFound {
        /// Not-found outcomes observed
        attempts: u32,
    },
    /// A newer load replaced this one before it finished.
    Superseded,
}

impl ResolveOutcome {
    /// Resolved transaction, if any.
    pub fn transaction(&self) -> Option<&Arc<Transaction>> {
        match self {
            Self::Resolved(tx) => Some(tx),
            _ => None,
        }
    }
}

/// Transaction explorer API - inbound port.
#[async_trait]
pub trait TransactionExplorerApi: Send + Sync {
    /// Load `id`, replacing any previous load, and drive it to a terminal phase.
    async fn resolve(&self, id: TransactionId) -> Result<ResolveOutcome, ResolverError>;

    /// Current view snapshot.
    fn view(&self) -> TransactionView;

    /// Watch the view cell.
    fn subscribe(&self) -> watch::Receiver<TransactionView>;

    /// Confirmation status of the resolved transaction against `chain_tip`.
    fn confirmation_status(&self, chain_tip: BlueScore) -> Option<ConfirmationStatus>;
}
