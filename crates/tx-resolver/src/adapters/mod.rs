//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits: the REST indexer client, the shared
//! chain-tip cell and its poller, and the tokio retry timer.

mod chain_tip;
mod http_client;
mod scheduler;

pub use chain_tip::{ChainTipPoller, SharedChainTip};
pub use http_client::{
    parse_batch_response, parse_blue_score_response, parse_transaction_response,
    HttpTransactionClient,
};
pub use scheduler::TokioScheduler;
