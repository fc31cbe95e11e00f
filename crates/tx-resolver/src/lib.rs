//! # TX Resolver
//!
//! Read-only resolution layer behind a transaction detail view.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Given a transaction identifier:
//! - fetch the transaction, retrying while the indexer has not ingested it
//!   (fixed 1s delay, 10 attempts)
//! - batch-fetch the source transactions of its inputs once per load and
//!   resolve each input's spent amount and address
//! - derive accepted/confirmed status from the live chain-tip blue score
//!
//! ## Module Structure
//!
//! ```text
//! tx-resolver/
//! ├── domain/          # Transaction, SourceLookup, TransactionView, errors
//! ├── algorithms/      # Source-id extraction, lookup building, confirmation status
//! ├── ports/           # API trait (inbound) + dependency traits (outbound)
//! ├── application/     # TransactionResolver, InputEnricher, ConfirmationTracker
//! ├── adapters/        # REST client, chain-tip cell + poller, tokio scheduler
//! └── config.rs        # ResolverConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{ChainTipPoller, HttpTransactionClient, SharedChainTip, TokioScheduler};
pub use algorithms::{build_lookup, collect_source_ids, derive_status, derive_status_with_threshold};
pub use application::{current_status, ConfirmationTracker, InputEnricher, TransactionResolver};
pub use config::ResolverConfig;
pub use domain::{
    Amount, BlueScore, ClientError, ConfigError, ConfirmationStatus, ResolutionPhase,
    ResolvedInput, ResolverError, SourceLookup, SourceTransaction, SpentOutput, Transaction,
    TransactionId, TransactionInput, TransactionOutput, TransactionView, BASE_UNITS_PER_COIN,
    CONFIRMED_THRESHOLD, UNKNOWN_BLUE_SCORE,
};
pub use ports::{
    BatchProjection, BlueScoreFeed, ChainTipSource, FetchOutcome, MockTransactionClient,
    RecordingScheduler, ResolveOutcome, RetryScheduler, TransactionDataClient,
    TransactionExplorerApi, NOT_FOUND_DETAIL,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
