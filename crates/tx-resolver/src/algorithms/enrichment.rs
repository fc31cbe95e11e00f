//! # Input Enrichment
//!
//! Pure helpers behind the input enricher: which source transactions to ask
//! for, and how to index what came back.

use std::collections::HashSet;

use crate::domain::{SourceLookup, SourceTransaction, TransactionInput, TransactionId};

/// Distinct previous-outpoint transaction ids, in first-seen order.
///
/// Inputs without a previous outpoint (coinbase-like) are skipped.
pub fn collect_source_ids(inputs: &[TransactionInput]) -> Vec<TransactionId> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .filter_map(|input| input.previous_outpoint_hash.as_ref())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}

/// Index batch records on their own transaction id.
///
/// Response order is irrelevant and missing ids are simply absent. Records
/// nobody asked for are dropped so a noisy indexer cannot widen the lookup.
pub fn build_lookup(requested: &[TransactionId], records: Vec<SourceTransaction>) -> SourceLookup {
    let wanted: HashSet<&TransactionId> = requested.iter().collect();
    records
        .into_iter()
        .filter(|record| wanted.contains(&record.transaction_id))
        .collect()
}
