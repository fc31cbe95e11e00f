//! # Domain Entities
//!
//! Transactions as served by the indexer, the source-transaction lookup built
//! during enrichment, and the view snapshot handed to the presentation
//! surface.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::value_objects::{Amount, ResolutionPhase, TransactionId};

/// Transaction input. Read-only after fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Position of the input within its transaction.
    #[serde(default, deserialize_with = "wire::u32_from_number_or_text")]
    pub index: u32,
    /// Transaction that produced the spent output. Absent on coinbase-like inputs.
    #[serde(default, deserialize_with = "wire::non_empty_id")]
    pub previous_outpoint_hash: Option<TransactionId>,
    /// Output index within the previous transaction.
    #[serde(default, deserialize_with = "wire::u32_from_number_or_text")]
    pub previous_outpoint_index: u32,
    /// Hex-encoded signature script.
    #[serde(default, alias = "signatureScript")]
    pub signature_script: String,
    /// Signature operation count.
    #[serde(default, alias = "sigOpCount", deserialize_with = "wire::u32_from_number_or_text")]
    pub sig_op_count: u32,
}

/// Transaction output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// Output index. Unique within a transaction, unrelated to array position.
    #[serde(deserialize_with = "wire::u32_from_number_or_text")]
    pub index: u32,
    /// Amount in base units.
    pub amount: Amount,
    /// Hex-encoded script public key.
    #[serde(default, alias = "scriptPublicKey")]
    pub script_public_key: String,
    /// Script public key type (e.g. `pubkey`, `scripthash`).
    #[serde(default, alias = "scriptPublicKeyType")]
    pub script_public_key_type: String,
    /// Address the output pays to, when the script has one.
    #[serde(default, alias = "scriptPublicKeyAddress")]
    pub script_public_key_address: Option<String>,
}

/// Transaction fetched by identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier.
    pub transaction_id: TransactionId,
    /// Subnetwork identifier.
    #[serde(default)]
    pub subnetwork_id: String,
    /// Transaction hash.
    #[serde(default)]
    pub hash: String,
    /// Mass, when the indexer reports it.
    #[serde(default, deserialize_with = "wire::opt_u64_from_number_or_text")]
    pub mass: Option<u64>,
    /// Blocks containing the transaction, in indexer order.
    #[serde(default, deserialize_with = "wire::null_as_empty")]
    pub block_hash: Vec<String>,
    /// Block time, epoch millis.
    #[serde(default, deserialize_with = "wire::u64_from_number_or_text")]
    pub block_time: u64,
    /// Accepting block hash.
    #[serde(default, alias = "accepted_block_hash")]
    pub accepting_block_hash: Option<String>,
    /// Accepting block blue score. Meaningful only when `is_accepted`.
    #[serde(
        default,
        alias = "accepted_block_blue_score",
        deserialize_with = "wire::opt_u64_from_number_or_text"
    )]
    pub accepting_block_blue_score: Option<u64>,
    /// Acceptance flag.
    #[serde(default)]
    pub is_accepted: bool,
    /// Inputs in transaction order.
    #[serde(default, deserialize_with = "wire::null_as_empty")]
    pub inputs: Vec<TransactionInput>,
    /// Outputs in indexer order.
    #[serde(default, deserialize_with = "wire::null_as_empty")]
    pub outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Output with the given `index` attribute.
    pub fn output(&self, index: u32) -> Option<&TransactionOutput> {
        find_output(&self.outputs, index)
    }

    /// Sum of all output amounts. `None` on overflow.
    pub fn total_output_amount(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(Amount::ZERO, |acc, o| acc.checked_add(o.amount))
    }
}

/// Outputs-only projection of a source transaction, as returned by the
/// batch endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTransaction {
    /// Transaction identifier.
    pub transaction_id: TransactionId,
    /// Outputs in indexer order.
    #[serde(default, deserialize_with = "wire::null_as_empty")]
    pub outputs: Vec<TransactionOutput>,
}

impl SourceTransaction {
    /// Output with the given `index` attribute.
    pub fn output(&self, index: u32) -> Option<&TransactionOutput> {
        find_output(&self.outputs, index)
    }
}

fn find_output(outputs: &[TransactionOutput], index: u32) -> Option<&TransactionOutput> {
    outputs.iter().find(|o| o.index == index)
}

/// Amount and address of the output an input spends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentOutput {
    /// Spent amount in base units.
    pub amount: Amount,
    /// Address of the spent output.
    pub address: Option<String>,
}

/// Source-transaction id → source transaction.
///
/// Built fresh for every successful primary resolution, never merged across
/// loads. A missing key means "data unavailable", not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLookup {
    sources: HashMap<TransactionId, SourceTransaction>,
}

impl SourceLookup {
    /// Empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source transaction keyed on its own id.
    pub fn insert(&mut self, source: SourceTransaction) {
        self.sources.insert(source.transaction_id.clone(), source);
    }

    /// Source transaction by id.
    pub fn get(&self, id: &TransactionId) -> Option<&SourceTransaction> {
        self.sources.get(id)
    }

    /// True when the id was resolved.
    pub fn contains(&self, id: &TransactionId) -> bool {
        self.sources.contains_key(id)
    }

    /// Number of resolved source transactions.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Output spent by `input`, matched on the output's own index.
    pub fn spent_output(&self, input: &TransactionInput) -> Option<SpentOutput> {
        let source = self.get(input.previous_outpoint_hash.as_ref()?)?;
        let output = source.output(input.previous_outpoint_index)?;
        Some(SpentOutput {
            amount: output.amount,
            address: output.script_public_key_address.clone(),
        })
    }
}

impl FromIterator<SourceTransaction> for SourceLookup {
    fn from_iter<I: IntoIterator<Item = SourceTransaction>>(iter: I) -> Self {
        let mut lookup = SourceLookup::new();
        for source in iter {
            lookup.insert(source);
        }
        lookup
    }
}

/// Input joined with its spent output, derived on demand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInput {
    /// Input index.
    pub index: u32,
    /// Previous outpoint transaction id.
    pub previous_outpoint_hash: Option<TransactionId>,
    /// Previous outpoint output index.
    pub previous_outpoint_index: u32,
    /// Spent amount, when enrichment resolved the source.
    pub amount: Option<Amount>,
    /// Spent address, when enrichment resolved the source.
    pub address: Option<String>,
}

/// Snapshot of the resolver state exposed to the presentation surface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    /// Identifier of the current load.
    pub id: Option<TransactionId>,
    /// Load epoch. Bumped on every identifier change.
    pub epoch: u64,
    /// Current phase.
    pub phase: ResolutionPhase,
    /// Resolved transaction.
    pub transaction: Option<Arc<Transaction>>,
    /// Source lookup. `None` means "not yet enriched".
    pub source_lookup: Option<Arc<SourceLookup>>,
    /// Hard fetch error flag.
    pub error: bool,
    /// Not-found outcomes for the current load.
    pub retry_count: u32,
}

impl TransactionView {
    /// Loading indicator should be shown.
    pub fn is_loading(&self) -> bool {
        self.transaction.is_none() && self.phase.is_loading()
    }

    /// Enrichment has completed for the current transaction.
    pub fn is_enriched(&self) -> bool {
        self.source_lookup.is_some()
    }

    /// Inputs joined with their spent outputs. Empty before resolution.
    pub fn resolved_inputs(&self) -> Vec<ResolvedInput> {
        let Some(tx) = self.transaction.as_deref() else {
            return Vec::new();
        };
        let lookup = self.source_lookup.as_deref();

        tx.inputs
            .iter()
            .map(|input| {
                let spent = lookup.and_then(|l| l.spent_output(input));
                ResolvedInput {
                    index: input.index,
                    previous_outpoint_hash: input.previous_outpoint_hash.clone(),
                    previous_outpoint_index: input.previous_outpoint_index,
                    amount: spent.as_ref().map(|s| s.amount),
                    address: spent.and_then(|s| s.address),
                }
            })
            .collect()
    }

    /// Sum of spent amounts. `None` until every input is resolved.
    pub fn total_input_amount(&self) -> Option<Amount> {
        self.resolved_inputs()
            .iter()
            .try_fold(Amount::ZERO, |acc, input| acc.checked_add(input.amount?))
    }

    /// Sum of output amounts of the resolved transaction.
    pub fn total_output_amount(&self) -> Option<Amount> {
        self.transaction.as_deref()?.total_output_amount()
    }
}

/// Lenient decoders for indexer JSON.
mod wire {
    use super::TransactionId;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(u64),
        Text(String),
    }

    impl NumberOrText {
        fn into_u64<E: Error>(self) -> Result<u64, E> {
            match self {
                Self::Number(n) => Ok(n),
                Self::Text(s) => s
                    .trim()
                    .parse()
                    .map_err(|e| E::custom(format!("invalid integer {:?}: {}", s, e))),
            }
        }
    }

    pub fn u64_from_number_or_text<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Option::<NumberOrText>::deserialize(d)? {
            Some(v) => v.into_u64(),
            None => Ok(0),
        }
    }

    pub fn u32_from_number_or_text<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = u64_from_number_or_text(d)?;
        u32::try_from(value).map_err(|_| D::Error::custom(format!("{} out of range", value)))
    }

    pub fn opt_u64_from_number_or_text<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<u64>, D::Error> {
        Option::<NumberOrText>::deserialize(d)?
            .map(NumberOrText::into_u64)
            .transpose()
    }

    pub fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
    }

    pub fn non_empty_id<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<TransactionId>, D::Error> {
        Ok(Option::<String>::deserialize(d)?
            .map(TransactionId::new)
            .filter(|id| !id.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(index: u32, amount: u64, address: &str) -> TransactionOutput {
        TransactionOutput {
            index,
            amount: Amount::from_base_units(amount),
            script_public_key: String::new(),
            script_public_key_type: "pubkey".to_string(),
            script_public_key_address: Some(address.to_string()),
        }
    }

    fn input(prev: &str, index: u32) -> TransactionInput {
        TransactionInput {
            previous_outpoint_hash: Some(TransactionId::from(prev)),
            previous_outpoint_index: index,
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_indexer_transaction() {
        let body = json!({
            "subnetwork_id": "0000000000000000000000000000000000000000",
            "transaction_id": "tx1",
            "hash": "h1",
            "mass": "2036",
            "block_hash": ["b1", "b2"],
            "block_time": 1700000000000u64,
            "is_accepted": true,
            "accepting_block_hash": "b3",
            "accepting_block_blue_score": 100,
            "inputs": [{
                "transaction_id": "tx1",
                "index": 0,
                "previous_outpoint_hash": "A",
                "previous_outpoint_index": "2",
                "signatureScript": "41ab",
                "sigOpCount": 1
            }],
            "outputs": [{
                "transaction_id": "tx1",
                "index": 0,
                "amount": 500000000u64,
                "script_public_key": "20ab",
                "script_public_key_address": "addr1",
                "script_public_key_type": "pubkey"
            }]
        });

        let tx: Transaction = serde_json::from_value(body).unwrap();
        assert_eq!(tx.mass, Some(2036));
        assert_eq!(tx.block_hash.len(), 2);
        assert_eq!(tx.accepting_block_blue_score, Some(100));
        assert_eq!(tx.inputs[0].previous_outpoint_index, 2);
        assert_eq!(tx.inputs[0].previous_outpoint_hash, Some(TransactionId::from("A")));
        assert_eq!(tx.inputs[0].signature_script, "41ab");
        assert_eq!(tx.outputs[0].amount, Amount::from_base_units(500_000_000));
    }

    #[test]
    fn test_decode_null_collections_and_legacy_names() {
        let body = json!({
            "transaction_id": "tx2",
            "block_time": "1700000000000",
            "inputs": null,
            "outputs": null,
            "accepted_block_hash": null,
            "accepted_block_blue_score": null,
            "is_accepted": false
        });

        let tx: Transaction = serde_json::from_value(body).unwrap();
        assert!(tx.inputs.is_empty());
        assert!(tx.outputs.is_empty());
        assert_eq!(tx.block_time, 1_700_000_000_000);
        assert!(tx.mass.is_none());
        assert!(tx.accepting_block_blue_score.is_none());
    }

    #[test]
    fn test_decode_empty_previous_outpoint_is_none() {
        let input: TransactionInput = serde_json::from_value(json!({
            "previous_outpoint_hash": "",
            "previous_outpoint_index": "0"
        }))
        .unwrap();
        assert!(input.previous_outpoint_hash.is_none());
    }

    #[test]
    fn test_decode_rejects_garbage_index() {
        let result: Result<TransactionInput, _> =
            serde_json::from_value(json!({"previous_outpoint_index": "two"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_output_lookup_uses_index_attribute() {
        let source = SourceTransaction {
            transaction_id: TransactionId::from("A"),
            outputs: vec![output(2, 700, "addr2"), output(0, 100, "addr0")],
        };
        assert_eq!(source.output(0).unwrap().amount.base_units(), 100);
        assert_eq!(source.output(2).unwrap().amount.base_units(), 700);
        assert!(source.output(1).is_none());
    }

    #[test]
    fn test_spent_output_missing_source() {
        let lookup = SourceLookup::new();
        assert!(lookup.spent_output(&input("A", 0)).is_none());
    }

    #[test]
    fn test_view_resolved_inputs_without_lookup() {
        let view = TransactionView {
            transaction: Some(Arc::new(Transaction {
                transaction_id: TransactionId::from("tx"),
                inputs: vec![input("A", 0)],
                ..Default::default()
            })),
            phase: ResolutionPhase::Resolved,
            ..Default::default()
        };

        let inputs = view.resolved_inputs();
        assert_eq!(inputs.len(), 1);
        assert!(inputs[0].amount.is_none());
        assert!(!view.is_enriched());
        assert!(!view.is_loading());
        assert!(view.total_input_amount().is_none());
    }

    #[test]
    fn test_view_totals() {
        let lookup: SourceLookup = vec![SourceTransaction {
            transaction_id: TransactionId::from("A"),
            outputs: vec![output(0, 300, "a"), output(1, 200, "b")],
        }]
        .into_iter()
        .collect();

        let view = TransactionView {
            transaction: Some(Arc::new(Transaction {
                transaction_id: TransactionId::from("tx"),
                inputs: vec![input("A", 0), input("A", 1)],
                outputs: vec![output(0, 450, "c")],
                ..Default::default()
            })),
            source_lookup: Some(Arc::new(lookup)),
            phase: ResolutionPhase::Resolved,
            ..Default::default()
        };

        assert_eq!(view.total_input_amount(), Some(Amount::from_base_units(500)));
        assert_eq!(view.total_output_amount(), Some(Amount::from_base_units(450)));
    }
}
