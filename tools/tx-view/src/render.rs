//! Text and JSON rendering of a transaction view.

use std::fmt::Write;

use serde_json::{json, Value};
use tx_resolver::{BlueScore, ConfirmationStatus, TransactionView, UNKNOWN_BLUE_SCORE};

const UNAVAILABLE: &str = "-";

/// Block time (epoch millis) as `YYYY-MM-DD HH:MM:SS` UTC.
pub fn format_block_time(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

/// One-line confirmation summary.
pub fn status_line(status: Option<ConfirmationStatus>) -> String {
    match status {
        None => "unknown".to_string(),
        Some(s) if !s.accepted => "not accepted".to_string(),
        Some(s) if s.confirmed => "accepted, confirmed".to_string(),
        Some(s) => match s.confirmations {
            Some(n) => format!("accepted, {} confirmations", n),
            None => "accepted".to_string(),
        },
    }
}

/// Render the detail view as plain text.
pub fn render_text(
    view: &TransactionView,
    status: Option<ConfirmationStatus>,
    chain_tip: BlueScore,
) -> String {
    let mut out = String::new();
    let Some(tx) = view.transaction.as_deref() else {
        let _ = writeln!(out, "Transaction not loaded ({:?})", view.phase);
        return out;
    };

    let _ = writeln!(out, "Transaction  {}", tx.transaction_id);
    let _ = writeln!(out, "Hash         {}", tx.hash);
    let _ = writeln!(out, "Subnetwork   {}", tx.subnetwork_id);
    if let Some(mass) = tx.mass {
        let _ = writeln!(out, "Mass         {}", mass);
    }
    let _ = writeln!(out, "Block time   {}", format_block_time(tx.block_time));
    for hash in &tx.block_hash {
        let _ = writeln!(out, "Block        {}", hash);
    }
    let _ = writeln!(
        out,
        "Accepted by  {}",
        tx.accepting_block_hash.as_deref().unwrap_or(UNAVAILABLE)
    );
    let _ = writeln!(out, "Status       {}", status_line(status));
    if chain_tip != UNKNOWN_BLUE_SCORE {
        let _ = writeln!(out, "Chain tip    {}", chain_tip);
    }

    let _ = writeln!(out, "\nInputs ({})", tx.inputs.len());
    for input in view.resolved_inputs() {
        let source = input
            .previous_outpoint_hash
            .as_ref()
            .map(|h| format!("{}:{}", h, input.previous_outpoint_index))
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        let amount = match (input.amount, view.is_enriched()) {
            (Some(amount), _) => amount.to_string(),
            (None, false) => "…".to_string(),
            (None, true) => UNAVAILABLE.to_string(),
        };
        let _ = writeln!(
            out,
            "  #{:<3} {}  {}  {}",
            input.index,
            source,
            amount,
            input.address.as_deref().unwrap_or(UNAVAILABLE)
        );
    }

    let _ = writeln!(out, "\nOutputs ({})", tx.outputs.len());
    for output in &tx.outputs {
        let _ = writeln!(
            out,
            "  #{:<3} {}  {}",
            output.index,
            output.amount,
            output
                .script_public_key_address
                .as_deref()
                .unwrap_or(UNAVAILABLE)
        );
    }

    if let Some(total) = view.total_input_amount() {
        let _ = writeln!(out, "\nTotal in     {}", total);
    }
    if let Some(total) = view.total_output_amount() {
        let _ = writeln!(out, "Total out    {}", total);
    }
    out
}

/// Render the detail view as JSON.
pub fn render_json(
    view: &TransactionView,
    status: Option<ConfirmationStatus>,
    chain_tip: BlueScore,
) -> Value {
    json!({
        "transaction": view.transaction,
        "phase": view.phase,
        "inputs": view.resolved_inputs(),
        "enriched": view.is_enriched(),
        "total_input_amount": view.total_input_amount().map(|a| a.to_string()),
        "total_output_amount": view.total_output_amount().map(|a| a.to_string()),
        "status": status,
        "chain_tip": (chain_tip != UNKNOWN_BLUE_SCORE).then_some(chain_tip),
    })
}
