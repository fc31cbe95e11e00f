//! # Confirmation Status
//!
//! Derives accepted/confirmed state from the acceptance flag, the accepting
//! block's blue score and the live chain tip.

use crate::domain::{
    BlueScore, ConfirmationStatus, Transaction, CONFIRMED_THRESHOLD, UNKNOWN_BLUE_SCORE,
};

/// Derive the status with the default confirmed threshold.
pub fn derive_status(tx: &Transaction, chain_tip: BlueScore) -> ConfirmationStatus {
    derive_status_with_threshold(tx, chain_tip, CONFIRMED_THRESHOLD)
}

/// Derive the status.
///
/// # Rules
/// 1. Not accepted: no depth at all.
/// 2. Tip unknown (`0`), accepting score missing, or tip behind the
///    accepting score: accepted, depth suppressed.
/// 3. `delta < threshold`: `confirmations = delta`.
/// 4. `delta >= threshold`: `confirmed`.
pub fn derive_status_with_threshold(
    tx: &Transaction,
    chain_tip: BlueScore,
    threshold: u64,
) -> ConfirmationStatus {
    if !tx.is_accepted {
        return ConfirmationStatus::not_accepted();
    }
    if chain_tip == UNKNOWN_BLUE_SCORE {
        return ConfirmationStatus::accepted_unknown_depth();
    }
    let Some(accepted_score) = tx.accepting_block_blue_score else {
        return ConfirmationStatus::accepted_unknown_depth();
    };
    let Some(delta) = chain_tip.checked_sub(accepted_score) else {
        // Stale tip
        return ConfirmationStatus::accepted_unknown_depth();
    };

    if delta < threshold {
        ConfirmationStatus {
            accepted: true,
            confirmations: Some(delta),
            confirmed: false,
        }
    } else {
        ConfirmationStatus {
            accepted: true,
            confirmations: None,
            confirmed: true,
        }
    }
}
