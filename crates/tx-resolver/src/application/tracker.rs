//! # Confirmation Tracker
//!
//! Re-derives the confirmation status whenever the resolved transaction or
//! the chain tip changes, and publishes it on its own watch cell.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::algorithms::derive_status_with_threshold;
use crate::domain::{BlueScore, ConfirmationStatus, TransactionView};

/// Status of `view` against `chain_tip`. `None` until a transaction is resolved.
pub fn current_status(
    view: &TransactionView,
    chain_tip: BlueScore,
    threshold: u64,
) -> Option<ConfirmationStatus> {
    view.transaction
        .as_deref()
        .map(|tx| derive_status_with_threshold(tx, chain_tip, threshold))
}

/// Reactive confirmation deriver. Aborted on drop.
pub struct ConfirmationTracker {
    status: watch::Receiver<Option<ConfirmationStatus>>,
    handle: JoinHandle<()>,
}

impl ConfirmationTracker {
    /// Spawn the tracker. It stops when either input cell closes or every
    /// status receiver is dropped.
    pub fn spawn(
        mut view_rx: watch::Receiver<TransactionView>,
        mut tip_rx: watch::Receiver<BlueScore>,
        threshold: u64,
    ) -> Self {
        let initial = current_status(
            &view_rx.borrow_and_update(),
            *tip_rx.borrow_and_update(),
            threshold,
        );
        let (status_tx, status) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = view_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = tip_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = status_tx.closed() => break,
                }

                let next = current_status(
                    &view_rx.borrow_and_update(),
                    *tip_rx.borrow_and_update(),
                    threshold,
                );
                status_tx.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    *current = next;
                    true
                });
            }
            debug!("[tx-resolver] Confirmation tracker stopped");
        });

        Self { status, handle }
    }

    /// Latest derived status.
    pub fn status(&self) -> Option<ConfirmationStatus> {
        *self.status.borrow()
    }

    /// Watch derived status changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<ConfirmationStatus>> {
        self.status.clone()
    }
}

impl Drop for ConfirmationTracker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResolutionPhase, Transaction, TransactionId, CONFIRMED_THRESHOLD};
    use std::sync::Arc;

    fn resolved_view(score: u64) -> TransactionView {
        TransactionView {
            id: Some(TransactionId::from("a")),
            epoch: 1,
            phase: ResolutionPhase::Resolved,
            transaction: Some(Arc::new(Transaction {
                transaction_id: TransactionId::from("a"),
                is_accepted: true,
                accepting_block_blue_score: Some(score),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_current_status_without_transaction() {
        assert!(current_status(&TransactionView::default(), 10, CONFIRMED_THRESHOLD).is_none());
    }

    #[tokio::test]
    async fn test_tracks_chain_tip_changes() {
        let (view_tx, view_rx) = watch::channel(resolved_view(100));
        let (tip_tx, tip_rx) = watch::channel(0u64);
        let tracker = ConfirmationTracker::spawn(view_rx, tip_rx, CONFIRMED_THRESHOLD);
        let mut status_rx = tracker.subscribe();

        // Tip unknown: accepted, depth suppressed.
        let status = tracker.status().unwrap();
        assert!(status.accepted);
        assert!(status.confirmations.is_none());

        tip_tx.send(50_100).unwrap();
        status_rx.changed().await.unwrap();
        assert_eq!(tracker.status().unwrap().confirmations, Some(50_000));

        tip_tx.send(90_100).unwrap();
        status_rx.changed().await.unwrap();
        assert!(tracker.status().unwrap().confirmed);

        drop(view_tx);
    }

    #[tokio::test]
    async fn test_tracks_view_changes() {
        let (view_tx, view_rx) = watch::channel(TransactionView::default());
        let (_tip_tx, tip_rx) = watch::channel(50_100u64);
        let tracker = ConfirmationTracker::spawn(view_rx, tip_rx, CONFIRMED_THRESHOLD);
        let mut status_rx = tracker.subscribe();
        assert!(tracker.status().is_none());

        view_tx.send(resolved_view(100)).unwrap();
        status_rx.changed().await.unwrap();
        assert_eq!(tracker.status().unwrap().confirmations, Some(50_000));
    }
}
