//! Tokio Retry Scheduler
//!
//! Implements the `RetryScheduler` port on the tokio timer.

use async_trait::async_trait;
use std::time::Duration;

use crate::ports::RetryScheduler;

/// Retry timer backed by `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Create a scheduler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RetryScheduler for TokioScheduler {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
