//! Token usage accounting across a translation run

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::models::{TokenCounts, UsageReport};

/// Accumulates per-batch token usage and batch outcomes for the run summary.
/// Accounting only; nothing here throttles or rejects work.
#[derive(Debug, Clone)]
pub struct UsageTracker {
    report: Arc<RwLock<UsageReport>>,
}

impl UsageTracker {
    /// Create a tracker with an empty report
    pub fn new() -> Self {
        Self {
            report: Arc::new(RwLock::new(UsageReport::new())),
        }
    }

    /// Record a batch that came back successfully
    pub async fn record_success(&self, counts: Option<TokenCounts>) {
        let mut report = self.report.write().await;
        report.record_success(counts.unwrap_or_default());
        debug!(
            "Batch recorded, {} tokens used so far",
            report.total_tokens
        );
    }

    /// Record a batch that exhausted its retries
    pub async fn record_failure(&self) {
        let mut report = self.report.write().await;
        report.record_failure();
    }

    /// Snapshot of the accumulated usage
    pub async fn report(&self) -> UsageReport {
        let report = self.report.read().await;
        report.clone()
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}
