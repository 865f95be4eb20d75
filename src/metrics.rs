// Usage counters for the calculator session
//
// Tracks how often prices are recomputed and how commits fare, so a host
// application can log activity without instrumenting every call site.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for a calculator session
///
/// Cheap to clone; clones share the same counters.
#[derive(Debug, Clone)]
pub struct CalculatorMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    price_computations: AtomicU64,
    priced_results: AtomicU64,
    commits: AtomicU64,
    rejected_commits: AtomicU64,
    edits: AtomicU64,
    removals: AtomicU64,
    clears: AtomicU64,
}

impl CalculatorMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record a price recomputation and whether it produced a price
    pub fn record_computation(&self, priced: bool) {
        self.inner.price_computations.fetch_add(1, Ordering::Relaxed);
        if priced {
            self.inner.priced_results.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_commit(&self) {
        self.inner.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_commit(&self) {
        self.inner.rejected_commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_edit(&self) {
        self.inner.edits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.inner.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clear(&self) {
        self.inner.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of computations that produced a price (0.0 to 1.0)
    pub fn priced_rate(&self) -> f64 {
        let total = self.inner.price_computations.load(Ordering::Relaxed);
        let priced = self.inner.priced_results.load(Ordering::Relaxed);

        if total == 0 {
            0.0
        } else {
            priced as f64 / total as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            price_computations: self.inner.price_computations.load(Ordering::Relaxed),
            priced_rate: self.priced_rate(),
            commits: self.inner.commits.load(Ordering::Relaxed),
            rejected_commits: self.inner.rejected_commits.load(Ordering::Relaxed),
            edits: self.inner.edits.load(Ordering::Relaxed),
            removals: self.inner.removals.load(Ordering::Relaxed),
            clears: self.inner.clears.load(Ordering::Relaxed),
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Calculator activity:\n\
             Pricing: {} computations, {:.1}% priced\n\
             Ledger: {} commits ({} rejected), {} edits, {} removals, {} clears",
            summary.price_computations,
            summary.priced_rate * 100.0,
            summary.commits,
            summary.rejected_commits,
            summary.edits,
            summary.removals,
            summary.clears,
        );
    }
}

impl Default for CalculatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub price_computations: u64,
    pub priced_rate: f64,
    pub commits: u64,
    pub rejected_commits: u64,
    pub edits: u64,
    pub removals: u64,
    pub clears: u64,
}
