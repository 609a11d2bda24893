//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `ledger_credits_total` - Credit operations committed
//! - `ledger_debits_total` - Debit operations committed
//! - `ledger_rejections_total` - Operations refused (permission, funds)
//! - `ledger_commit_duration_seconds` - Histogram of commit latencies
//! - `directory_users_created_total` - Users created

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Credit operations committed
    pub credits_total: IntCounter,

    /// Debit operations committed
    pub debits_total: IntCounter,

    /// Operations refused before any write
    pub rejections_total: IntCounter,

    /// Commit latency histogram
    pub commit_duration: Histogram,

    /// Users created
    pub users_created_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let credits_total =
            IntCounter::new("ledger_credits_total", "Credit operations committed")?;
        registry.register(Box::new(credits_total.clone()))?;

        let debits_total = IntCounter::new("ledger_debits_total", "Debit operations committed")?;
        registry.register(Box::new(debits_total.clone()))?;

        let rejections_total = IntCounter::new(
            "ledger_rejections_total",
            "Operations refused before any write",
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let commit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_commit_duration_seconds",
                "Histogram of commit latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        let users_created_total =
            IntCounter::new("directory_users_created_total", "Users created")?;
        registry.register(Box::new(users_created_total.clone()))?;

        Ok(Self {
            credits_total,
            debits_total,
            rejections_total,
            commit_duration,
            users_created_total,
            registry,
        })
    }
}
