//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `frigate_reconciliations_total` - Total number of reconciliations
//! - `frigate_reconciliation_errors_total{stage}` - Reconciliation errors by failing stage
//! - `frigate_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `frigate_pods_created_total` - Pods created by the controller
//! - `frigate_pods_updated_total` - Pod updates issued by the controller
//! - `frigate_requeues_total{reason}` - Requeues scheduled, by reason

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "frigate_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "frigate_reconciliation_errors_total",
            "Total number of reconciliation errors by failing stage",
        ),
        &["stage"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

pub(crate) static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "frigate_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static PODS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "frigate_pods_created_total",
        "Total number of pods created by the controller",
    )
    .expect("Failed to create PODS_CREATED_TOTAL metric - this should never happen")
});

static PODS_UPDATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "frigate_pods_updated_total",
        "Total number of pod updates issued by the controller",
    )
    .expect("Failed to create PODS_UPDATED_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "frigate_requeues_total",
            "Total number of requeues scheduled, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

/// Register all collectors with the controller registry
///
/// # Errors
///
/// Fails if a collector is registered twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(PODS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PODS_UPDATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

/// Gather every registered metric family
#[must_use]
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(stage: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[stage]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_pods_created() {
    PODS_CREATED_TOTAL.inc();
}

pub fn increment_pods_updated() {
    PODS_UPDATED_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
