//! Prometheus metrics collection for restrictd.
//!
//! - `restrictd_operations_total{op,kind,outcome}` - engine operations by result
//! - `restrictd_adapter_failures_total{op,kind,error}` - failed grant/revoke calls
//! - `restrictd_sweep_expired_total` - restrictions lifted by the sweeper
//! - `restrictd_sweep_duration_seconds` - time per sweep pass
//!
//! Recording is a no-op until [`init`] runs, so library users and tests never
//! need a registry.

use crate::restriction::RestrictionKind;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Engine operations by op, kind and outcome (or error code).
pub static OPERATIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Capability adapter failures.
pub static ADAPTER_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Restrictions lifted by the expiry sweeper.
pub static SWEEP_EXPIRED: OnceLock<IntCounter> = OnceLock::new();

/// Sweep pass latency.
pub static SWEEP_DURATION: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before metrics are scraped.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(OPERATIONS, IntCounterVec::new(
        Opts::new("restrictd_operations_total", "Restriction engine operations by outcome"),
        &["op", "kind", "outcome"]));
    register!(ADAPTER_FAILURES, IntCounterVec::new(
        Opts::new("restrictd_adapter_failures_total", "Failed capability adapter calls"),
        &["op", "kind", "error"]));
    register!(SWEEP_EXPIRED, IntCounter::new(
        "restrictd_sweep_expired_total", "Restrictions lifted by the expiry sweeper"));
    register!(SWEEP_DURATION, Histogram::with_opts(
        HistogramOpts::new("restrictd_sweep_duration_seconds", "Expiry sweep pass duration")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record one engine operation result.
#[inline]
pub fn record_operation(op: &str, kind: RestrictionKind, outcome: &str) {
    if let Some(c) = OPERATIONS.get() {
        c.with_label_values(&[op, kind.as_str(), outcome]).inc();
    }
}

/// Record a failed grant/revoke.
#[inline]
pub fn record_adapter_failure(op: &str, kind: RestrictionKind, error: &str) {
    if let Some(c) = ADAPTER_FAILURES.get() {
        c.with_label_values(&[op, kind.as_str(), error]).inc();
    }
}

/// Record a finished sweep pass.
#[inline]
pub fn record_sweep(expired: usize, duration_secs: f64) {
    if let Some(c) = SWEEP_EXPIRED.get() {
        c.inc_by(expired as u64);
    }
    if let Some(h) = SWEEP_DURATION.get() {
        h.observe(duration_secs);
    }
}
