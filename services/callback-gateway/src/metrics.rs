//! Prometheus metrics exposition
//!
//! - `callback_requests_total` (counter): label `outcome`
//! - `callback_duration_seconds` (histogram): label `outcome`
//! - `callback_session_renewals_total` (counter, recorded by the engine)
//! - `sessions_active` (gauge, recorded by the session sweeper)

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("callback_duration_seconds".to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// `callback_duration_seconds` gets explicit buckets so it renders as a
/// histogram (`_bucket` lines) instead of a summary. Buckets span 1ms to 10s:
/// form callbacks finish in microseconds, OAuth callbacks wait on two
/// provider round-trips bounded by the HTTP timeout.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record a finished callback with its outcome label.
pub fn record_callback(outcome: &str, duration_secs: f64) {
    metrics::counter!("callback_requests_total", "outcome" => outcome.to_string()).increment(1);
    metrics::histogram!("callback_duration_seconds", "outcome" => outcome.to_string())
        .record(duration_secs);
}

/// In-process counters reported by `/health`.
#[derive(Debug, Clone)]
pub struct GatewayStats {
    pub callbacks_total: Arc<AtomicU64>,
    pub callback_errors_total: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self {
            callbacks_total: Arc::new(AtomicU64::new(0)),
            callback_errors_total: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn record(&self, failed: bool) {
        self.callbacks_total.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.callback_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for GatewayStats {
    fn default() -> Self {
        Self::new()
    }
}
