//! Observability infrastructure for the monitoring service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction counts, unseen
//!   categories, persistence failures, model version)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    rule_alerts_total: IntCounter,
    unseen_categories_total: IntCounter,
    validation_failures_total: IntCounter,
    persistence_errors_total: IntCounter,
    model_version_info: GaugeVec,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "herd_monitor_prediction_latency_seconds",
                "Time spent running the full prediction pipeline",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "herd_monitor_predictions_total",
                "Total number of verdicts produced"
            )
            .expect("Failed to register predictions_total"),

            rule_alerts_total: register_int_counter!(
                "herd_monitor_rule_alerts_total",
                "Total number of rule-triggered alerts emitted"
            )
            .expect("Failed to register rule_alerts_total"),

            unseen_categories_total: register_int_counter!(
                "herd_monitor_unseen_categories_total",
                "Categorical values absent from the trained vocabulary"
            )
            .expect("Failed to register unseen_categories_total"),

            validation_failures_total: register_int_counter!(
                "herd_monitor_validation_failures_total",
                "Requests rejected for missing fields or malformed bodies"
            )
            .expect("Failed to register validation_failures_total"),

            persistence_errors_total: register_int_counter!(
                "herd_monitor_persistence_errors_total",
                "Verdict store writes that failed"
            )
            .expect("Failed to register persistence_errors_total"),

            model_version_info: register_gauge_vec!(
                "herd_monitor_model_version_info",
                "Information about the currently loaded classifier",
                &["version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn add_rule_alerts(&self, count: u64) {
        self.inner().rule_alerts_total.inc_by(count);
    }

    pub fn inc_unseen_categories(&self) {
        self.inner().unseen_categories_total.inc();
    }

    pub fn inc_validation_failures(&self) {
        self.inner().validation_failures_total.inc();
    }

    pub fn inc_persistence_errors(&self) {
        self.inner().persistence_errors_total.inc();
    }

    pub fn set_model_version(&self, version: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version])
            .set(1.0);
    }
}

/// Structured logger for significant service events
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_version: &str) {
        info!(
            event = "startup",
            service = %self.service_name,
            version = %version,
            model_version = %model_version,
            "Service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "shutdown",
            service = %self.service_name,
            reason = %reason,
            "Service shutting down"
        );
    }

    /// Log one consolidated verdict.
    pub fn log_verdict(
        &self,
        cattle_id: &str,
        health_status: &str,
        risk_level: &str,
        confidence_pct: f64,
        diseases: usize,
        alerts: usize,
    ) {
        info!(
            event = "verdict",
            service = %self.service_name,
            cattle_id = %cattle_id,
            health_status = %health_status,
            risk_level = %risk_level,
            confidence_pct = confidence_pct,
            diseases = diseases,
            alerts = alerts,
            "Produced health verdict"
        );
    }

    pub fn log_persistence_failure(&self, cattle_id: &str, error: &str) {
        warn!(
            event = "persistence_failure",
            service = %self.service_name,
            cattle_id = %cattle_id,
            error = %error,
            "Verdict store write failed, response unaffected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_is_cheap_to_clone() {
        let metrics = MonitorMetrics::new();
        let clone = metrics.clone();
        metrics.inc_predictions();
        clone.inc_predictions();
        clone.observe_prediction_latency(0.001);
        clone.set_model_version("v1");
    }

    #[test]
    fn test_logger_does_not_panic() {
        let logger = StructuredLogger::new("herd-monitor");
        logger.log_startup("0.1.0", "v1");
        logger.log_verdict("COW-1", "Healthy", "Low", 95.0, 0, 0);
        logger.log_persistence_failure("COW-1", "connection refused");
        logger.log_shutdown("test");
    }
}
