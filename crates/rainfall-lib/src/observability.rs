//! Observability infrastructure for rainfall prediction
//!
//! Provides:
//! - Prometheus metrics (prediction latency, predictions per category, batch sizes)
//! - Structured logging with tracing

use crate::category::Category;
use crate::predictor::ModelVariant;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictionMetricsInner> = OnceLock::new();

struct PredictionMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    batch_requests_total: IntCounterVec,
    last_batch_rows: IntGauge,
    artifact_load_failures: IntCounterVec,
    invalid_inputs: IntCounterVec,
}

impl PredictionMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "rainfall_prediction_latency_seconds",
                "Time spent loading the artifact and running the model",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "rainfall_predictions_total",
                "Predictions generated, by model and category",
                &["model", "category"]
            )
            .expect("Failed to register predictions_total"),

            batch_requests_total: register_int_counter_vec!(
                "rainfall_batch_requests_total",
                "Batch files processed, by model",
                &["model"]
            )
            .expect("Failed to register batch_requests_total"),

            last_batch_rows: register_int_gauge!(
                "rainfall_last_batch_rows",
                "Number of rows in the most recent batch file"
            )
            .expect("Failed to register last_batch_rows"),

            artifact_load_failures: register_int_counter_vec!(
                "rainfall_artifact_load_failures_total",
                "Model artifacts that could not be loaded, by model",
                &["model"]
            )
            .expect("Failed to register artifact_load_failures"),

            invalid_inputs: register_int_counter_vec!(
                "rainfall_invalid_inputs_total",
                "Rejected manual inputs and malformed batch files",
                &["kind"]
            )
            .expect("Failed to register invalid_inputs"),
        }
    }
}

/// Prediction metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct PredictionMetrics {
    _private: (),
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictionMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictionMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_prediction(&self, model: ModelVariant, category: Category) {
        self.inner()
            .predictions_total
            .with_label_values(&[model.as_str(), category.as_str()])
            .inc();
    }

    pub fn record_batch(&self, model: ModelVariant, rows: usize) {
        self.inner()
            .batch_requests_total
            .with_label_values(&[model.as_str()])
            .inc();
        self.inner().last_batch_rows.set(rows as i64);
    }

    pub fn inc_artifact_load_failure(&self, model: ModelVariant) {
        self.inner()
            .artifact_load_failures
            .with_label_values(&[model.as_str()])
            .inc();
    }

    pub fn inc_invalid_input(&self, kind: &str) {
        self.inner().invalid_inputs.with_label_values(&[kind]).inc();
    }

    /// Current count for one model/category pair
    pub fn prediction_count(&self, model: ModelVariant, category: Category) -> u64 {
        self.inner()
            .predictions_total
            .with_label_values(&[model.as_str(), category.as_str()])
            .get()
    }
}

/// Structured logger for dashboard events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_prediction(
        &self,
        model: ModelVariant,
        model_version: &str,
        prediction: f64,
        category: Category,
    ) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            model = %model,
            model_version = %model_version,
            prediction = prediction,
            category = %category,
            "Generated rainfall prediction"
        );
    }

    pub fn log_batch(
        &self,
        model: ModelVariant,
        model_version: &str,
        rows: usize,
        extreme_rows: usize,
    ) {
        info!(
            event = "batch_processed",
            instance = %self.instance,
            model = %model,
            model_version = %model_version,
            rows = rows,
            extreme_rows = extreme_rows,
            "Processed batch prediction"
        );
    }

    pub fn log_artifact_failure(&self, model: ModelVariant, error: &str) {
        warn!(
            event = "artifact_load_failed",
            instance = %self.instance,
            model = %model,
            error = %error,
            "Model artifact could not be loaded"
        );
    }

    pub fn log_startup(&self, version: &str, model_dir: &str, available_models: usize) {
        info!(
            event = "dashboard_started",
            instance = %self.instance,
            dashboard_version = %version,
            model_dir = %model_dir,
            available_models = available_models,
            "Rainfall dashboard started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "dashboard_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Rainfall dashboard shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_metrics_counting() {
        let metrics = PredictionMetrics::new();
        let before = metrics.prediction_count(ModelVariant::Tuned, Category::Extreme);

        metrics.inc_prediction(ModelVariant::Tuned, Category::Extreme);
        metrics.observe_prediction_latency(0.002);
        metrics.record_batch(ModelVariant::Tuned, 12);
        metrics.inc_artifact_load_failure(ModelVariant::Baseline);
        metrics.inc_invalid_input("manual");

        assert_eq!(
            metrics.prediction_count(ModelVariant::Tuned, Category::Extreme),
            before + 1
        );
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
