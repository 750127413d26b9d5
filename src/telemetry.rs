use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const PREDICTIONS_TOTAL: &str = "predictions_total";
pub const PREDICTION_ERRORS_TOTAL: &str = "prediction_errors_total";
pub const PREDICTION_DURATION_SECONDS: &str = "prediction_duration_seconds";

/// Installs the global Prometheus recorder. The returned handle renders the
/// text exposition served at `/metrics`.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub fn observe_prediction(label: &str, elapsed: Duration) {
    metrics::counter!(PREDICTIONS_TOTAL, "label" => label.to_string()).increment(1);
    metrics::histogram!(PREDICTION_DURATION_SECONDS).record(elapsed.as_secs_f64());
}

pub fn observe_error() {
    metrics::counter!(PREDICTION_ERRORS_TOTAL).increment(1);
}
