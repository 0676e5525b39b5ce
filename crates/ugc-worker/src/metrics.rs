//! Render metrics.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use ugc_models::CompositionMode;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const RENDERS_TOTAL: &str = "ugc_renders_total";
    pub const RENDER_FAILURES_TOTAL: &str = "ugc_render_failures_total";
    pub const RENDER_DURATION_SECONDS: &str = "ugc_render_duration_seconds";
    pub const DRY_RUNS_TOTAL: &str = "ugc_dry_runs_total";
}

/// Install the Prometheus recorder.
pub fn init_metrics() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::Metrics(e.to_string()))
}

/// Write the current metrics in Prometheus text format.
pub fn write_metrics(handle: &PrometheusHandle, path: &std::path::Path) -> WorkerResult<()> {
    std::fs::write(path, handle.render())?;
    Ok(())
}

/// Record a finished render.
pub fn record_render(mode: CompositionMode, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::RENDERS_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a failed render. `mode` is unknown when planning failed.
pub fn record_render_failure(mode: Option<CompositionMode>, reason: &str) {
    let labels = [
        (
            "mode",
            mode.map(|m| m.to_string()).unwrap_or_else(|| "unknown".to_string()),
        ),
        ("reason", reason.to_string()),
    ];
    counter!(names::RENDER_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a dry run.
pub fn record_dry_run(mode: CompositionMode) {
    let labels = [("mode", mode.to_string())];
    counter!(names::DRY_RUNS_TOTAL, &labels).increment(1);
}
