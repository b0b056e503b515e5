//! Prometheus metrics for the renderer.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_COMPOSITED_TOTAL: &str = "steerviz_frames_composited_total";
    pub const COMPOSE_DURATION_SECONDS: &str = "steerviz_compose_duration_seconds";
    pub const EPOCHS_COMPLETED_TOTAL: &str = "steerviz_epochs_completed_total";
    pub const EPOCHS_FAILED_TOTAL: &str = "steerviz_epochs_failed_total";
    pub const EPOCH_DURATION_SECONDS: &str = "steerviz_epoch_duration_seconds";
    pub const FALLBACK_SECONDARY_TOTAL: &str = "steerviz_fallback_secondary_total";
}

/// Install the Prometheus recorder; the handle renders the text snapshot.
pub fn init_metrics() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::metrics_failed(e.to_string()))
}

/// Write the current snapshot to `path`.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> WorkerResult<()> {
    std::fs::write(path, handle.render())?;
    info!(path = %path.display(), "Wrote metrics snapshot");
    Ok(())
}

/// Record one composited frame and how long it took.
pub fn record_frame(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::FRAMES_COMPOSITED_TOTAL, &labels).increment(1);
    histogram!(names::COMPOSE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_epoch_completed(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::EPOCHS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::EPOCH_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_epoch_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::EPOCHS_FAILED_TOTAL, &labels).increment(1);
}

/// The dashboard video was absent and solid frames stood in.
pub fn record_fallback_secondary() {
    counter!(names::FALLBACK_SECONDARY_TOTAL).increment(1);
}
