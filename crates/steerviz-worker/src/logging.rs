//! Structured epoch logging.
//!
//! Every event carries the epoch and operation so a multi-epoch log can be
//! filtered per run.

use tracing::{error, info, warn, Span};

use steerviz_models::{EpochId, Stats};

/// Epoch logger for lifecycle and progress events.
#[derive(Debug, Clone)]
pub struct EpochLogger {
    epoch: EpochId,
    operation: String,
}

impl EpochLogger {
    pub fn new(epoch: EpochId, operation: &str) -> Self {
        Self {
            epoch,
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            epoch = %self.epoch,
            operation = %self.operation,
            "Epoch started: {}", message
        );
    }

    /// Progress line every `verbose_progress_step` frames.
    pub fn log_progress(&self, completed: usize, total: usize, stats: &Stats) {
        info!(
            epoch = %self.epoch,
            operation = %self.operation,
            completed,
            total,
            avg_error = stats.avg,
            stddev = stats.stddev,
            "completed {} of {} frames", completed, total
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            epoch = %self.epoch,
            operation = %self.operation,
            "Epoch warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            epoch = %self.epoch,
            operation = %self.operation,
            "Epoch error: {}", message
        );
    }

    pub fn log_completion(&self, frames: u64, stats: &Stats) {
        info!(
            epoch = %self.epoch,
            operation = %self.operation,
            frames,
            avg_error = stats.avg,
            stddev = stats.stddev,
            "Epoch completed"
        );
    }

    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole render of this epoch.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "epoch",
            epoch = %self.epoch,
            operation = %self.operation
        )
    }
}
