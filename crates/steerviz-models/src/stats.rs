//! Running error statistics.
//!
//! The accumulator only ever sees frames in order and never looks ahead, so
//! the values shown on frame `i` depend on frames `0..=i` alone.

use serde::{Deserialize, Serialize};

/// Snapshot returned after each update.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Mean absolute error so far
    pub avg: f64,
    /// Population standard deviation of all errors so far
    pub stddev: f64,
    /// Number of frames accumulated
    pub count: usize,
}

/// Causal accumulator of per-frame steering errors.
///
/// Mean and variance are maintained with Welford's update, so each call is
/// O(1); the full history is kept for reporting.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    cumulative_error_sum: f64,
    error_history: Vec<f64>,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the history for an episode of known length.
    pub fn with_capacity(frames: usize) -> Self {
        Self {
            error_history: Vec::with_capacity(frames),
            ..Self::default()
        }
    }

    /// Accumulate one frame's error and return the updated statistics.
    pub fn update(&mut self, error: f64) -> Stats {
        self.cumulative_error_sum += error;
        self.error_history.push(error);

        let n = self.error_history.len() as f64;
        let delta = error - self.mean;
        self.mean += delta / n;
        self.m2 += delta * (error - self.mean);

        self.current()
    }

    /// Statistics over everything accumulated so far.
    pub fn current(&self) -> Stats {
        let count = self.count();
        if count == 0 {
            return Stats::default();
        }
        let variance = (self.m2 / count as f64).max(0.0);
        Stats {
            avg: self.cumulative_error_sum / count as f64,
            stddev: variance.sqrt(),
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.error_history.len()
    }

    pub fn cumulative_error_sum(&self) -> f64 {
        self.cumulative_error_sum
    }

    pub fn error_history(&self) -> &[f64] {
        &self.error_history
    }
}
