//! Relative-time window of both series around the current frame.

use serde::{Deserialize, Serialize};

use crate::series::SteeringSeries;

/// One plotted point, already scaled to degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotSample {
    /// Offset in frames from the current frame
    pub offset: i64,
    /// Offset in seconds (`offset / fps`)
    pub seconds: f64,
    pub human: f64,
    pub machine: f64,
}

/// Samples for `k` in `[-before, after]`, skipping out-of-range frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotWindow {
    pub center: usize,
    pub before: usize,
    pub after: usize,
    pub fps: f64,
    pub samples: Vec<PlotSample>,
}

impl PlotWindow {
    /// Slice both series around `center`.
    ///
    /// Offsets whose absolute frame falls outside either series are omitted,
    /// never clamped or padded.
    pub fn around(
        human: &SteeringSeries,
        machine: &SteeringSeries,
        center: usize,
        before: usize,
        after: usize,
        fps: f64,
    ) -> Self {
        let len = human.len().min(machine.len()) as i64;
        let center_i = center as i64;
        let samples = (-(before as i64)..=after as i64)
            .filter_map(|offset| {
                let abs = center_i + offset;
                if abs < 0 || abs >= len {
                    return None;
                }
                let abs = abs as usize;
                Some(PlotSample {
                    offset,
                    seconds: offset as f64 / fps,
                    human: human.scaled(abs)?,
                    machine: machine.scaled(abs)?,
                })
            })
            .collect();

        Self {
            center,
            before,
            after,
            fps,
            samples,
        }
    }

    /// Fixed x-axis limits in seconds, independent of clipping.
    pub fn x_limits(&self) -> (f64, f64) {
        (-(self.before as f64) / self.fps, self.after as f64 / self.fps)
    }

    pub fn offsets(&self) -> impl Iterator<Item = i64> + '_ {
        self.samples.iter().map(|s| s.offset)
    }
}
