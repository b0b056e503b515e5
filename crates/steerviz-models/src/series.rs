//! Steering angle series.
//!
//! A series holds one raw value per video frame plus the max-angle constant
//! that maps raw values to degrees. Series are immutable once built.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// One steering log, indexed by frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringSeries {
    /// Raw values as stored in the log
    values: Vec<f64>,
    /// Scale from raw value to degrees
    max_angle: f64,
    /// Per-frame forward pass duration in seconds (predictions only)
    timings: Option<Vec<f64>>,
}

impl SteeringSeries {
    /// Build a series, rejecting NaN and infinite values.
    pub fn new(values: Vec<f64>, max_angle: f64) -> ModelResult<Self> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite { index });
        }
        if !max_angle.is_finite() {
            return Err(ModelError::invalid_value(format!(
                "max angle must be finite, got {max_angle}"
            )));
        }
        Ok(Self {
            values,
            max_angle,
            timings: None,
        })
    }

    /// Attach per-frame forward pass timings (seconds).
    pub fn with_timings(mut self, timings: Vec<f64>) -> ModelResult<Self> {
        if timings.len() != self.values.len() {
            return Err(ModelError::TimingMismatch {
                timings: timings.len(),
                frames: self.values.len(),
            });
        }
        self.timings = Some(timings);
        Ok(self)
    }

    /// Return a copy with the raw values replaced, keeping scale and timings.
    ///
    /// Used after smoothing; the replacement must have the same length.
    pub fn map_values(&self, values: Vec<f64>) -> ModelResult<Self> {
        if values.len() != self.values.len() {
            return Err(ModelError::invalid_value(format!(
                "replacement has {} values, series has {}",
                values.len(),
                self.values.len()
            )));
        }
        Ok(Self {
            values,
            max_angle: self.max_angle,
            timings: self.timings.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max_angle(&self) -> f64 {
        self.max_angle
    }

    pub fn raw(&self) -> &[f64] {
        &self.values
    }

    /// Angle in degrees at `index`, or `None` past the end.
    pub fn scaled(&self, index: usize) -> Option<f64> {
        self.values.get(index).map(|v| v * self.max_angle)
    }

    /// Forward pass duration in seconds at `index`, if timings were recorded.
    pub fn timing(&self, index: usize) -> Option<f64> {
        self.timings.as_ref().and_then(|t| t.get(index).copied())
    }

    /// Minimum and maximum scaled values, or `None` for an empty series.
    pub fn scaled_bounds(&self) -> Option<(f64, f64)> {
        self.values.iter().map(|v| v * self.max_angle).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Episode-wide steering extent, computed once before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringRange {
    pub min: f64,
    pub max: f64,
}

impl SteeringRange {
    /// Combined extent over both scaled series.
    pub fn from_pair(human: &SteeringSeries, machine: &SteeringSeries) -> Self {
        let (h_lo, h_hi) = human.scaled_bounds().unwrap_or((0.0, 0.0));
        let (m_lo, m_hi) = machine.scaled_bounds().unwrap_or((0.0, 0.0));
        Self {
            min: h_lo.min(m_lo),
            max: h_hi.max(m_hi),
        }
    }

    /// Symmetric plot limits `[-R, R]` with `R = max(|min|, |max|)`.
    ///
    /// A flat zero series yields `[-1, 1]` so the plot keeps a usable scale.
    pub fn symmetric_limits(&self) -> (f64, f64) {
        let r = self.min.abs().max(self.max.abs());
        if r > 0.0 {
            (-r, r)
        } else {
            (-1.0, 1.0)
        }
    }
}

/// Check that the human and machine series cover the same frames.
pub fn ensure_same_length(human: &SteeringSeries, machine: &SteeringSeries) -> ModelResult<()> {
    if human.len() != machine.len() {
        return Err(ModelError::LengthMismatch {
            human: human.len(),
            machine: machine.len(),
        });
    }
    Ok(())
}
