//! Human/machine disagreement scoring.

use serde::{Deserialize, Serialize};

/// Disagreement (degrees) at which the machine wheel turns fully red.
pub const DEFAULT_MAX_DISAGREEMENT: f64 = 10.0;

/// Absolute difference between scaled machine and human angles for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisagreementScore(pub f64);

/// Red and green blend weights for the machine wheel; they always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub r: f64,
    pub g: f64,
}

impl DisagreementScore {
    /// Score from angles that are already in degrees.
    pub fn between(human_deg: f64, machine_deg: f64) -> Self {
        Self((machine_deg - human_deg).abs())
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Normalize into `[0, 1]` against `max_disagreement`.
    pub fn normalized(&self, max_disagreement: f64) -> f64 {
        if max_disagreement <= 0.0 {
            return if self.0 > 0.0 { 1.0 } else { 0.0 };
        }
        (self.0 / max_disagreement).clamp(0.0, 1.0)
    }

    /// `(r, g) = (normalized, 1 - normalized)`.
    pub fn blend_weights(&self, max_disagreement: f64) -> BlendWeights {
        let r = self.normalized(max_disagreement);
        BlendWeights { r, g: 1.0 - r }
    }
}
