//! Shared data models for steerviz.
//!
//! This crate provides plain, I/O-free types for:
//! - Steering angle series and their max-angle scaling
//! - Causal running error statistics
//! - Disagreement scoring and the red/green wheel blend
//! - Plot windows around the current frame
//! - Output resolution classes and encoding settings
//! - Epoch identifiers and dataset path layouts

pub mod disagreement;
pub mod encoding;
pub mod epoch;
pub mod error;
pub mod plot_window;
pub mod resolution;
pub mod series;
pub mod stats;

// Re-export common types
pub use disagreement::{BlendWeights, DisagreementScore, DEFAULT_MAX_DISAGREEMENT};
pub use encoding::EncodingConfig;
pub use epoch::{DatasetLayout, EpochId, EpochPaths};
pub use error::{ModelError, ModelResult};
pub use plot_window::{PlotSample, PlotWindow};
pub use resolution::Resolution;
pub use series::{ensure_same_length, SteeringRange, SteeringSeries};
pub use stats::{RunningStats, Stats};
