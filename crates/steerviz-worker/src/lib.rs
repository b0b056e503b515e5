//! Steering comparison renderer.
//!
//! This crate provides:
//! - Environment-driven configuration
//! - The per-epoch frame loop and its outcome
//! - Machine series smoothing
//! - Structured epoch logging and Prometheus metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod smoothing;
pub mod visualize;

pub use config::VisualizeConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::EpochLogger;
pub use visualize::{visualize, EpochRenderer, RenderOutcome};
