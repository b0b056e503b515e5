//! Renderer configuration.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use steerviz_media::OutputMode;
use steerviz_models::{DatasetLayout, EncodingConfig, Resolution, DEFAULT_MAX_DISAGREEMENT};

use crate::error::{WorkerError, WorkerResult};

/// Renderer configuration.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizeConfig {
    /// Directory holding epoch videos and steering logs
    pub data_dir: PathBuf,
    /// Directory receiving rendered output
    pub out_dir: PathBuf,
    /// Directory holding the wheel and caption images
    pub assets_dir: PathBuf,
    /// TTF font for panel and plot text; unset searches system fonts, then
    /// falls back to the built-in bitmap face
    pub font_path: Option<PathBuf>,
    /// On-disk arrangement of the epoch files
    pub layout: DatasetLayout,
    /// Smooth the machine series before rendering
    pub perform_smoothing: bool,
    /// Moving average window (odd)
    pub smoothing_window: usize,
    /// Log progress while rendering
    pub verbose: bool,
    /// Frames between progress lines
    pub verbose_progress_step: usize,
    /// Stop after this many frames
    pub frame_count_limit: Option<usize>,
    /// Full video or a single still
    pub output_mode: OutputMode,
    /// Degrees per unit of machine steering
    pub machine_max_angle: f64,
    /// Degrees per unit of human steering; derived from the layout when unset
    pub human_max_angle: Option<f64>,
    /// Disagreement (degrees) at which the machine wheel is fully red
    pub max_disagreement: f64,
    /// Plot frames before the current one
    pub window_before: usize,
    /// Plot frames after the current one
    pub window_after: usize,
    /// Output canvas size
    pub resolution: Resolution,
    /// Output frame rate, also used for plot time offsets
    pub fps: f64,
    /// Keep the Matroska file after remuxing
    pub keep_intermediate: bool,
    /// Write a Prometheus text snapshot here on exit
    pub metrics_path: Option<PathBuf>,
}

impl Default for VisualizeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("output"),
            assets_dir: PathBuf::from("images"),
            font_path: None,
            layout: DatasetLayout::default(),
            perform_smoothing: false,
            smoothing_window: 11,
            verbose: false,
            verbose_progress_step: 100,
            frame_count_limit: None,
            output_mode: OutputMode::Video,
            machine_max_angle: 17.5,
            human_max_angle: None,
            max_disagreement: DEFAULT_MAX_DISAGREEMENT,
            window_before: 150,
            window_after: 150,
            resolution: Resolution::default(),
            fps: 30.0,
            keep_intermediate: false,
            metrics_path: None,
        }
    }
}

impl VisualizeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> WorkerResult<Self> {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let config = Self {
            data_dir: get("STEERVIZ_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            out_dir: get("STEERVIZ_OUT_DIR").map(PathBuf::from).unwrap_or(defaults.out_dir),
            assets_dir: get("STEERVIZ_ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_dir),
            font_path: get("STEERVIZ_FONT_PATH").map(PathBuf::from),
            layout: parse_var("STEERVIZ_LAYOUT", get("STEERVIZ_LAYOUT"))?.unwrap_or(defaults.layout),
            perform_smoothing: parse_flag("STEERVIZ_PERFORM_SMOOTHING", get("STEERVIZ_PERFORM_SMOOTHING"))?
                .unwrap_or(defaults.perform_smoothing),
            smoothing_window: parse_var("STEERVIZ_SMOOTHING_WINDOW", get("STEERVIZ_SMOOTHING_WINDOW"))?
                .unwrap_or(defaults.smoothing_window),
            verbose: parse_flag("STEERVIZ_VERBOSE", get("STEERVIZ_VERBOSE"))?.unwrap_or(defaults.verbose),
            verbose_progress_step: parse_var("STEERVIZ_PROGRESS_STEP", get("STEERVIZ_PROGRESS_STEP"))?
                .unwrap_or(defaults.verbose_progress_step),
            frame_count_limit: parse_var("STEERVIZ_FRAME_LIMIT", get("STEERVIZ_FRAME_LIMIT"))?,
            output_mode: match parse_flag("STEERVIZ_SINGLE_FRAME", get("STEERVIZ_SINGLE_FRAME"))? {
                Some(true) => OutputMode::SingleFrame,
                _ => OutputMode::Video,
            },
            machine_max_angle: parse_var("STEERVIZ_MAX_ANGLE", get("STEERVIZ_MAX_ANGLE"))?
                .unwrap_or(defaults.machine_max_angle),
            human_max_angle: parse_var("STEERVIZ_HUMAN_MAX_ANGLE", get("STEERVIZ_HUMAN_MAX_ANGLE"))?,
            max_disagreement: parse_var("STEERVIZ_MAX_DISAGREEMENT", get("STEERVIZ_MAX_DISAGREEMENT"))?
                .unwrap_or(defaults.max_disagreement),
            window_before: parse_var("STEERVIZ_WINDOW_BEFORE", get("STEERVIZ_WINDOW_BEFORE"))?
                .unwrap_or(defaults.window_before),
            window_after: parse_var("STEERVIZ_WINDOW_AFTER", get("STEERVIZ_WINDOW_AFTER"))?
                .unwrap_or(defaults.window_after),
            resolution: parse_var("STEERVIZ_RESOLUTION", get("STEERVIZ_RESOLUTION"))?
                .unwrap_or(defaults.resolution),
            fps: parse_var("STEERVIZ_FPS", get("STEERVIZ_FPS"))?.unwrap_or(defaults.fps),
            keep_intermediate: parse_flag("STEERVIZ_KEEP_INTERMEDIATE", get("STEERVIZ_KEEP_INTERMEDIATE"))?
                .unwrap_or(defaults.keep_intermediate),
            metrics_path: get("STEERVIZ_METRICS_PATH").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.smoothing_window == 0 || self.smoothing_window % 2 == 0 {
            return Err(WorkerError::config_error(format!(
                "smoothing window must be odd, got {}",
                self.smoothing_window
            )));
        }
        if self.verbose_progress_step == 0 {
            return Err(WorkerError::config_error("progress step must be at least 1"));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(WorkerError::config_error(format!("fps must be positive, got {}", self.fps)));
        }
        for (name, value) in [
            ("max angle", self.machine_max_angle),
            ("human max angle", self.human_max_angle.unwrap_or(1.0)),
            ("max disagreement", self.max_disagreement),
        ] {
            if !value.is_finite() {
                return Err(WorkerError::config_error(format!("{name} must be finite")));
            }
        }
        if self.max_disagreement <= 0.0 {
            return Err(WorkerError::config_error("max disagreement must be positive"));
        }
        Ok(())
    }

    /// Scale for the human series: the explicit override, else the layout's.
    pub fn effective_human_max_angle(&self) -> f64 {
        self.human_max_angle
            .unwrap_or_else(|| self.layout.human_max_angle(self.machine_max_angle))
    }

    /// Encoder settings for the output video.
    pub fn encoding(&self) -> EncodingConfig {
        EncodingConfig::default().with_fps(self.fps)
    }
}

fn parse_var<T>(name: &str, value: Option<String>) -> WorkerResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| WorkerError::config_error(format!("{name}={v}: {e}")))
        })
        .transpose()
}

fn parse_flag(name: &str, value: Option<String>) -> WorkerResult<Option<bool>> {
    value
        .map(|v| match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(WorkerError::config_error(format!("{name}={v}: expected a boolean"))),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> WorkerResult<VisualizeConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        VisualizeConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.smoothing_window, 11);
        assert_eq!(config.verbose_progress_step, 100);
        assert_eq!(config.output_mode, OutputMode::Video);
        assert_eq!(config.resolution.size(), (1280, 720));
        assert_eq!(config.effective_human_max_angle(), 1.0);
        assert!(config.frame_count_limit.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("STEERVIZ_LAYOUT", "recorded"),
            ("STEERVIZ_FRAME_LIMIT", "150"),
            ("STEERVIZ_SINGLE_FRAME", "yes"),
            ("STEERVIZ_PERFORM_SMOOTHING", "1"),
            ("STEERVIZ_MAX_ANGLE", "20"),
            ("STEERVIZ_FONT_PATH", "/fonts/DejaVuSans.ttf"),
        ])
        .unwrap();
        assert_eq!(config.layout, DatasetLayout::Recorded);
        assert_eq!(config.frame_count_limit, Some(150));
        assert_eq!(config.output_mode, OutputMode::SingleFrame);
        assert!(config.perform_smoothing);
        assert_eq!(config.effective_human_max_angle(), 20.0);
        assert_eq!(config.font_path, Some(PathBuf::from("/fonts/DejaVuSans.ttf")));
    }

    #[test]
    fn test_human_max_angle_override() {
        let config = config_from(&[("STEERVIZ_HUMAN_MAX_ANGLE", "3.5")]).unwrap();
        assert_eq!(config.effective_human_max_angle(), 3.5);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            [("STEERVIZ_FRAME_LIMIT", "many")],
            [("STEERVIZ_LAYOUT", "carla")],
            [("STEERVIZ_SMOOTHING_WINDOW", "10")],
            [("STEERVIZ_VERBOSE", "maybe")],
            [("STEERVIZ_PROGRESS_STEP", "0")],
            [("STEERVIZ_RESOLUTION", "4k")],
        ] {
            let err = config_from(&vars).unwrap_err();
            assert!(matches!(err, WorkerError::ConfigError(_)), "{vars:?}");
        }
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("STEERVIZ_FPS", "  ")]).unwrap();
        assert_eq!(config.fps, 30.0);
    }
}
