//! Epoch identifiers and on-disk dataset layouts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ModelError;

/// One recorded driving session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochId(pub u32);

impl EpochId {
    /// File stem used by the dataset, e.g. `epoch07`.
    pub fn stem(&self) -> String {
        format!("epoch{:0>2}", self.0)
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EpochId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(EpochId)
            .map_err(|_| ModelError::invalid_value(format!("epoch id must be a number, got '{s}'")))
    }
}

/// How an epoch's files are arranged on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatasetLayout {
    /// Published DeepTesla epochs: `epochNN_{steering.csv,front.mkv,dash.mkv}`,
    /// steering already in degrees in the `wheel` column.
    #[default]
    DeepTesla,
    /// Self-recorded sessions: `datasetN/{data.csv,out-mencoder2.avi}`,
    /// normalized steering in the `angle` column.
    Recorded,
}

impl DatasetLayout {
    /// Column holding the human steering value.
    pub fn steering_column(&self) -> &'static str {
        match self {
            DatasetLayout::DeepTesla => "wheel",
            DatasetLayout::Recorded => "angle",
        }
    }

    /// Max-angle constant for the human series.
    ///
    /// DeepTesla logs are already in degrees, so they are left unscaled.
    pub fn human_max_angle(&self, machine_max_angle: f64) -> f64 {
        match self {
            DatasetLayout::DeepTesla => 1.0,
            DatasetLayout::Recorded => machine_max_angle,
        }
    }

    /// Resolve every path for `epoch` under `data_dir`, writing into `out_dir`.
    pub fn paths(&self, epoch: EpochId, data_dir: &Path, out_dir: &Path) -> EpochPaths {
        let stem = epoch.stem();
        let (steering, front) = match self {
            DatasetLayout::DeepTesla => (
                data_dir.join(format!("{stem}_steering.csv")),
                data_dir.join(format!("{stem}_front.mkv")),
            ),
            DatasetLayout::Recorded => {
                let dataset = data_dir.join(format!("dataset{}", epoch.0));
                (dataset.join("data.csv"), dataset.join("out-mencoder2.avi"))
            }
        };
        let output_stem = format!("{stem}_human_machine");

        EpochPaths {
            steering,
            front,
            dash: data_dir.join(format!("{stem}_dash.mkv")),
            intermediate: out_dir.join(format!("{output_stem}.mkv")),
            delivery: out_dir.join(format!("{output_stem}.mp4")),
            still: out_dir.join(format!("{output_stem}.jpg")),
        }
    }
}

impl FromStr for DatasetLayout {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deeptesla" | "deep_tesla" | "given" => Ok(DatasetLayout::DeepTesla),
            "recorded" | "dataset" => Ok(DatasetLayout::Recorded),
            other => Err(ModelError::UnknownLayout(other.to_string())),
        }
    }
}

/// All files touched while rendering one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochPaths {
    /// Human steering log
    pub steering: PathBuf,
    /// Front-facing camera (required)
    pub front: PathBuf,
    /// Dashboard camera (optional)
    pub dash: PathBuf,
    /// Matroska file written frame by frame
    pub intermediate: PathBuf,
    /// Final MP4
    pub delivery: PathBuf,
    /// Still image for single-frame mode
    pub still: PathBuf,
}
