//! Steering log loading.
//!
//! Human logs and machine prediction files are plain CSV with a header row.
//! Only the named column is read; other columns are ignored.

use std::path::Path;
use tracing::{debug, info};

use steerviz_models::{ensure_same_length, DatasetLayout, EpochPaths, SteeringSeries};

use crate::error::{MediaError, MediaResult};

/// Value column in prediction files.
pub const PREDICTION_COLUMN: &str = "angle";
/// Optional per-frame inference latency column (seconds).
pub const FORWARD_PASS_COLUMN: &str = "forward_pass_s";

/// Read one float column by header name.
pub fn load_column(path: &Path, column: &str) -> MediaResult<Vec<f64>> {
    load_columns(path, column, None).map(|(values, _)| values)
}

/// Read a required column and, if present in the header, an optional one.
fn load_columns(
    path: &Path,
    column: &str,
    optional: Option<&str>,
) -> MediaResult<(Vec<f64>, Option<Vec<f64>>)> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let index = headers.iter().position(|h| h == column).ok_or_else(|| {
        MediaError::format(format!(
            "{}: missing column '{column}' (found: {})",
            path.display(),
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })?;
    let optional = optional.and_then(|name| Some((headers.iter().position(|h| h == name)?, name)));

    let mut values = Vec::new();
    let mut extra = optional.map(|_| Vec::new());

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = row + 2;
        values.push(parse_cell(path, line, column, record.get(index))?);

        if let (Some((i, name)), Some(extra)) = (optional, extra.as_mut()) {
            extra.push(parse_cell(path, line, name, record.get(i))?);
        }
    }

    debug!(
        path = %path.display(),
        column,
        rows = values.len(),
        "Loaded steering column"
    );
    Ok((values, extra))
}

fn parse_cell(path: &Path, line: usize, column: &str, cell: Option<&str>) -> MediaResult<f64> {
    let cell = cell.ok_or_else(|| {
        MediaError::format(format!(
            "{}:{line}: row has no '{column}' value",
            path.display()
        ))
    })?;
    cell.parse::<f64>().map_err(|_| {
        MediaError::format(format!(
            "{}:{line}: '{cell}' in column '{column}' is not a number",
            path.display()
        ))
    })
}

/// Load the human (ground truth) series for an epoch.
pub fn load_human_series(
    layout: DatasetLayout,
    paths: &EpochPaths,
    max_angle: f64,
) -> MediaResult<SteeringSeries> {
    let values = load_column(&paths.steering, layout.steering_column())?;
    Ok(SteeringSeries::new(values, max_angle)?)
}

/// Load machine predictions, with forward pass timings if the file has them.
pub fn load_prediction_series(path: &Path, max_angle: f64) -> MediaResult<SteeringSeries> {
    let (values, timings) = load_columns(path, PREDICTION_COLUMN, Some(FORWARD_PASS_COLUMN))?;
    let series = SteeringSeries::new(values, max_angle)?;
    match timings {
        Some(timings) => Ok(series.with_timings(timings)?),
        None => Ok(series),
    }
}

/// Check that both series describe the same frames.
pub fn load_epoch_series(
    human: SteeringSeries,
    machine: SteeringSeries,
) -> MediaResult<(SteeringSeries, SteeringSeries)> {
    ensure_same_length(&human, &machine).map_err(|e| MediaError::format(e.to_string()))?;
    info!(
        frames = human.len(),
        human_max_angle = human.max_angle(),
        machine_max_angle = machine.max_angle(),
        timed = machine.timing(0).is_some(),
        "Loaded steering series"
    );
    Ok((human, machine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_reads_named_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "s.csv", "ts_micro,frame_index,wheel\n1,0,0.5\n2,1,-1.25\n");
        assert_eq!(load_column(&path, "wheel").unwrap(), vec![0.5, -1.25]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_column(&dir.path().join("nope.csv"), "wheel").unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "s.csv", "angle\n0.1\n");
        let err = load_column(&path, "wheel").unwrap_err();
        assert!(matches!(err, MediaError::Format(_)));
    }

    #[test]
    fn test_bad_value_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "s.csv", "wheel\n0.1\nabc\n");
        let err = load_column(&path, "wheel").unwrap_err();
        match err {
            MediaError::Format(msg) => assert!(msg.contains(":3:"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_predictions_with_timings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "p.csv", "angle,forward_pass_s\n0.1,0.012\n0.2,0.015\n");
        let series = load_prediction_series(&path, 17.5).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timing(1), Some(0.015));
    }

    #[test]
    fn test_predictions_without_timings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "p.csv", "angle\n0.1\n");
        let series = load_prediction_series(&path, 17.5).unwrap();
        assert_eq!(series.timing(0), None);
    }

    #[test]
    fn test_unequal_lengths_rejected() {
        let human = SteeringSeries::new(vec![0.0; 3], 1.0).unwrap();
        let machine = SteeringSeries::new(vec![0.0; 2], 17.5).unwrap();
        let err = load_epoch_series(human, machine).unwrap_err();
        assert!(matches!(err, MediaError::Format(_)));
    }

    #[test]
    fn test_human_series_uses_layout_column() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "epoch01_steering.csv", "wheel,speed\n3.0,10\n-2.0,11\n");
        let paths = DatasetLayout::DeepTesla.paths(
            steerviz_models::EpochId(1),
            dir.path(),
            dir.path(),
        );
        let series = load_human_series(DatasetLayout::DeepTesla, &paths, 1.0).unwrap();
        assert_eq!(series.raw(), &[3.0, -2.0]);
    }
}
