//! Steering comparison renderer binary.
//!
//! Usage: `steerviz <epoch_id> [predictions.csv]`
//!
//! Without a predictions file the human log is compared against itself,
//! which exercises the whole pipeline with zero error.

use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use steerviz_media::{load_human_series, load_prediction_series};
use steerviz_models::EpochId;
use steerviz_worker::{metrics, visualize, VisualizeConfig};

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored text for local runs, JSON for log collection
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("steerviz=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let Some(epoch_arg) = args.next() else {
        bail!("usage: steerviz <epoch_id> [predictions.csv]");
    };
    let epoch: EpochId = epoch_arg.parse().context("invalid epoch id")?;
    let predictions = args.next().map(PathBuf::from);

    let config = VisualizeConfig::from_env()?;
    info!(?config, "Starting steerviz");

    let prometheus = match &config.metrics_path {
        Some(_) => Some(metrics::init_metrics()?),
        None => None,
    };

    let machine = match &predictions {
        Some(path) => load_prediction_series(path, config.machine_max_angle)?,
        None => {
            info!("No predictions given, comparing the human log against itself");
            let paths = config.layout.paths(epoch, &config.data_dir, &config.out_dir);
            load_human_series(config.layout, &paths, config.effective_human_max_angle())?
        }
    };

    let result = visualize(epoch, machine, &config);

    if let (Some(handle), Some(path)) = (&prometheus, &config.metrics_path) {
        if let Err(e) = metrics::write_snapshot(handle, path) {
            error!(error = %e, "Failed to write metrics snapshot");
        }
    }

    match result {
        Ok(outcome) => {
            info!(summary = %serde_json::to_string(&outcome)?, "Render finished");
            Ok(())
        }
        Err(e) => {
            error!(epoch = %epoch, error = %e, "Render failed");
            Err(e.into())
        }
    }
}
