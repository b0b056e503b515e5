//! Per-epoch rendering loop.
//!
//! One frame at a time: pull a front/dash pair, compute the frame's error
//! statistics, draw the plot and panel, composite, and hand the frame to the
//! sink. Statistics are causal; frame `i` only sees frames `0..=i`.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use steerviz_media::{
    load_epoch_series, load_human_series, open_sink, render_panel, Compositor, FrameOverlays,
    FrameSink, FrameSource, Layout, MediaError, OutputMode, OverlayAssets, PanelText, PlotRenderer,
    SinkStatus, TextRenderer, DEFAULT_FALLBACK_COLOR,
};
use steerviz_models::{
    DisagreementScore, EpochId, PlotWindow, RunningStats, Stats, SteeringRange, SteeringSeries,
};

use crate::config::VisualizeConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::EpochLogger;
use crate::metrics;
use crate::smoothing::moving_average;

/// Result of rendering one epoch.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    pub epoch: EpochId,
    pub frames_written: u64,
    /// Delivered MP4 or still image; `None` for in-memory sinks
    pub output_path: Option<PathBuf>,
    pub final_stats: Stats,
}

/// Render `epoch`, comparing its human log against `machine`.
///
/// Loads the human series and assets, opens the cameras and the sink named
/// by the configuration, then runs the frame loop.
pub fn visualize(
    epoch: EpochId,
    machine: SteeringSeries,
    config: &VisualizeConfig,
) -> WorkerResult<RenderOutcome> {
    let started = Instant::now();
    let result = visualize_inner(epoch, machine, config);
    match &result {
        Ok(_) => metrics::record_epoch_completed(mode_label(config.output_mode), started.elapsed().as_secs_f64()),
        Err(e) => metrics::record_epoch_failed(e.kind()),
    }
    result
}

fn visualize_inner(
    epoch: EpochId,
    machine: SteeringSeries,
    config: &VisualizeConfig,
) -> WorkerResult<RenderOutcome> {
    let paths = config.layout.paths(epoch, &config.data_dir, &config.out_dir);
    debug!(?paths, "Resolved epoch paths");

    let human = load_human_series(config.layout, &paths, config.effective_human_max_angle())?;
    let assets = OverlayAssets::load(&config.assets_dir)?;
    let font = TextRenderer::resolve(config.font_path.as_deref())?;

    let renderer = EpochRenderer::new(epoch, config, human, machine, assets, font)?;

    let mut source = FrameSource::open(&paths.front, &paths.dash, DEFAULT_FALLBACK_COLOR)?;
    if source.has_fallback_secondary() {
        metrics::record_fallback_secondary();
    }
    let mut sink = open_sink(
        config.output_mode,
        &paths.intermediate,
        &paths.delivery,
        &paths.still,
        renderer.compositor.size(),
        &config.encoding(),
        !config.keep_intermediate,
    )?;

    renderer.run(&mut source, sink.as_mut())
}

fn mode_label(mode: OutputMode) -> &'static str {
    match mode {
        OutputMode::Video => "video",
        OutputMode::SingleFrame => "single_frame",
    }
}

/// Everything fixed for the duration of one epoch.
pub struct EpochRenderer<'a> {
    config: &'a VisualizeConfig,
    human: SteeringSeries,
    machine: SteeringSeries,
    compositor: Compositor,
    plot: PlotRenderer,
    assets: OverlayAssets,
    font: TextRenderer,
    logger: EpochLogger,
}

impl<'a> EpochRenderer<'a> {
    /// Validate and prepare both series, then size the plot and canvas.
    ///
    /// The lengths are checked before smoothing; smoothing only touches the
    /// machine series. The plot's y range is fixed here for the whole epoch.
    pub fn new(
        epoch: EpochId,
        config: &'a VisualizeConfig,
        human: SteeringSeries,
        machine: SteeringSeries,
        assets: OverlayAssets,
        font: TextRenderer,
    ) -> WorkerResult<Self> {
        config.validate()?;
        let (human, mut machine) = load_epoch_series(human, machine)?;

        if config.perform_smoothing {
            let smoothed = moving_average(machine.raw(), config.smoothing_window);
            machine = machine.map_values(smoothed)?;
            debug!(window = config.smoothing_window, "Smoothed machine series");
        }

        let range = SteeringRange::from_pair(&human, &machine);
        let compositor = Compositor::new(Layout::default(), config.resolution.size())?;
        let plot = PlotRenderer::new(compositor.plot_size(), range.symmetric_limits());

        info!(
            epoch = %epoch,
            frames = human.len(),
            steering_min = range.min,
            steering_max = range.max,
            "Prepared epoch"
        );

        Ok(Self {
            config,
            human,
            machine,
            compositor,
            plot,
            assets,
            font,
            logger: EpochLogger::new(epoch, "visualize"),
        })
    }

    pub fn human(&self) -> &SteeringSeries {
        &self.human
    }

    pub fn machine(&self) -> &SteeringSeries {
        &self.machine
    }

    /// Frames the loop will attempt, before either stream runs out.
    pub fn frame_budget(&self) -> usize {
        let total = self.human.len();
        self.config.frame_count_limit.map_or(total, |limit| limit.min(total))
    }

    /// Accumulate frame `index` into `stats` and return its panel text.
    pub fn panel_for_frame(&self, index: usize, stats: &mut RunningStats) -> WorkerResult<PanelText> {
        let (actual, predicted) = self.angles(index)?;
        let error = DisagreementScore::between(actual, predicted).value();
        let snapshot = stats.update(error);

        Ok(PanelText {
            frame_index: index,
            forward_pass_ms: self.machine.timing(index).map(|s| s * 1000.0),
            actual,
            predicted,
            error,
            avg: snapshot.avg,
            stddev: snapshot.stddev,
        })
    }

    fn angles(&self, index: usize) -> WorkerResult<(f64, f64)> {
        match (self.human.scaled(index), self.machine.scaled(index)) {
            (Some(h), Some(m)) => Ok((h, m)),
            _ => Err(WorkerError::render_failed(format!(
                "frame {index} is past the end of the steering log ({} frames)",
                self.human.len()
            ))),
        }
    }

    /// Run the frame loop until the log or the frame limit is exhausted, or
    /// the sink asks to stop. The sink is finished on success; on error it is
    /// left for its owner to drop. A video that ends early is a read error.
    pub fn run(&self, source: &mut FrameSource, sink: &mut dyn FrameSink) -> WorkerResult<RenderOutcome> {
        let _span = self.logger.create_span().entered();
        let result = self.run_frames(source, sink);
        if let Err(e) = &result {
            self.logger.log_error(&e.to_string());
        }
        result
    }

    fn run_frames(&self, source: &mut FrameSource, sink: &mut dyn FrameSink) -> WorkerResult<RenderOutcome> {
        let total = self.human.len();
        let budget = self.frame_budget();
        let mode = mode_label(self.config.output_mode);

        self.logger
            .log_start(&format!("{budget} of {total} frames, {mode} output"));
        if source.has_fallback_secondary() {
            self.logger
                .log_warning("dashboard video missing, drawing solid frames in its place");
        }

        let mut stats = RunningStats::with_capacity(budget);
        let mut frame_index = 0;

        while frame_index < budget {
            if frame_index != 0 && frame_index % self.config.verbose_progress_step == 0 {
                if self.config.verbose {
                    self.logger.log_progress(frame_index, total, &stats.current());
                } else {
                    debug!(frame_index, total, "Render progress");
                }
            }

            let Some(frames) = source.next()? else {
                return Err(MediaError::read_failed(format!(
                    "video ended after {frame_index} frames, expected {budget}"
                ))
                .into());
            };
            let started = Instant::now();

            let panel_text = self.panel_for_frame(frame_index, &mut stats)?;
            let window = PlotWindow::around(
                &self.human,
                &self.machine,
                frame_index,
                self.config.window_before,
                self.config.window_after,
                self.config.fps,
            );
            let plot = self.plot.render(&window, Some(&self.font))?;
            let panel = render_panel(&panel_text, &self.font);

            let blend = DisagreementScore(panel_text.error).blend_weights(self.config.max_disagreement);
            let overlays = FrameOverlays {
                plot: &plot,
                panel: &panel,
                human_angle: panel_text.actual,
                machine_angle: panel_text.predicted,
                blend,
            };
            let composite = self.compositor.compose(&frames, &overlays, &self.assets);

            let status = sink.write(&composite)?;
            metrics::record_frame(mode, started.elapsed().as_secs_f64());
            frame_index += 1;

            if status == SinkStatus::Complete {
                debug!(frame_index, "Sink complete, stopping");
                break;
            }
        }

        let output_path = sink.finish()?;
        let final_stats = stats.current();
        self.logger.log_completion(sink.frames_written(), &final_stats);

        Ok(RenderOutcome {
            epoch: self.logger.epoch(),
            frames_written: sink.frames_written(),
            output_path,
            final_stats,
        })
    }
}
