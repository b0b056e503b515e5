//! Windowed steering plot.
//!
//! The chart is drawn dark-on-white with plotters into an RGB buffer, then
//! color-inverted so it sits on the dark lower band of the output frame.
//! Text (tick labels and axis titles) needs a font and is skipped without
//! one; the plot area keeps the same margins either way.

use image::imageops;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::trace;

use steerviz_models::PlotWindow;

use crate::error::{MediaError, MediaResult};
use crate::overlay::alpha_overlay;
use crate::text::TextRenderer;

pub const X_AXIS_TITLE: &str = "Current Time (secs)";
pub const Y_AXIS_TITLE: &str = "Steering Angle";

const HUMAN_COLOR: RGBColor = RGBColor(31, 119, 180);
const MACHINE_COLOR: RGBColor = RGBColor(255, 127, 14);
const GRID_COLOR: RGBColor = RGBColor(225, 225, 225);

const MARGIN_LEFT: u32 = 46;
const MARGIN_BOTTOM: u32 = 30;
const MARGIN_TOP: u32 = 8;
const MARGIN_RIGHT: u32 = 10;

const LABEL_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 11.0;

/// Renders one plot raster per frame with fixed axes.
#[derive(Debug, Clone, Copy)]
pub struct PlotRenderer {
    width: u32,
    height: u32,
    y_limits: (f64, f64),
}

/// Tick positions in backend pixels, collected while plotters owns the buffer.
struct TickMarks {
    x: Vec<(f64, (i32, i32))>,
    y: Vec<(f64, (i32, i32))>,
    area_bottom: i32,
}

impl PlotRenderer {
    /// `y_limits` are fixed for the whole episode.
    pub fn new((width, height): (u32, u32), y_limits: (f64, f64)) -> Self {
        Self {
            width,
            height,
            y_limits,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render `window` and return the inverted raster.
    pub fn render(&self, window: &PlotWindow, font: Option<&TextRenderer>) -> MediaResult<RgbImage> {
        let (w, h) = (self.width, self.height);
        if w <= MARGIN_LEFT + MARGIN_RIGHT || h <= MARGIN_TOP + MARGIN_BOTTOM {
            return Err(MediaError::Plot(format!("plot size {w}x{h} is too small")));
        }

        let mut buffer = vec![255u8; w as usize * h as usize * 3];
        let ticks = {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            self.draw_chart(&root, window)?
        };

        let mut img = RgbImage::from_raw(w, h, buffer)
            .ok_or_else(|| MediaError::Plot("plot buffer size mismatch".to_string()))?;

        if let Some(font) = font {
            draw_labels(&mut img, font, &ticks);
        }

        imageops::invert(&mut img);
        trace!(center = window.center, samples = window.samples.len(), "Rendered plot");
        Ok(img)
    }

    fn draw_chart(
        &self,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        window: &PlotWindow,
    ) -> MediaResult<TickMarks> {
        root.fill(&WHITE).map_err(plot_error)?;

        let (x0, x1) = window.x_limits();
        let (y0, y1) = self.y_limits;

        let mut chart = ChartBuilder::on(root)
            .margin_left(MARGIN_LEFT)
            .margin_bottom(MARGIN_BOTTOM)
            .margin_top(MARGIN_TOP)
            .margin_right(MARGIN_RIGHT)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(plot_error)?;

        let x_ticks = x_ticks(x0, x1);
        let y_ticks = y_ticks(y0, y1);

        let grid = GRID_COLOR.stroke_width(1);
        chart
            .draw_series(
                x_ticks
                    .iter()
                    .map(|&x| PathElement::new(vec![(x, y0), (x, y1)], grid))
                    .chain(
                        y_ticks
                            .iter()
                            .map(|&y| PathElement::new(vec![(x0, y), (x1, y)], grid)),
                    ),
            )
            .map_err(plot_error)?;

        // Dashed reference line at the current frame.
        let dash = (y1 - y0) / 24.0;
        let dashes = (0..12).map(|i| {
            let start = y0 + dash * (2 * i) as f64;
            PathElement::new(vec![(0.0, start), (0.0, start + dash)], BLACK.stroke_width(1))
        });
        chart.draw_series(dashes).map_err(plot_error)?;

        let human: Vec<(f64, f64)> = window.samples.iter().map(|s| (s.seconds, s.human)).collect();
        let machine: Vec<(f64, f64)> = window.samples.iter().map(|s| (s.seconds, s.machine)).collect();
        chart
            .draw_series([
                PathElement::new(human, HUMAN_COLOR.stroke_width(2)),
                PathElement::new(machine, MACHINE_COLOR.stroke_width(2)),
            ])
            .map_err(plot_error)?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)],
                BLACK.stroke_width(1),
            )))
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;

        Ok(TickMarks {
            x: x_ticks.iter().map(|&x| (x, chart.backend_coord(&(x, y0)))).collect(),
            y: y_ticks.iter().map(|&y| (y, chart.backend_coord(&(x0, y)))).collect(),
            area_bottom: chart.backend_coord(&(x0, y0)).1,
        })
    }
}

fn plot_error(e: impl std::fmt::Display) -> MediaError {
    MediaError::Plot(e.to_string())
}

/// Whole-second ticks with a step that keeps about five labels.
fn x_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let span = hi - lo;
    if span.is_nan() || span <= 0.0 {
        return vec![lo];
    }
    let step = [1.0, 2.0, 2.5, 5.0, 10.0, 20.0, 60.0]
        .into_iter()
        .find(|s| span / s <= 6.0)
        .unwrap_or(span / 5.0);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Both limits, the midpoints and zero.
fn y_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let mid = (lo + hi) / 2.0;
    vec![lo, (lo + mid) / 2.0, mid, (mid + hi) / 2.0, hi]
}

fn draw_labels(img: &mut RgbImage, font: &TextRenderer, ticks: &TickMarks) {
    let ink = Rgb([0, 0, 0]);

    for (value, (px, _)) in &ticks.x {
        let text = format_tick(*value);
        let tw = font.text_width(&text, LABEL_SIZE) as i32;
        font.draw_rgb(img, px - tw / 2, ticks.area_bottom + 3, &text, ink, LABEL_SIZE);
    }
    for (value, (px, py)) in &ticks.y {
        let text = format!("{value:.1}");
        let tw = font.text_width(&text, LABEL_SIZE) as i32;
        font.draw_rgb(img, px - tw - 4, py - LABEL_SIZE as i32 / 2, &text, ink, LABEL_SIZE);
    }

    let (w, h) = img.dimensions();
    let title_w = font.text_width(X_AXIS_TITLE, TITLE_SIZE) as i32;
    let area_center = (MARGIN_LEFT as i32 + (w - MARGIN_RIGHT) as i32) / 2;
    font.draw_rgb(
        img,
        area_center - title_w / 2,
        h as i32 - TITLE_SIZE as i32 - 3,
        X_AXIS_TITLE,
        ink,
        TITLE_SIZE,
    );

    // Vertical title: draw onto a transparent strip and turn it a quarter.
    let strip_w = font.text_width(Y_AXIS_TITLE, TITLE_SIZE).max(1);
    let strip_h = TITLE_SIZE.ceil() as u32 + 4;
    let mut strip = RgbaImage::from_pixel(strip_w, strip_h, Rgba([0, 0, 0, 0]));
    font.draw_rgba(&mut strip, 0, 1, Y_AXIS_TITLE, ink, TITLE_SIZE);
    let strip = imageops::rotate270(&strip);
    let area_middle = (MARGIN_TOP as i32 + (h - MARGIN_BOTTOM) as i32) / 2;
    alpha_overlay(
        img,
        &strip,
        1,
        (area_middle - strip.height() as i32 / 2) as i64,
    );
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steerviz_models::SteeringSeries;

    fn window(values: Vec<f64>, center: usize) -> PlotWindow {
        let human = SteeringSeries::new(values.clone(), 1.0).unwrap();
        let machine = SteeringSeries::new(values.iter().map(|v| v * 0.5).collect(), 1.0).unwrap();
        PlotWindow::around(&human, &machine, center, 150, 150, 30.0)
    }

    #[test]
    fn test_render_size_and_inverted_background() {
        let renderer = PlotRenderer::new((500, 220), (-5.0, 5.0));
        let img = renderer.render(&window(vec![1.0; 400], 200), None).unwrap();
        assert_eq!(img.dimensions(), (500, 220));
        // White margin becomes black after inversion.
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(499, 219), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_lines_are_drawn() {
        let renderer = PlotRenderer::new((500, 220), (-5.0, 5.0));
        let flat = renderer.render(&window(vec![0.0; 400], 200), None).unwrap();
        let steep = renderer
            .render(&window((0..400).map(|i| (i as f64 / 40.0) - 5.0).collect(), 200), None)
            .unwrap();
        assert_ne!(flat, steep);
    }

    #[test]
    fn test_labels_drawn_in_margins() {
        let renderer = PlotRenderer::new((500, 220), (-5.0, 5.0));
        let w = window(vec![1.0; 400], 200);
        let plain = renderer.render(&w, None).unwrap();
        let labelled = renderer.render(&w, Some(&TextRenderer::bitmap())).unwrap();
        assert_ne!(plain, labelled);

        // Inverted, so text shows up light on the black margins.
        let lit = |x0: u32, x1: u32, y0: u32, y1: u32| {
            (y0..y1).any(|y| (x0..x1).any(|x| labelled.get_pixel(x, y)[0] > 128))
        };
        assert!(lit(MARGIN_LEFT, 500, 220 - MARGIN_BOTTOM, 220), "x ticks or title");
        assert!(lit(0, 14, MARGIN_TOP, 220 - MARGIN_BOTTOM), "rotated y title");
        assert!(lit(14, MARGIN_LEFT, MARGIN_TOP, 220 - MARGIN_BOTTOM), "y ticks");
    }

    #[test]
    fn test_empty_window_renders() {
        let renderer = PlotRenderer::new((500, 220), (-1.0, 1.0));
        let empty = SteeringSeries::new(vec![], 1.0).unwrap();
        let w = PlotWindow::around(&empty, &empty, 0, 150, 150, 30.0);
        assert!(renderer.render(&w, None).is_ok());
    }

    #[test]
    fn test_too_small() {
        let renderer = PlotRenderer::new((20, 20), (-1.0, 1.0));
        assert!(matches!(
            renderer.render(&window(vec![0.0; 3], 0), None),
            Err(MediaError::Plot(_))
        ));
    }

    #[test]
    fn test_tick_helpers() {
        assert_eq!(x_ticks(-5.0, 5.0), vec![-4.0, -2.0, 0.0, 2.0, 4.0]);
        assert_eq!(y_ticks(-2.0, 2.0), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(format_tick(-4.0), "-4");
        assert_eq!(format_tick(2.5), "2.5");
    }
}
