//! Per-frame statistics panel.

use image::{Rgb, RgbaImage};
use serde::Serialize;

use crate::text::TextRenderer;

pub const PANEL_WIDTH: u32 = 300;
pub const PANEL_HEIGHT: u32 = 200;
/// Glyph height; lines are 10 px apart.
pub const PANEL_TEXT_SIZE: f32 = 11.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Values shown for one frame. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelText {
    pub frame_index: usize,
    /// Model forward pass time, when the predictions recorded it
    pub forward_pass_ms: Option<f64>,
    pub actual: f64,
    pub predicted: f64,
    pub error: f64,
    pub avg: f64,
    pub stddev: f64,
}

/// One positioned line of panel text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelLine {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

impl PanelLine {
    fn new(x: i32, y: i32, text: String) -> Self {
        Self { x, y, text }
    }
}

impl PanelText {
    /// The panel's text, in drawing order.
    pub fn lines(&self) -> Vec<PanelLine> {
        let timing = match self.forward_pass_ms {
            Some(ms) => format!("{} ms", ms.trunc() as i64),
            None => "n/a".to_string(),
        };
        vec![
            PanelLine::new(10, 10, format!("Frame #{}", self.frame_index)),
            PanelLine::new(150, 10, format!("Time to get angle: {timing}")),
            PanelLine::new(10, 30, "Angles:".to_string()),
            PanelLine::new(10, 40, format!("Actual: {:.3}", self.actual)),
            PanelLine::new(150, 40, format!("Predicted: {:.3}", self.predicted)),
            PanelLine::new(10, 60, format!("Error: {:.3}", self.error)),
            PanelLine::new(150, 60, format!("Average error: {:.3}", self.avg)),
            PanelLine::new(10, 70, format!("Standard Deviation: {:.3}", self.stddev)),
        ]
    }
}

/// Draw the panel on a transparent canvas.
pub fn render_panel(text: &PanelText, font: &TextRenderer) -> RgbaImage {
    let mut canvas = RgbaImage::new(PANEL_WIDTH, PANEL_HEIGHT);
    for line in text.lines() {
        font.draw_rgba(&mut canvas, line.x, line.y, &line.text, TEXT_COLOR, PANEL_TEXT_SIZE);
    }
    canvas
}
