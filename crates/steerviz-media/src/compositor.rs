//! Output frame assembly.
//!
//! The canvas is split into a top band showing the front camera and a lower
//! band holding, left to right: the dashboard camera, the two steering
//! wheels with their captions, and the plot. The stats panel is laid over
//! the left end of the lower band.

use image::{RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use steerviz_models::BlendWeights;

use crate::assets::OverlayAssets;
use crate::error::{MediaError, MediaResult};
use crate::overlay::{alpha_overlay, crop, fit_to, paste, resize_by_height, rotate_glyph, tint_by_disagreement};
use crate::source::FramePair;

/// Pixel placement of every element, for a 1280x720 canvas.
///
/// Offsets named `*_offset` are relative to `(dash_width, band_height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// First front-camera row copied into the top band
    pub primary_y0: u32,
    /// Height of the top band
    pub band_height: u32,
    /// Rows dropped from the top of the dashboard frame
    pub dash_crop_top: u32,
    /// Columns kept from the left of the dashboard frame
    pub dash_max_width: u32,
    pub plot_width: u32,
    pub human_wheel_offset: (i64, i64),
    pub machine_wheel_offset: (i64, i64),
    pub autopilot_offset: (i64, i64),
    pub learned_control_offset: (i64, i64),
    pub ground_truth_offset: (i64, i64),
    pub red_disagree_offset: (i64, i64),
    pub green_agree_offset: (i64, i64),
    /// Absolute position of the stats panel's top-left corner is
    /// `(0, band_height)`.
    pub panel_x: i64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            primary_y0: 80,
            band_height: 500,
            dash_crop_top: 100,
            dash_max_width: 930,
            plot_width: 500,
            human_wheel_offset: (60, 50),
            machine_wheel_offset: (260, 50),
            autopilot_offset: (83, 8),
            learned_control_offset: (256, 8),
            ground_truth_offset: (90, 205),
            red_disagree_offset: (230, 205),
            green_agree_offset: (345, 205),
            panel_x: 0,
        }
    }
}

/// Per-frame inputs besides the camera frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameOverlays<'a> {
    /// Already inverted plot raster
    pub plot: &'a RgbImage,
    pub panel: &'a RgbaImage,
    /// Human angle in degrees
    pub human_angle: f64,
    /// Machine angle in degrees
    pub machine_angle: f64,
    pub blend: BlendWeights,
}

/// Assembles output frames of one fixed size.
#[derive(Debug, Clone)]
pub struct Compositor {
    layout: Layout,
    width: u32,
    height: u32,
}

impl Compositor {
    /// Check that `layout` fits a `width`x`height` canvas.
    pub fn new(layout: Layout, (width, height): (u32, u32)) -> MediaResult<Self> {
        if height <= layout.band_height {
            return Err(MediaError::Layout(format!(
                "canvas height {height} leaves no room below the {} px camera band",
                layout.band_height
            )));
        }
        if width < layout.plot_width {
            return Err(MediaError::Layout(format!(
                "canvas width {width} is narrower than the {} px plot",
                layout.plot_width
            )));
        }
        Ok(Self {
            layout,
            width,
            height,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Height of the lower band, shared by the dashboard view and the plot.
    pub fn lower_band_height(&self) -> u32 {
        self.height - self.layout.band_height
    }

    /// Size the plot raster must have.
    pub fn plot_size(&self) -> (u32, u32) {
        (self.layout.plot_width, self.lower_band_height())
    }

    /// Build one output frame.
    pub fn compose(
        &self,
        frames: &FramePair,
        overlays: &FrameOverlays<'_>,
        assets: &OverlayAssets,
    ) -> RgbImage {
        let l = &self.layout;
        let band = l.band_height as i64;
        let mut canvas = RgbImage::new(self.width, self.height);

        let primary = fit_to(&frames.primary, (self.width, self.height));
        let top = crop(&primary, 0, l.primary_y0, self.width, l.band_height);
        paste(&mut canvas, &top, 0, 0);

        let dash_width = self.place_dash(&mut canvas, &frames.secondary);

        paste(
            &mut canvas,
            overlays.plot,
            self.width as i64 - overlays.plot.width() as i64,
            band,
        );

        let at = |(dx, dy): (i64, i64)| (dash_width + dx, band + dy);

        let human = rotate_glyph(&assets.wheel, overlays.human_angle);
        let (x, y) = at(l.human_wheel_offset);
        alpha_overlay(&mut canvas, &human, x, y);

        let machine = tint_by_disagreement(
            &rotate_glyph(&assets.wheel, overlays.machine_angle),
            overlays.blend,
        );
        let (x, y) = at(l.machine_wheel_offset);
        alpha_overlay(&mut canvas, &machine, x, y);

        let captions = &assets.captions;
        for (image, offset) in [
            (&captions.autopilot, l.autopilot_offset),
            (&captions.learned_control, l.learned_control_offset),
            (&captions.ground_truth, l.ground_truth_offset),
            (&captions.red_disagree, l.red_disagree_offset),
            (&captions.green_agree, l.green_agree_offset),
        ] {
            let (x, y) = at(offset);
            alpha_overlay(&mut canvas, image, x, y);
        }

        alpha_overlay(&mut canvas, overlays.panel, l.panel_x, band);
        canvas
    }

    /// Crop, scale and place the dashboard view; returns its width.
    fn place_dash(&self, canvas: &mut RgbImage, dash: &RgbImage) -> i64 {
        let l = &self.layout;
        let cropped = crop(
            dash,
            0,
            l.dash_crop_top,
            l.dash_max_width,
            dash.height().saturating_sub(l.dash_crop_top),
        );
        if cropped.width() == 0 || cropped.height() == 0 {
            return 0;
        }
        let scaled = resize_by_height(&cropped, self.lower_band_height());
        paste(canvas, &scaled, 0, l.band_height as i64);
        scaled.width().min(self.width) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Captions;
    use image::{Rgb, Rgba};

    fn blank_assets() -> OverlayAssets {
        let clear = RgbaImage::new(10, 10);
        OverlayAssets {
            wheel: RgbaImage::new(150, 150),
            captions: Captions {
                autopilot: clear.clone(),
                learned_control: clear.clone(),
                ground_truth: clear.clone(),
                red_disagree: clear.clone(),
                green_agree: clear.clone(),
                human_control: clear,
            },
        }
    }

    fn frames(primary: Rgb<u8>, dash: Rgb<u8>) -> FramePair {
        FramePair {
            primary: RgbImage::from_pixel(1280, 720, primary),
            secondary: RgbImage::from_pixel(1280, 720, dash),
        }
    }

    fn compose(
        compositor: &Compositor,
        pair: &FramePair,
        assets: &OverlayAssets,
        plot: &RgbImage,
        panel: &RgbaImage,
    ) -> RgbImage {
        let overlays = FrameOverlays {
            plot,
            panel,
            human_angle: 0.0,
            machine_angle: 0.0,
            blend: BlendWeights { r: 0.0, g: 1.0 },
        };
        compositor.compose(pair, &overlays, assets)
    }

    #[test]
    fn test_rejects_small_canvas() {
        assert!(matches!(
            Compositor::new(Layout::default(), (640, 360)),
            Err(MediaError::Layout(_))
        ));
    }

    #[test]
    fn test_band_placement() {
        let compositor = Compositor::new(Layout::default(), (1280, 720)).unwrap();
        assert_eq!(compositor.plot_size(), (500, 220));

        let plot = RgbImage::from_pixel(500, 220, Rgb([0, 0, 255]));
        let panel = RgbaImage::new(300, 200);
        let out = compose(
            &compositor,
            &frames(Rgb([255, 0, 0]), Rgb([0, 255, 0])),
            &blank_assets(),
            &plot,
            &panel,
        );

        assert_eq!(out.dimensions(), (1280, 720));
        assert_eq!(*out.get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(10, 499), Rgb([255, 0, 0]));
        // Dashboard: 930x620 crop scaled to 330x220.
        assert_eq!(*out.get_pixel(5, 600), Rgb([0, 255, 0]));
        assert_eq!(*out.get_pixel(325, 715), Rgb([0, 255, 0]));
        // Gap between dashboard and plot stays black.
        assert_eq!(*out.get_pixel(500, 700), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(1279, 719), Rgb([0, 0, 255]));
        assert_eq!(*out.get_pixel(780, 500), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_primary_resized_to_canvas() {
        let compositor = Compositor::new(Layout::default(), (1280, 720)).unwrap();
        let pair = FramePair {
            primary: RgbImage::from_pixel(640, 360, Rgb([9, 9, 9])),
            secondary: RgbImage::from_pixel(640, 360, Rgb([0, 0, 0])),
        };
        let plot = RgbImage::new(500, 220);
        let panel = RgbaImage::new(300, 200);
        let out = compose(&compositor, &pair, &blank_assets(), &plot, &panel);
        assert_eq!(*out.get_pixel(1200, 400), Rgb([9, 9, 9]));
    }

    #[test]
    fn test_wheels_and_panel_blend() {
        let compositor = Compositor::new(Layout::default(), (1280, 720)).unwrap();
        let mut assets = blank_assets();
        assets.wheel = RgbaImage::from_pixel(150, 150, Rgba([100, 100, 100, 255]));

        let plot = RgbImage::new(500, 220);
        let mut panel = RgbaImage::new(300, 200);
        panel.put_pixel(0, 0, Rgba([255, 255, 255, 255]));

        let out = compose(
            &compositor,
            &frames(Rgb([0, 0, 0]), Rgb([0, 0, 0])),
            &assets,
            &plot,
            &panel,
        );

        // Dash width is 330: human wheel spans x 390..540, machine 590..740.
        assert_eq!(*out.get_pixel(465, 625), Rgb([100, 100, 100]));
        assert_eq!(*out.get_pixel(665, 625), Rgb([100, 255, 100]));
        assert_eq!(*out.get_pixel(0, 500), Rgb([255, 255, 255]));
        assert_eq!(*out.get_pixel(1, 501), Rgb([0, 0, 0]));
    }
}
