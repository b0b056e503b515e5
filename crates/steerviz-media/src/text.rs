//! Text drawing onto RGB and RGBA rasters.
//!
//! A configured TTF/OTF file wins; otherwise the usual system font
//! locations are searched, and the built-in bitmap face is the last resort,
//! so a renderer always draws something.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::path::Path;
use tracing::{debug, info};

use crate::bitmap_font;
use crate::error::{MediaError, MediaResult};

/// Searched in order when no font is configured.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

enum Face {
    TrueType(Font<'static>),
    Bitmap,
}

/// Draws single lines of text with one face.
pub struct TextRenderer {
    face: Face,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("face", &self.face_name())
            .finish()
    }
}

impl TextRenderer {
    /// Load a TTF/OTF file.
    pub fn load(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        let renderer =
            Self::from_bytes(data).ok_or_else(|| MediaError::InvalidFont(path.to_path_buf()))?;
        info!(path = %path.display(), "Loaded font");
        Ok(renderer)
    }

    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(data).map(|font| Self {
            face: Face::TrueType(font),
        })
    }

    /// The built-in 5x7 face.
    pub fn bitmap() -> Self {
        Self { face: Face::Bitmap }
    }

    /// First readable font among [`SYSTEM_FONT_PATHS`].
    pub fn system() -> Option<Self> {
        SYSTEM_FONT_PATHS.iter().find_map(|candidate| {
            let path = Path::new(candidate);
            if !path.is_file() {
                return None;
            }
            match Self::load(path) {
                Ok(renderer) => Some(renderer),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping system font");
                    None
                }
            }
        })
    }

    /// The configured font, else a system font, else the bitmap face.
    /// Only a configured path that cannot be loaded is an error.
    pub fn resolve(configured: Option<&Path>) -> MediaResult<Self> {
        if let Some(path) = configured {
            return Self::load(path);
        }
        Ok(Self::system().unwrap_or_else(|| {
            info!("No TrueType font found, using the built-in bitmap face");
            Self::bitmap()
        }))
    }

    pub fn is_truetype(&self) -> bool {
        matches!(self.face, Face::TrueType(_))
    }

    pub fn face_name(&self) -> &'static str {
        match self.face {
            Face::TrueType(_) => "truetype",
            Face::Bitmap => "bitmap",
        }
    }

    /// Advance width of `text` in pixels.
    pub fn text_width(&self, text: &str, size: f32) -> u32 {
        let font = match &self.face {
            Face::TrueType(font) => font,
            Face::Bitmap => return bitmap_font::text_width(text, size),
        };
        font.layout(text, Scale::uniform(size), point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
            .ceil()
            .max(0.0) as u32
    }

    /// Visit every covered pixel of `text` whose top-left corner is `(x, y)`.
    fn for_each_pixel(&self, x: i32, y: i32, text: &str, size: f32, mut f: impl FnMut(i32, i32, f32)) {
        let font = match &self.face {
            Face::TrueType(font) => font,
            Face::Bitmap => {
                bitmap_font::for_each_pixel(x, y, text, size, |px, py| f(px, py, 1.0));
                return;
            }
        };

        let scale = Scale::uniform(size);
        let ascent = font.v_metrics(scale).ascent;
        for glyph in font.layout(text, scale, point(x as f32, y as f32 + ascent)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    f(bb.min.x + gx as i32, bb.min.y + gy as i32, coverage);
                });
            }
        }
    }

    /// Draw onto a transparent layer; glyph coverage becomes alpha.
    pub fn draw_rgba(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgb<u8>, size: f32) {
        let (w, h) = canvas.dimensions();
        self.for_each_pixel(x, y, text, size, |px, py, coverage| {
            if px < 0 || py < 0 || px as u32 >= w || py as u32 >= h {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            if alpha > pixel[3] {
                *pixel = Rgba([color[0], color[1], color[2], alpha]);
            }
        });
    }

    /// Blend onto an opaque raster.
    pub fn draw_rgb(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>, size: f32) {
        let (w, h) = canvas.dimensions();
        self.for_each_pixel(x, y, text, size, |px, py, coverage| {
            if px < 0 || py < 0 || px as u32 >= w || py as u32 >= h {
                return;
            }
            let a = coverage.clamp(0.0, 1.0);
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            for c in 0..3 {
                pixel[c] = (color[c] as f32 * a + pixel[c] as f32 * (1.0 - a)).round() as u8;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn installed_font() -> Option<&'static str> {
        SYSTEM_FONT_PATHS.iter().copied().find(|p| Path::new(p).is_file())
    }

    #[test]
    fn test_missing_font() {
        let err = TextRenderer::load("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn test_garbage_is_invalid_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = TextRenderer::load(&path).unwrap_err();
        assert!(matches!(err, MediaError::InvalidFont(_)));
    }

    #[test]
    fn test_configured_path_must_load() {
        assert!(TextRenderer::resolve(Some(Path::new("/nonexistent/font.ttf"))).is_err());
    }

    #[test]
    fn test_resolve_without_config_always_draws() {
        let renderer = TextRenderer::resolve(None).unwrap();
        if installed_font().is_none() {
            assert_eq!(renderer.face_name(), "bitmap");
        }

        let mut canvas = RgbaImage::new(120, 30);
        renderer.draw_rgba(&mut canvas, 2, 2, "Frame #1", WHITE, 11.0);
        assert!(canvas.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_bitmap_draws_within_measured_width() {
        let renderer = TextRenderer::bitmap();
        let width = renderer.text_width("Error: 2.000", 11.0);
        assert!(width > 0);

        let mut canvas = RgbImage::new(200, 20);
        renderer.draw_rgb(&mut canvas, 10, 5, "Error: 2.000", WHITE, 11.0);
        let lit: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(x, y)| x >= 10 && x < 10 + width && (5..12).contains(&y)));
    }

    #[test]
    fn test_draw_clips_to_canvas() {
        let mut canvas = RgbaImage::new(8, 8);
        TextRenderer::bitmap().draw_rgba(&mut canvas, -3, -3, "WW", WHITE, 11.0);
        assert!(canvas.pixels().any(|p| p[3] == 255));
    }

    #[test]
    fn test_truetype_draws_when_installed() {
        let Some(path) = installed_font() else {
            return;
        };
        let renderer = TextRenderer::load(path).unwrap();
        assert!(renderer.text_width("Angles:", 11.0) > 0);

        let mut canvas = RgbaImage::new(100, 20);
        renderer.draw_rgba(&mut canvas, 0, 0, "Angles:", WHITE, 11.0);
        assert!(canvas.pixels().any(|p| p[3] > 128));
    }
}
