//! Raster primitives used by the compositor.
//!
//! All placement functions accept signed offsets and clip to the canvas;
//! pixels outside the source footprint are never touched.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use steerviz_models::BlendWeights;

/// Blend `overlay` onto `base` with its top-left corner at `(x, y)`.
///
/// Each covered pixel becomes `src * a + dst * (1 - a)`.
pub fn alpha_overlay(base: &mut RgbImage, overlay: &RgbaImage, x: i64, y: i64) {
    let (bw, bh) = (base.width() as i64, base.height() as i64);
    for (ox, oy, src) in overlay.enumerate_pixels() {
        let tx = x + ox as i64;
        let ty = y + oy as i64;
        if tx < 0 || ty < 0 || tx >= bw || ty >= bh {
            continue;
        }
        let a = src[3] as f32 / 255.0;
        if a <= 0.0 {
            continue;
        }
        let dst = base.get_pixel_mut(tx as u32, ty as u32);
        for c in 0..3 {
            dst[c] = (src[c] as f32 * a + dst[c] as f32 * (1.0 - a)).round() as u8;
        }
    }
}

/// Copy an opaque raster onto `base`, clipped.
pub fn paste(base: &mut RgbImage, src: &RgbImage, x: i64, y: i64) {
    let (bw, bh) = (base.width() as i64, base.height() as i64);
    for (sx, sy, pixel) in src.enumerate_pixels() {
        let tx = x + sx as i64;
        let ty = y + sy as i64;
        if tx >= 0 && ty >= 0 && tx < bw && ty < bh {
            base.put_pixel(tx as u32, ty as u32, *pixel);
        }
    }
}

/// Sub-image clamped to the source bounds.
pub fn crop(src: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
    let x = x.min(src.width());
    let y = y.min(src.height());
    let width = width.min(src.width() - x);
    let height = height.min(src.height() - y);
    imageops::crop_imm(src, x, y, width, height).to_image()
}

/// Resize to `height`, keeping the aspect ratio.
pub fn resize_by_height(src: &RgbImage, height: u32) -> RgbImage {
    if src.height() == 0 || src.width() == 0 || height == 0 {
        return RgbImage::new(0, 0);
    }
    let width = ((src.width() as f64 * height as f64 / src.height() as f64).round() as u32).max(1);
    if (width, height) == src.dimensions() {
        return src.clone();
    }
    imageops::resize(src, width, height, FilterType::Triangle)
}

/// Resize to exactly `(width, height)` unless it already matches.
pub fn fit_to(src: &RgbImage, (width, height): (u32, u32)) -> RgbImage {
    if src.dimensions() == (width, height) {
        return src.clone();
    }
    imageops::resize(src, width, height, FilterType::Triangle)
}

/// Rotate a glyph about its center, counter-clockwise for positive degrees.
///
/// The output keeps the input size; uncovered corners are transparent.
pub fn rotate_glyph(src: &RgbaImage, degrees: f64) -> RgbaImage {
    if degrees == 0.0 {
        return src.clone();
    }
    // Image rows grow downward, so a positive angle turns clockwise on screen.
    let theta = -(degrees.to_radians() as f32);
    rotate_about_center(src, theta, Interpolation::Bilinear, Rgba([0, 0, 0, 0]))
}

/// Recolor the machine wheel between green (agree) and red (disagree).
///
/// Equivalent to `r * red_copy + g * green_copy`, where the red copy has its
/// R channel forced to 255 and the green copy its G channel.
pub fn tint_by_disagreement(src: &RgbaImage, weights: BlendWeights) -> RgbaImage {
    let r = weights.r as f32;
    let g = weights.g as f32;
    let mut out = src.clone();
    for pixel in out.pixels_mut() {
        let [pr, pg, pb, pa] = pixel.0;
        let mix = |red: f32, green: f32| (red * r + green * g).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([
            mix(255.0, pr as f32),
            mix(pg as f32, 255.0),
            mix(pb as f32, pb as f32),
            mix(pa as f32, pa as f32),
        ]);
    }
    out
}

/// A solid opaque raster.
pub fn solid(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_opaque_and_transparent() {
        let mut base = solid(4, 4, Rgb([10, 10, 10]));
        let mut overlay = RgbaImage::from_pixel(2, 1, Rgba([200, 100, 50, 255]));
        overlay.put_pixel(1, 0, Rgba([255, 255, 255, 0]));

        alpha_overlay(&mut base, &overlay, 1, 1);
        assert_eq!(*base.get_pixel(1, 1), Rgb([200, 100, 50]));
        assert_eq!(*base.get_pixel(2, 1), Rgb([10, 10, 10]));
        assert_eq!(*base.get_pixel(0, 0), Rgb([10, 10, 10]));
    }

    #[test]
    fn test_overlay_half_alpha() {
        let mut base = solid(1, 1, Rgb([0, 0, 0]));
        let overlay = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128]));
        alpha_overlay(&mut base, &overlay, 0, 0);
        let p = base.get_pixel(0, 0);
        assert_eq!(p[0], 100);
        assert_eq!(p[1], 50);
    }

    #[test]
    fn test_overlay_clips_negative_and_overflow() {
        let mut base = solid(3, 3, Rgb([0, 0, 0]));
        let overlay = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        alpha_overlay(&mut base, &overlay, -2, 2);
        assert_eq!(*base.get_pixel(0, 2), Rgb([255, 255, 255]));
        assert_eq!(*base.get_pixel(1, 2), Rgb([0, 0, 0]));
        assert_eq!(*base.get_pixel(0, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_crop_is_clamped() {
        let src = solid(10, 8, Rgb([1, 2, 3]));
        assert_eq!(crop(&src, 0, 3, 930, 100).dimensions(), (10, 5));
        assert_eq!(crop(&src, 20, 20, 5, 5).dimensions(), (0, 0));
    }

    #[test]
    fn test_resize_by_height_keeps_aspect() {
        let src = solid(930, 620, Rgb([0, 0, 0]));
        assert_eq!(resize_by_height(&src, 220).dimensions(), (330, 220));
    }

    #[test]
    fn test_rotation_keeps_size() {
        let wheel = RgbaImage::from_pixel(150, 150, Rgba([255, 255, 255, 255]));
        let rotated = rotate_glyph(&wheel, 45.0);
        assert_eq!(rotated.dimensions(), (150, 150));
        assert_eq!(rotated.get_pixel(0, 0)[3], 0);
        assert_eq!(rotated.get_pixel(75, 75)[3], 255);
    }

    #[test]
    fn test_rotation_direction() {
        // A marker right of center moves up for a positive angle.
        let mut glyph = RgbaImage::new(21, 21);
        glyph.put_pixel(18, 10, Rgba([255, 0, 0, 255]));
        let rotated = rotate_glyph(&glyph, 90.0);
        let covered: Vec<(u32, u32)> = rotated
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!covered.is_empty());
        assert!(covered.iter().all(|&(x, y)| y < 7 && (8..=12).contains(&x)));
    }

    #[test]
    fn test_tint_extremes() {
        let glyph = RgbaImage::from_pixel(1, 1, Rgba([40, 60, 80, 200]));
        let green = tint_by_disagreement(&glyph, BlendWeights { r: 0.0, g: 1.0 });
        assert_eq!(*green.get_pixel(0, 0), Rgba([40, 255, 80, 200]));
        let red = tint_by_disagreement(&glyph, BlendWeights { r: 1.0, g: 0.0 });
        assert_eq!(*red.get_pixel(0, 0), Rgba([255, 60, 80, 200]));
    }
}
