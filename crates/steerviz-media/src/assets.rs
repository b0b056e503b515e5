//! Static overlay images loaded once per run.

use image::RgbaImage;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

pub const WHEEL_FILE: &str = "wheel-tesla-image-150.png";
pub const GREEN_AGREE_FILE: &str = "text-green-agree.png";
pub const GROUND_TRUTH_FILE: &str = "text-ground-truth.png";
pub const LEARNED_CONTROL_FILE: &str = "text-learned-control.png";
pub const RED_DISAGREE_FILE: &str = "text-red-disagree.png";
pub const AUTOPILOT_FILE: &str = "text-tesla-control-autopilot.png";
pub const HUMAN_CONTROL_FILE: &str = "text-tesla-control-human.png";

/// Caption images with alpha.
#[derive(Debug, Clone)]
pub struct Captions {
    pub autopilot: RgbaImage,
    pub learned_control: RgbaImage,
    pub ground_truth: RgbaImage,
    pub red_disagree: RgbaImage,
    pub green_agree: RgbaImage,
    /// Loaded with the rest of the set but not placed in the layout.
    pub human_control: RgbaImage,
}

/// Steering wheel glyph plus captions.
#[derive(Debug, Clone)]
pub struct OverlayAssets {
    pub wheel: RgbaImage,
    pub captions: Captions,
}

impl OverlayAssets {
    /// Load every asset from `dir`. Any missing file is fatal.
    pub fn load(dir: impl AsRef<Path>) -> MediaResult<Self> {
        let dir = dir.as_ref();
        let assets = Self {
            wheel: load_rgba(&dir.join(WHEEL_FILE))?,
            captions: Captions {
                autopilot: load_rgba(&dir.join(AUTOPILOT_FILE))?,
                learned_control: load_rgba(&dir.join(LEARNED_CONTROL_FILE))?,
                ground_truth: load_rgba(&dir.join(GROUND_TRUTH_FILE))?,
                red_disagree: load_rgba(&dir.join(RED_DISAGREE_FILE))?,
                green_agree: load_rgba(&dir.join(GREEN_AGREE_FILE))?,
                human_control: load_rgba(&dir.join(HUMAN_CONTROL_FILE))?,
            },
        };
        info!(
            dir = %dir.display(),
            wheel_width = assets.wheel.width(),
            wheel_height = assets.wheel.height(),
            "Loaded overlay assets"
        );
        Ok(assets)
    }
}

fn load_rgba(path: &Path) -> MediaResult<RgbaImage> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let image = image::open(path)?.to_rgba8();
    debug!(path = %path.display(), "Loaded asset");
    Ok(image)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    /// Write a full asset set into `dir`.
    pub(crate) fn write_assets(dir: &Path) {
        RgbaImage::from_pixel(150, 150, Rgba([200, 200, 200, 255]))
            .save(dir.join(WHEEL_FILE))
            .unwrap();
        for name in [
            GREEN_AGREE_FILE,
            GROUND_TRUTH_FILE,
            LEARNED_CONTROL_FILE,
            RED_DISAGREE_FILE,
            AUTOPILOT_FILE,
            HUMAN_CONTROL_FILE,
        ] {
            RgbaImage::from_pixel(40, 10, Rgba([255, 255, 255, 128]))
                .save(dir.join(name))
                .unwrap();
        }
    }

    #[test]
    fn test_load_full_set() {
        let dir = tempfile::tempdir().unwrap();
        write_assets(dir.path());
        let assets = OverlayAssets::load(dir.path()).unwrap();
        assert_eq!(assets.wheel.dimensions(), (150, 150));
        assert_eq!(assets.captions.green_agree.get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_assets(dir.path());
        std::fs::remove_file(dir.path().join(RED_DISAGREE_FILE)).unwrap();
        let err = OverlayAssets::load(dir.path()).unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(p) if p.ends_with(RED_DISAGREE_FILE)));
    }
}
