//! Startup check for a render host.
//!
//! Verifies the configured directories, the ffmpeg tools, the overlay assets
//! and which face panel text will be drawn with, then exits non-zero on the
//! first problem.

use std::path::Path;

use steerviz_media::{check_ffmpeg, check_ffprobe, OverlayAssets, TextRenderer};
use steerviz_worker::VisualizeConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = VisualizeConfig::from_env()?;

    println!(
        "steerviz-selfcheck: data_dir={} out_dir={} assets_dir={}",
        config.data_dir.display(),
        config.out_dir.display(),
        config.assets_dir.display()
    );
    ensure_dir(&config.data_dir)?;
    ensure_out_dir(&config.out_dir)?;
    ensure_tools()?;

    OverlayAssets::load(&config.assets_dir)
        .map_err(|e| anyhow::anyhow!("overlay assets not usable: {}", e))?;
    let font = TextRenderer::resolve(config.font_path.as_deref())?;
    println!("steerviz-selfcheck: text face={}", font.face_name());

    println!("steerviz-selfcheck: ok");
    Ok(())
}

fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.is_dir() {
        return Err(anyhow::anyhow!("missing directory {}", path.display()));
    }
    Ok(())
}

fn ensure_out_dir(path: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

fn ensure_tools() -> anyhow::Result<()> {
    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!(
        "steerviz-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );
    Ok(())
}
