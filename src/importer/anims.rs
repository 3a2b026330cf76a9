//! Imports animation directories. Each `anims/<name>/` holds the
//! artist-facing `key.png` plus numbered frames (`00.png`, `01.png`, …)
//! of identical dimensions. Frames are cut into 8×8 tiles left-to-right,
//! top-to-bottom.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::diagnostics::Diagnostics;
use crate::errors::CompileError;
use crate::tileset::tile::{TileSource, TILE_DIM};
use crate::tileset::{AnimFrame, DecompiledAnimation};

use super::cut_tile;

/// Cut one frame image into tiles. Returns `None` (after reporting) when
/// the dimensions do not divide into tiles.
fn import_frame(
    diags: &mut Diagnostics,
    anim_name: &str,
    frame_name: &str,
    image: &RgbaImage,
) -> Option<AnimFrame> {
    if image.width() == 0
        || image.height() == 0
        || image.width() % TILE_DIM as u32 != 0
        || image.height() % TILE_DIM as u32 != 0
    {
        diags.user_error(&format!(
            "animation '{}', frame '{}': dimensions {}x{} do not divide into 8x8 tiles",
            anim_name,
            frame_name,
            image.width(),
            image.height()
        ));
        return None;
    }

    let width_tiles = image.width() as usize / TILE_DIM;
    let height_tiles = image.height() as usize / TILE_DIM;
    let mut tiles = Vec::with_capacity(width_tiles * height_tiles);
    for ty in 0..height_tiles {
        for tx in 0..width_tiles {
            let source = TileSource::Anim {
                anim: anim_name.to_string(),
                frame: frame_name.to_string(),
                index: ty * width_tiles + tx,
            };
            tiles.push(cut_tile(
                image,
                (tx * TILE_DIM) as u32,
                (ty * TILE_DIM) as u32,
                source,
            ));
        }
    }

    Some(AnimFrame {
        name: frame_name.to_string(),
        tiles,
        width_tiles,
        height_tiles,
    })
}

fn load_rgba(path: &Path) -> Result<RgbaImage, CompileError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Numbered frame files in a directory, sorted by their numeric value.
fn numbered_frames(dir: &Path) -> Result<Vec<(u32, PathBuf)>, CompileError> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |e| e == "png") {
            if let Some(number) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            {
                frames.push((number, path));
            }
        }
    }
    frames.sort_by_key(|&(number, _)| number);
    Ok(frames)
}

/// Import every animation under `anims_dir`, sorted by name so slot
/// reservation order is stable. A missing directory simply means no
/// animations.
pub fn import_animations(
    diags: &mut Diagnostics,
    anims_dir: &Path,
) -> Result<Vec<DecompiledAnimation>, CompileError> {
    if !anims_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut anim_dirs: Vec<PathBuf> = std::fs::read_dir(anims_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    anim_dirs.sort();

    let mut anims = Vec::with_capacity(anim_dirs.len());
    for dir in anim_dirs {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let key_path = dir.join("key.png");
        if !key_path.is_file() {
            diags.user_error(&format!("animation '{}': missing key.png", name));
            continue;
        }
        let key_image = load_rgba(&key_path)?;
        let Some(key) = import_frame(diags, &name, "key", &key_image) else {
            continue;
        };

        let frame_paths = numbered_frames(&dir)?;
        if frame_paths.is_empty() {
            diags.user_error(&format!("animation '{}': no numbered frames", name));
            continue;
        }

        let mut frames = Vec::with_capacity(frame_paths.len());
        for (_, path) in &frame_paths {
            let frame_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let image = load_rgba(path)?;
            if image.dimensions() != key_image.dimensions() {
                diags.user_error(&format!(
                    "animation '{}', frame '{}': dimensions {}x{} differ from key.png",
                    name,
                    frame_name,
                    image.width(),
                    image.height()
                ));
                continue;
            }
            if let Some(frame) = import_frame(diags, &name, &frame_name, &image) {
                frames.push(frame);
            }
        }
        if frames.len() != frame_paths.len() {
            // Individual frame errors were already reported.
            continue;
        }

        anims.push(DecompiledAnimation { name, key, frames });
    }

    diags.check_phase("animation import")?;
    Ok(anims)
}
