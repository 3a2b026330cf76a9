//! # Emitter
//!
//! Serialises a `CompiledTileset` to the on-disk artifacts the game build
//! consumes: the tile sheet PNG, JASC palette files, the packed metatile
//! and attribute binaries, per-frame animation PNGs, and an informational
//! `tileset.json` summary.
//!
//! PNGs are written full-quality to a temp file, then palettised in place
//! with oxipng's bit depth reduction so the emitted sheets are indexed.

use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};
use serde::Serialize;

use crate::binary_utils::{write_u16_le, write_u32_le};
use crate::config::CompilerConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::errors::CompileError;
use crate::tileset::attributes::TargetBaseGame;
use crate::tileset::palette::{GbaPalette, PAL_SIZE};
use crate::tileset::tile::{GbaTile, TILE_DIM};
use crate::tileset::CompiledTileset;

pub const TILES_PER_ROW: usize = 16;
pub const SHEET_WIDTH: u32 = (TILES_PER_ROW * TILE_DIM) as u32;

/// Write every artifact under `output_dir`.
pub fn emit(
    config: &CompilerConfig,
    diags: &mut Diagnostics,
    compiled: &CompiledTileset,
    output_dir: &Path,
) -> Result<(), CompileError> {
    fs::create_dir_all(output_dir)?;
    fs::create_dir_all(output_dir.join("palettes"))?;

    emit_tiles_png(config, diags, compiled, &output_dir.join("tiles.png"))?;
    emit_palettes(compiled, &output_dir.join("palettes"))?;
    fs::write(
        output_dir.join("metatiles.bin"),
        metatiles_bytes(compiled),
    )?;
    fs::write(
        output_dir.join("metatile_attributes.bin"),
        attribute_bytes(config, compiled),
    )?;
    emit_anims(config, compiled, &output_dir.join("anims"))?;
    emit_metadata(config, compiled, &output_dir.join("tileset.json"))?;
    diags.check_phase("emit")?;
    Ok(())
}

fn render_tile(
    image: &mut RgbaImage,
    tile: &GbaTile,
    palette: Option<&GbaPalette>,
    base_x: u32,
    base_y: u32,
) {
    for row in 0..TILE_DIM {
        for col in 0..TILE_DIM {
            let index = tile.pixel(row, col);
            let rgba = match palette {
                // Greyscale debug palette: each index maps onto its own
                // grey step.
                None => {
                    let v = index * 16;
                    Rgba([v, v, v, 255])
                }
                Some(palette) => {
                    let colour = palette.colours[index as usize];
                    Rgba([colour.red8(), colour.green8(), colour.blue8(), 255])
                }
            };
            image.put_pixel(base_x + col as u32, base_y + row as u32, rgba);
        }
    }
}

fn emit_tiles_png(
    config: &CompilerConfig,
    diags: &mut Diagnostics,
    compiled: &CompiledTileset,
    path: &Path,
) -> Result<(), CompileError> {
    if config.true_colour {
        diags.warn(
            Warning::UsedTrueColorMode,
            "tiles.png uses the informational true-colour palette; the game ignores it",
        );
    }

    let rows = compiled.tiles.len().div_ceil(TILES_PER_ROW);
    let mut image = RgbaImage::new(SHEET_WIDTH, (rows.max(1) * TILE_DIM) as u32);
    for (i, tile) in compiled.tiles.iter().enumerate() {
        let palette = config
            .true_colour
            .then(|| &compiled.palettes[compiled.palette_indexes_of_tile[i] as usize]);
        render_tile(
            &mut image,
            tile,
            palette,
            ((i % TILES_PER_ROW) * TILE_DIM) as u32,
            ((i / TILES_PER_ROW) * TILE_DIM) as u32,
        );
    }
    save_indexed_png(&image, path)
}

/// Save through a temp file and palettise in place. A failed optimisation
/// keeps the unoptimised file rather than failing the build.
fn save_indexed_png(image: &RgbaImage, path: &Path) -> Result<(), CompileError> {
    let temp = path.with_extension("tmp.png");
    image.save(&temp)?;

    let mut options = oxipng::Options::from_preset(2);
    options.bit_depth_reduction = true;
    match oxipng::optimize(
        &oxipng::InFile::Path(temp.clone()),
        &oxipng::OutFile::Path {
            path: Some(path.to_path_buf()),
            preserve_attrs: false,
        },
        &options,
    ) {
        Ok(()) => {
            let _ = fs::remove_file(&temp);
        }
        Err(e) => {
            eprintln!(
                "warning: PNG optimisation failed for {}: {}. File saved unoptimised.",
                path.display(),
                e
            );
            fs::rename(&temp, path)?;
        }
    }
    Ok(())
}

/// JASC-PAL text, colours expanded back to 8-bit with the low 3 bits zero.
fn jasc_pal(palette: &GbaPalette) -> String {
    let mut text = String::from("JASC-PAL\n0100\n16\n");
    for colour in palette.colours.iter() {
        text.push_str(&format!(
            "{} {} {}\n",
            colour.red8(),
            colour.green8(),
            colour.blue8()
        ));
    }
    text
}

fn emit_palettes(compiled: &CompiledTileset, dir: &Path) -> Result<(), CompileError> {
    for (i, palette) in compiled.palettes.iter().enumerate() {
        fs::write(dir.join(format!("{:02}.pal", i)), jasc_pal(palette))?;
    }
    Ok(())
}

/// One u16 per subtile assignment, metatile-major.
fn metatiles_bytes(compiled: &CompiledTileset) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(compiled.assignments.len() * 2);
    for assignment in &compiled.assignments {
        write_u16_le(&mut bytes, assignment.to_u16());
    }
    bytes
}

/// One attribute record per metatile; width depends on the target.
fn attribute_bytes(config: &CompilerConfig, compiled: &CompiledTileset) -> Vec<u8> {
    let mut bytes = Vec::new();
    for attributes in &compiled.attributes {
        match config.base_game {
            TargetBaseGame::Emerald | TargetBaseGame::Ruby => {
                write_u16_le(&mut bytes, attributes.pack_ruby_emerald());
            }
            TargetBaseGame::Firered => {
                write_u32_le(&mut bytes, attributes.pack_firered());
            }
        }
    }
    bytes
}

fn emit_anims(
    config: &CompilerConfig,
    compiled: &CompiledTileset,
    anims_dir: &Path,
) -> Result<(), CompileError> {
    for anim in &compiled.anims {
        let dir = anims_dir.join(&anim.name);
        fs::create_dir_all(&dir)?;
        for frame in &anim.frames {
            let mut image = RgbaImage::new(
                (frame.width_tiles * TILE_DIM) as u32,
                (frame.height_tiles * TILE_DIM) as u32,
            );
            for (slot, tile) in frame.tiles.iter().enumerate() {
                let palette = config
                    .true_colour
                    .then(|| &compiled.palettes[anim.slot_palettes[slot] as usize]);
                render_tile(
                    &mut image,
                    tile,
                    palette,
                    ((slot % frame.width_tiles) * TILE_DIM) as u32,
                    ((slot / frame.width_tiles) * TILE_DIM) as u32,
                );
            }
            save_indexed_png(&image, &dir.join(format!("{}.png", frame.name)))?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct TilesetMetadata {
    mode: String,
    base_game: String,
    tile_count: usize,
    palette_count: usize,
    metatile_count: usize,
    palettes: Vec<Vec<[u8; 3]>>,
    animations: Vec<AnimationMetadata>,
}

#[derive(Serialize)]
struct AnimationMetadata {
    name: String,
    start_tile: u16,
    frame_count: usize,
}

fn emit_metadata(
    config: &CompilerConfig,
    compiled: &CompiledTileset,
    path: &Path,
) -> Result<(), CompileError> {
    let metadata = TilesetMetadata {
        mode: config.mode.to_string(),
        base_game: config.base_game.to_string(),
        tile_count: compiled.tiles.len(),
        palette_count: compiled.palettes.len(),
        metatile_count: compiled.attributes.len(),
        palettes: compiled
            .palettes
            .iter()
            .map(|palette| {
                (0..PAL_SIZE)
                    .map(|i| {
                        let c = palette.colours[i];
                        [c.red8(), c.green8(), c.blue8()]
                    })
                    .collect()
            })
            .collect(),
        animations: compiled
            .anims
            .iter()
            .map(|anim| AnimationMetadata {
                name: anim.name.clone(),
                start_tile: anim.start_tile,
                frame_count: anim.frames.len(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&metadata)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::colour::Bgr15;
    use crate::tileset::Assignment;

    #[test]
    fn jasc_pal_expands_channels() {
        let mut palette = GbaPalette::default();
        palette.colours[0] = Bgr15::from_rgba(crate::tileset::colour::RGBA_MAGENTA);
        palette.colours[1] = Bgr15::from_rgba(crate::tileset::colour::RGBA_WHITE);
        palette.size = 2;

        let text = jasc_pal(&palette);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "JASC-PAL");
        assert_eq!(lines[1], "0100");
        assert_eq!(lines[2], "16");
        assert_eq!(lines[3], "248 0 248");
        assert_eq!(lines[4], "248 248 248");
        assert_eq!(lines.len(), 3 + 16);
    }

    #[test]
    fn metatile_records_pack_little_endian() {
        let mut compiled = CompiledTileset::default();
        compiled.assignments.push(Assignment {
            tile_index: 1,
            palette_index: 2,
            h_flip: true,
            v_flip: false,
        });
        let bytes = metatiles_bytes(&compiled);
        assert_eq!(bytes.len(), 2);
        let value = u16::from_le_bytes([bytes[0], bytes[1]]);
        assert_eq!(value & 0x3FF, 1);
        assert_eq!(value & 0x400, 0x400);
        assert_eq!(value >> 12, 2);
    }

    #[test]
    fn attribute_record_width_tracks_the_target() {
        use crate::config::CompilerMode;
        use crate::tileset::attributes::Attributes;

        let mut compiled = CompiledTileset::default();
        compiled
            .attributes
            .push(Attributes::defaults_for(TargetBaseGame::Emerald));

        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        assert_eq!(attribute_bytes(&config, &compiled).len(), 2);

        let mut compiled = CompiledTileset::default();
        compiled
            .attributes
            .push(Attributes::defaults_for(TargetBaseGame::Firered));
        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Firered);
        assert_eq!(attribute_bytes(&config, &compiled).len(), 4);
    }
}
