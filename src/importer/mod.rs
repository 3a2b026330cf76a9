//! # Importer
//!
//! Turns the three layer sheets (plus optional attributes and animations)
//! into a flat `DecompiledTileset`. Each metatile's subtiles are emitted in
//! the pack order its layer type dictates; in dual-layer mode the layer
//! type is inferred from which layers actually carry content.

pub mod anims;
pub mod attributes_csv;
pub mod behaviors;

use std::collections::HashMap;
use std::path::Path;

use image::RgbaImage;

use crate::config::CompilerConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::errors::CompileError;
use crate::tileset::attributes::{Attributes, LayerType};
use crate::tileset::colour::Rgba32;
use crate::tileset::tile::{Corner, Layer, RgbaTile, TileSource, CORNERS, TILE_DIM};
use crate::tileset::{DecompiledAnimation, DecompiledTileset};

use self::behaviors::BehaviourMap;

pub const LAYER_SHEET_WIDTH: u32 = 128;
pub const METATILE_DIM: usize = 16;
pub const METATILES_PER_ROW: usize = LAYER_SHEET_WIDTH as usize / METATILE_DIM;

fn to_rgba32(pixel: &image::Rgba<u8>) -> Rgba32 {
    Rgba32 {
        red: pixel.0[0],
        green: pixel.0[1],
        blue: pixel.0[2],
        alpha: pixel.0[3],
    }
}

/// Cut an 8×8 tile out of an image at pixel position `(x, y)`.
pub(crate) fn cut_tile(image: &RgbaImage, x: u32, y: u32, source: TileSource) -> RgbaTile {
    let mut tile = RgbaTile::new(source);
    for row in 0..TILE_DIM {
        for col in 0..TILE_DIM {
            let pixel = image.get_pixel(x + col as u32, y + row as u32);
            tile.set_pixel(row, col, to_rgba32(pixel));
        }
    }
    tile
}

fn corner_offset(corner: Corner) -> (u32, u32) {
    match corner {
        Corner::NorthWest => (0, 0),
        Corner::NorthEast => (TILE_DIM as u32, 0),
        Corner::SouthWest => (0, TILE_DIM as u32),
        Corner::SouthEast => (TILE_DIM as u32, TILE_DIM as u32),
    }
}

fn validate_layer(diags: &mut Diagnostics, name: &str, image: &RgbaImage) {
    if image.width() != LAYER_SHEET_WIDTH {
        diags.user_error(&format!(
            "{} layer: width must be {} pixels, found {}",
            name,
            LAYER_SHEET_WIDTH,
            image.width()
        ));
    }
    if image.height() == 0 || image.height() % METATILE_DIM as u32 != 0 {
        diags.user_error(&format!(
            "{} layer: height must be a positive multiple of {}, found {}",
            name,
            METATILE_DIM,
            image.height()
        ));
    }
}

/// The four subtiles of one metatile on one layer, in NW, NE, SW, SE order.
fn cut_metatile_layer(
    image: &RgbaImage,
    layer: Layer,
    metatile: usize,
) -> [RgbaTile; 4] {
    let base_x = (metatile % METATILES_PER_ROW * METATILE_DIM) as u32;
    let base_y = (metatile / METATILES_PER_ROW * METATILE_DIM) as u32;
    CORNERS.map(|corner| {
        let (dx, dy) = corner_offset(corner);
        cut_tile(
            image,
            base_x + dx,
            base_y + dy,
            TileSource::Layered {
                layer,
                metatile,
                corner,
            },
        )
    })
}

/// Map the OR'd per-layer content bits onto a layer type. `None` marks the
/// illegal all-three-layers case.
fn infer_layer_type(bottom: bool, middle: bool, top: bool) -> Option<LayerType> {
    match (bottom, middle, top) {
        (true, true, true) => None,
        (true, false, false) | (true, true, false) => Some(LayerType::Covered),
        (true, false, true) => Some(LayerType::Split),
        _ => Some(LayerType::Normal),
    }
}

/// Import the three layer sheets into a decompiled tileset. Attribute rows
/// and animations come pre-parsed; rows referencing metatiles past the end
/// of the sheets raise `unused-attribute`.
pub fn import_layered(
    config: &CompilerConfig,
    diags: &mut Diagnostics,
    bottom: &RgbaImage,
    middle: &RgbaImage,
    top: &RgbaImage,
    attribute_rows: &HashMap<usize, Attributes>,
    anims: Vec<DecompiledAnimation>,
) -> Result<DecompiledTileset, CompileError> {
    validate_layer(diags, "bottom", bottom);
    validate_layer(diags, "middle", middle);
    validate_layer(diags, "top", top);
    if bottom.height() != middle.height() || bottom.height() != top.height() {
        diags.user_error(&format!(
            "layer heights differ: bottom {}, middle {}, top {}",
            bottom.height(),
            middle.height(),
            top.height()
        ));
    }
    diags.check_phase("layer import")?;

    let metatile_count = (bottom.height() as usize / METATILE_DIM) * METATILES_PER_ROW;
    let mut tileset = DecompiledTileset {
        anims,
        ..Default::default()
    };

    for metatile in 0..metatile_count {
        let bottom_tiles = cut_metatile_layer(bottom, Layer::Bottom, metatile);
        let middle_tiles = cut_metatile_layer(middle, Layer::Middle, metatile);
        let top_tiles = cut_metatile_layer(top, Layer::Top, metatile);

        let layer_type = if config.triple_layer {
            LayerType::Triple
        } else {
            let has = |tiles: &[RgbaTile; 4]| {
                tiles
                    .iter()
                    .any(|t| t.has_content(config.transparency_colour))
            };
            match infer_layer_type(has(&bottom_tiles), has(&middle_tiles), has(&top_tiles)) {
                Some(layer_type) => layer_type,
                None => {
                    diags.user_error(&format!(
                        "metatile {}: all three layers carry content, but triple-layer mode is off",
                        metatile
                    ));
                    LayerType::Normal
                }
            }
        };

        match layer_type {
            LayerType::Triple => {
                tileset.tiles.extend(bottom_tiles);
                tileset.tiles.extend(middle_tiles);
                tileset.tiles.extend(top_tiles);
            }
            LayerType::Normal => {
                tileset.tiles.extend(middle_tiles);
                tileset.tiles.extend(top_tiles);
            }
            LayerType::Covered => {
                tileset.tiles.extend(bottom_tiles);
                tileset.tiles.extend(middle_tiles);
            }
            LayerType::Split => {
                tileset.tiles.extend(bottom_tiles);
                tileset.tiles.extend(top_tiles);
            }
        }

        let mut attributes = attribute_rows
            .get(&metatile)
            .copied()
            .unwrap_or_else(|| Attributes::defaults_for(config.base_game));
        attributes.layer_type = layer_type;
        tileset.attributes.push(attributes);
    }
    diags.check_phase("layer inference")?;

    let mut unused: Vec<usize> = attribute_rows
        .keys()
        .copied()
        .filter(|&id| id >= metatile_count)
        .collect();
    unused.sort();
    for id in unused {
        diags.warn(
            Warning::UnusedAttribute,
            &format!(
                "attributes.csv row for metatile {} is beyond the {} metatiles in the sheets",
                id, metatile_count
            ),
        );
    }
    diags.check_phase("attribute merge")?;

    Ok(tileset)
}

/// Everything read from one tileset source directory.
pub struct ImportedSource {
    pub tileset: DecompiledTileset,
    pub behaviours: BehaviourMap,
}

fn load_layer(root: &Path, file: &str) -> Result<RgbaImage, CompileError> {
    let path = root.join(file);
    if !path.is_file() {
        return Err(CompileError::User(format!(
            "missing layer sheet {}",
            path.display()
        )));
    }
    Ok(image::open(path)?.to_rgba8())
}

/// Import a source directory from disk. `behaviours` carries the paired
/// primary's parsed header when compiling a secondary; a primary parses its
/// own `metatile_behaviors.h`.
pub fn import_source(
    config: &CompilerConfig,
    diags: &mut Diagnostics,
    root: &Path,
    behaviours: Option<BehaviourMap>,
) -> Result<ImportedSource, CompileError> {
    let bottom = load_layer(root, "bottom.png")?;
    let middle = load_layer(root, "middle.png")?;
    let top = load_layer(root, "top.png")?;

    let behaviours = match behaviours {
        Some(map) => map,
        None => {
            let path = root.join("metatile_behaviors.h");
            if path.is_file() {
                behaviors::parse_behaviors_header(&std::fs::read_to_string(path)?)
            } else {
                diags.warn(
                    Warning::MissingBehaviorsHeader,
                    &format!(
                        "no metatile_behaviors.h in {}; behaviours parse as bare integers",
                        root.display()
                    ),
                );
                BehaviourMap::new()
            }
        }
    };

    let attributes_path = root.join("attributes.csv");
    let attribute_rows = if attributes_path.is_file() {
        let text = std::fs::read_to_string(attributes_path)?;
        let rows = attributes_csv::parse_attributes_csv(config, diags, &text, &behaviours);
        diags.check_phase("attributes parse")?;
        rows
    } else {
        diags.warn(
            Warning::MissingAttributesCsv,
            &format!(
                "no attributes.csv in {}; all metatiles take default attributes",
                root.display()
            ),
        );
        HashMap::new()
    };
    diags.check_phase("attributes parse")?;

    let anims = anims::import_animations(diags, &root.join("anims"))?;

    let tileset = import_layered(
        config,
        diags,
        &bottom,
        &middle,
        &top,
        &attribute_rows,
        anims,
    )?;

    Ok(ImportedSource {
        tileset,
        behaviours,
    })
}
