//! # Tile Assignment
//!
//! Resolves every normalised tile to its final `(tile, palette, flips)`
//! placement. Tiles are translated into the compiled palette they were
//! assigned, deduplicated by content, and, in secondary mode, matched
//! against the paired primary's tiles so shared artwork stays in primary
//! VRAM.

use std::collections::{HashMap, HashSet};

use crate::config::CompilerMode;
use crate::errors::CompileError;
use crate::tileset::colour_set::ColourSet;
use crate::tileset::palette::{GbaPalette, PAL_SIZE};
use crate::tileset::tile::{GbaTile, NormalizedKey, NormalizedTile};
use crate::tileset::{Assignment, CompiledTileset};

use super::CompileCtx;

/// A reserved animation slot a key tile resolves to. The key's canonical
/// flips are kept so a flipped placement of the key composes correctly
/// with the slot's stored orientation.
#[derive(Clone, Copy, Debug)]
pub struct AnimSlot {
    pub tile_index: u16,
    pub palette_index: u8,
    pub key_h_flip: bool,
    pub key_v_flip: bool,
}

/// Translate a normalised tile's pixel indices into a compiled palette.
/// Every colour of the tile must already sit in that palette.
pub fn make_tile(norm: &NormalizedTile, palette: &GbaPalette) -> Result<GbaTile, CompileError> {
    let mut translation = [0u8; PAL_SIZE];
    for slot in 1..norm.palette.size {
        let colour = norm.palette.colours[slot];
        let position = palette.index_of(colour).ok_or_else(|| {
            CompileError::Internal(format!(
                "colour {} missing from the tile's assigned palette",
                colour
            ))
        })?;
        translation[slot] = position as u8;
    }

    let mut tile = GbaTile::TRANSPARENT;
    for (i, &pixel) in norm.pixels.iter().enumerate() {
        tile.pixels[i] = translation[pixel as usize];
    }
    Ok(tile)
}

/// Assign every tile. `palette_sets` lists the colour cover of each slot in
/// `compiled.palettes` (paired primary palettes included in secondary
/// mode). Key-tile matches land in their reserved animation slots and are
/// recorded in `matched_keys`.
pub fn assign_tiles(
    ctx: &mut CompileCtx,
    compiled: &mut CompiledTileset,
    tiles_with_sets: &[(usize, NormalizedTile, ColourSet)],
    palette_sets: &[ColourSet],
    key_slots: &HashMap<NormalizedKey, AnimSlot>,
    matched_keys: &mut HashSet<NormalizedKey>,
    companion: Option<&CompiledTileset>,
) -> Result<(), CompileError> {
    let secondary = ctx.config.mode == CompilerMode::Secondary;
    let offset = if secondary {
        ctx.config.fieldmap.num_tiles_in_primary as u16
    } else {
        0
    };
    let max_tiles = ctx.config.max_tiles();

    for (index, norm, colour_set) in tiles_with_sets {
        let key = norm.canonical_key();
        if let Some(slot) = key_slots.get(&key) {
            matched_keys.insert(key);
            compiled.assignments[*index] = Assignment {
                tile_index: slot.tile_index,
                palette_index: slot.palette_index,
                h_flip: norm.h_flip ^ slot.key_h_flip,
                v_flip: norm.v_flip ^ slot.key_v_flip,
            };
            continue;
        }

        let palette_index = palette_sets
            .iter()
            .position(|p| colour_set.is_subset_of(p))
            .ok_or_else(|| {
                CompileError::Internal(
                    "assignment solution does not cover a tile's colour set".to_string(),
                )
            })?;
        let gba_tile = make_tile(norm, &compiled.palettes[palette_index])?;

        // Artwork already present in the paired primary stays at its
        // primary VRAM index.
        let tile_index = if let Some(primary_index) =
            companion.and_then(|primary| primary.find_tile(&gba_tile))
        {
            primary_index
        } else if let Some(local) = compiled.find_tile(&gba_tile) {
            local + offset
        } else {
            if compiled.tiles.len() >= max_tiles {
                return Err(CompileError::User(format!(
                    "too many unique tiles in {} tileset: limit is {}",
                    ctx.config.mode, max_tiles
                )));
            }
            compiled.insert_tile(gba_tile, palette_index as u8) + offset
        };

        compiled.assignments[*index] = Assignment {
            tile_index,
            palette_index: palette_index as u8,
            h_flip: norm.h_flip,
            v_flip: norm.v_flip,
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::colour::{Bgr15, RGBA_BLUE, RGBA_MAGENTA, RGBA_RED};

    #[test]
    fn make_tile_translates_through_the_assigned_palette() {
        let transparency = Bgr15::from_rgba(RGBA_MAGENTA);
        let mut norm = NormalizedTile::new(transparency, false, false);
        norm.palette.push(Bgr15::from_rgba(RGBA_RED)).unwrap();
        norm.palette.push(Bgr15::from_rgba(RGBA_BLUE)).unwrap();
        norm.pixels[0] = 1;
        norm.pixels[1] = 2;

        // The compiled palette stores blue before red.
        let mut palette = GbaPalette::default();
        palette.colours[0] = transparency;
        palette.colours[1] = Bgr15::from_rgba(RGBA_BLUE);
        palette.colours[2] = Bgr15::from_rgba(RGBA_RED);
        palette.size = 3;

        let tile = make_tile(&norm, &palette).unwrap();
        assert_eq!(tile.pixels[0], 2);
        assert_eq!(tile.pixels[1], 1);
        assert_eq!(tile.pixels[2], 0);
    }

    #[test]
    fn make_tile_requires_every_colour_present() {
        let transparency = Bgr15::from_rgba(RGBA_MAGENTA);
        let mut norm = NormalizedTile::new(transparency, false, false);
        norm.palette.push(Bgr15::from_rgba(RGBA_RED)).unwrap();
        norm.pixels[0] = 1;

        let palette = GbaPalette::default();
        let err = make_tile(&norm, &palette).unwrap_err();
        assert!(err.is_internal());
    }
}
