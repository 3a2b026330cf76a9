//! # Tile Normalisation
//!
//! Collapses each source tile's four flip variants onto one canonical form
//! so duplicates are caught however the artist drew them. The canonical
//! form is the candidate with the lexicographically smallest pixel-index
//! buffer; its per-tile palette lists colours in first-appearance order
//! under that flip, transparency always in slot 0.

use crate::errors::CompileError;
use crate::tileset::colour::{Bgr15, Rgba32, ALPHA_OPAQUE, ALPHA_TRANSPARENT};
use crate::tileset::palette::NormalizedPalette;
use crate::tileset::tile::{NormalizedTile, RgbaTile, TileSource, TILE_DIM};

use super::CompileCtx;

/// A normalised tile tagged with its position in the decompiled tileset.
pub type IndexedNormTile = (usize, NormalizedTile);

/// Key a colour into a tile palette, growing it on first appearance.
/// Returns the pixel index (0 for transparency).
pub(crate) fn insert_rgba(
    ctx: &mut CompileCtx,
    source: &TileSource,
    palette: &mut NormalizedPalette,
    rgba: Rgba32,
) -> Result<u8, CompileError> {
    if rgba.alpha == ALPHA_TRANSPARENT || rgba == ctx.config.transparency_colour {
        return Ok(0);
    }
    if rgba.alpha == ALPHA_OPAQUE {
        let bgr = Bgr15::from_rgba(rgba);
        ctx.note_colour(bgr, rgba);
        if let Some(position) = palette.find(bgr) {
            return Ok(position as u8);
        }
        return match palette.push(bgr) {
            Some(position) => Ok(position as u8),
            None => Err(CompileError::User(format!(
                "{}: too many unique colors in tile",
                source
            ))),
        };
    }
    Err(CompileError::User(format!(
        "{}: invalid alpha value: {}",
        source, rgba.alpha
    )))
}

/// Build the normalised form a given flip state would produce. Only a
/// candidate: a different flip may turn out to be the canonical one.
pub(crate) fn candidate(
    ctx: &mut CompileCtx,
    tile: &RgbaTile,
    h_flip: bool,
    v_flip: bool,
) -> Result<NormalizedTile, CompileError> {
    let transparency = Bgr15::from_rgba(ctx.config.transparency_colour);
    let mut norm = NormalizedTile::new(transparency, h_flip, v_flip);

    for row in 0..TILE_DIM {
        for col in 0..TILE_DIM {
            let src_row = if v_flip { TILE_DIM - 1 - row } else { row };
            let src_col = if h_flip { TILE_DIM - 1 - col } else { col };
            let index = insert_rgba(
                ctx,
                &tile.source,
                &mut norm.palette,
                tile.pixel(src_row, src_col),
            )?;
            norm.set_pixel(row, col, index);
        }
    }

    Ok(norm)
}

/// Canonicalise a tile: smallest pixel buffer of the four flip candidates.
/// Ties keep the earlier candidate, so an unflipped tile never reports
/// spurious flips.
pub fn normalize(ctx: &mut CompileCtx, tile: &RgbaTile) -> Result<NormalizedTile, CompileError> {
    let no_flips = candidate(ctx, tile, false, false)?;

    // Transparent tiles are everywhere in metatile sheets and trivially
    // canonical.
    if no_flips.is_transparent() {
        return Ok(no_flips);
    }

    let mut best = no_flips;
    for (h, v) in [(true, false), (false, true), (true, true)] {
        let flipped = candidate(ctx, tile, h, v)?;
        if flipped.pixels < best.pixels {
            best = flipped;
        }
    }
    Ok(best)
}

/// Normalise every tile, tagging each with its decompiled index.
pub fn normalize_decomp_tiles(
    ctx: &mut CompileCtx,
    tiles: &[RgbaTile],
) -> Result<Vec<IndexedNormTile>, CompileError> {
    let mut normalized = Vec::with_capacity(tiles.len());
    for (index, tile) in tiles.iter().enumerate() {
        normalized.push((index, normalize(ctx, tile)?));
    }
    Ok(normalized)
}
