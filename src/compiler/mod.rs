//! # Compile Driver
//!
//! Orchestrates the pipeline: normalise → global colour index → colour
//! sets → palette assignment → tile assignment. Primary and secondary
//! compiles share the same path; a secondary additionally seeds the colour
//! index from its paired primary, prefers the primary's palettes, and
//! offsets local tile indices past primary VRAM.
//!
//! Animations are folded in before the layer tiles: every animation tile
//! position reserves one slot at the front of the sheet, and its colour
//! set is the union of that position's colours across the key frame and
//! every numbered frame (the runtime swaps tile graphics, never palettes).

pub mod colour_index;
pub mod normalize;
pub mod palette_assign;
pub mod tile_assign;

use std::collections::{HashMap, HashSet};

use crate::config::{CompilerConfig, CompilerMode};
use crate::diagnostics::{Diagnostics, Warning};
use crate::errors::CompileError;
use crate::tileset::colour::{Bgr15, Rgba32};
use crate::tileset::colour_set::ColourSet;
use crate::tileset::palette::NormalizedPalette;
use crate::tileset::tile::{GbaTile, NormalizedTile};
use crate::tileset::{
    CompiledAnimFrame, CompiledAnimation, CompiledTileset, DecompiledAnimation, DecompiledTileset,
};

pub use self::normalize::IndexedNormTile;
use self::tile_assign::AnimSlot;

/// Mutable state threaded through one compile invocation.
pub struct CompileCtx<'a> {
    pub config: &'a CompilerConfig,
    pub diags: &'a mut Diagnostics,
    seen_colours: HashMap<Bgr15, Rgba32>,
}

impl<'a> CompileCtx<'a> {
    pub fn new(config: &'a CompilerConfig, diags: &'a mut Diagnostics) -> Self {
        CompileCtx {
            config,
            diags,
            seen_colours: HashMap::new(),
        }
    }

    /// Track which source colour first produced each hardware colour, so a
    /// second distinct source colour landing on the same 15-bit value can
    /// be reported.
    pub(crate) fn note_colour(&mut self, bgr: Bgr15, rgba: Rgba32) {
        match self.seen_colours.get(&bgr) {
            Some(&previous) if previous != rgba => {
                self.diags.warn(
                    Warning::ColorPrecisionLoss,
                    &format!(
                        "distinct colours {} and {} collapse to {} in 15-bit colour",
                        previous, rgba, bgr
                    ),
                );
            }
            Some(_) => {}
            None => {
                self.seen_colours.insert(bgr, rgba);
            }
        }
    }
}

/// An animation after normalisation: canonical key tiles for matching,
/// unflipped frame tiles for emission, and one merged palette per slot.
struct NormAnim {
    name: String,
    key_norms: Vec<NormalizedTile>,
    frames: Vec<NormFrame>,
    slot_palettes: Vec<NormalizedPalette>,
}

struct NormFrame {
    name: String,
    tiles: Vec<NormalizedTile>,
    width_tiles: usize,
    height_tiles: usize,
}

fn normalize_animations(
    ctx: &mut CompileCtx,
    anims: &[DecompiledAnimation],
) -> Result<Vec<NormAnim>, CompileError> {
    let transparency = Bgr15::from_rgba(ctx.config.transparency_colour);
    let mut result = Vec::with_capacity(anims.len());

    for anim in anims {
        let mut key_norms = Vec::with_capacity(anim.key.tiles.len());
        for tile in &anim.key.tiles {
            key_norms.push(normalize::normalize(ctx, tile)?);
        }

        // Frame tiles keep their drawn orientation: they are emitted, not
        // matched.
        let mut frames = Vec::with_capacity(anim.frames.len());
        for frame in &anim.frames {
            let mut tiles = Vec::with_capacity(frame.tiles.len());
            for tile in &frame.tiles {
                tiles.push(normalize::candidate(ctx, tile, false, false)?);
            }
            frames.push(NormFrame {
                name: frame.name.clone(),
                tiles,
                width_tiles: frame.width_tiles,
                height_tiles: frame.height_tiles,
            });
        }

        let mut slot_palettes = Vec::with_capacity(key_norms.len());
        for slot in 0..key_norms.len() {
            let mut merged = NormalizedPalette::new(transparency);
            let mut sources: Vec<&NormalizedPalette> = vec![&key_norms[slot].palette];
            for frame in &frames {
                sources.push(&frame.tiles[slot].palette);
            }
            for palette in sources {
                for i in 1..palette.size {
                    let colour = palette.colours[i];
                    if merged.find(colour).is_none() && merged.push(colour).is_none() {
                        return Err(CompileError::User(format!(
                            "animation '{}': tiles at position {} use more than 15 unique colors across frames",
                            anim.name, slot
                        )));
                    }
                }
            }
            slot_palettes.push(merged);
        }

        result.push(NormAnim {
            name: anim.name.clone(),
            key_norms,
            frames,
            slot_palettes,
        });
    }

    Ok(result)
}

/// Reconstruct the colour cover of an already-compiled palette in terms of
/// the current global index.
fn palette_colour_set(
    palette: &crate::tileset::palette::GbaPalette,
    index: &colour_index::ColourIndex,
) -> Result<ColourSet, CompileError> {
    let mut set = ColourSet::new();
    for slot in 1..palette.size {
        let bit = index.forward.get(&palette.colours[slot]).ok_or_else(|| {
            CompileError::Internal(format!(
                "paired primary colour {} missing from the seeded index",
                palette.colours[slot]
            ))
        })?;
        set.set(*bit);
    }
    Ok(set)
}

/// Compile a decompiled tileset. `companion` is the paired primary's
/// compiled output and is required (and only read) in secondary mode.
pub fn compile(
    ctx: &mut CompileCtx,
    decompiled: &DecompiledTileset,
    companion: Option<&CompiledTileset>,
) -> Result<CompiledTileset, CompileError> {
    match ctx.config.mode {
        CompilerMode::Freestanding => {
            return Err(CompileError::Internal(
                "FREESTANDING compile mode is not implemented".to_string(),
            ))
        }
        CompilerMode::Secondary => {
            if companion.is_none() {
                return Err(CompileError::Internal(
                    "secondary compile requires a paired primary tileset".to_string(),
                ));
            }
        }
        CompilerMode::Primary => {
            if companion.is_some() {
                return Err(CompileError::Internal(
                    "primary compile does not take a paired tileset".to_string(),
                ));
            }
        }
    }
    ctx.config.validate()?;

    if let Some(primary) = companion {
        if primary.palettes.len() != ctx.config.fieldmap.num_palettes_in_primary {
            return Err(CompileError::User(format!(
                "paired primary has {} palettes but the fieldmap expects {}",
                primary.palettes.len(),
                ctx.config.fieldmap.num_palettes_in_primary
            )));
        }
    }

    if decompiled.metatile_count() > ctx.config.max_metatiles() {
        return Err(CompileError::User(format!(
            "too many metatiles in {} tileset: {} exceeds limit {}",
            ctx.config.mode,
            decompiled.metatile_count(),
            ctx.config.max_metatiles()
        )));
    }

    let norm_anims = normalize_animations(ctx, &decompiled.anims)?;
    let indexed_norm = self::normalize::normalize_decomp_tiles(ctx, &decompiled.tiles)?;

    // The global index covers animation slots first (they reserve the front
    // of the sheet), then the layer tiles in decompiled order.
    let mut palettes_in_order: Vec<&NormalizedPalette> = Vec::new();
    for anim in &norm_anims {
        palettes_in_order.extend(anim.slot_palettes.iter());
    }
    palettes_in_order.extend(indexed_norm.iter().map(|(_, norm)| &norm.palette));

    let seed = companion.map(|primary| &primary.colour_index_map);
    let colour_index = colour_index::build_colour_index(&*ctx, &palettes_in_order, seed)?;

    let mut all_sets = Vec::with_capacity(palettes_in_order.len());
    for palette in &palettes_in_order {
        all_sets.push(colour_index::to_colour_set(&colour_index, palette)?);
    }
    let distinct = colour_index::distinct_colour_sets(&all_sets);

    let mut primary_sets = Vec::new();
    if let Some(primary) = companion {
        for palette in &primary.palettes {
            primary_sets.push(palette_colour_set(palette, &colour_index)?);
        }
    }

    let (solution, _recurses) = palette_assign::assign_palettes(
        &distinct,
        ctx.config.palettes_to_allocate(),
        &primary_sets,
        ctx.config.max_recurse_count,
    )?;

    let transparency = Bgr15::from_rgba(ctx.config.transparency_colour);
    let mut compiled = CompiledTileset::default();
    let mut palette_sets: Vec<ColourSet> = Vec::new();
    if let Some(primary) = companion {
        compiled.palettes.extend(primary.palettes.iter().copied());
        palette_sets.extend(primary_sets.iter().copied());
    }
    for set in &solution {
        compiled.palettes.push(palette_assign::materialise_palette(
            set,
            &colour_index.reverse,
            transparency,
        )?);
        palette_sets.push(*set);
    }

    compiled.colour_index_map = colour_index.forward.clone();
    compiled.attributes = decompiled.attributes.clone();
    compiled.assignments = vec![Default::default(); decompiled.tiles.len()];

    let secondary = ctx.config.mode == CompilerMode::Secondary;
    let offset = if secondary {
        ctx.config.fieldmap.num_tiles_in_primary as u16
    } else {
        0
    };

    // Tile 0 of a primary is always the fully-transparent tile on palette
    // 0. A secondary never reserves a local slot for it: transparent
    // subtiles resolve through the companion's tile 0 like any other
    // shared artwork.
    if !secondary {
        compiled.insert_tile(GbaTile::TRANSPARENT, 0);
    }

    // Reserve animation slots at the front of the local tiles, seeded
    // with the first numbered frame's artwork.
    let mut key_slots: HashMap<_, AnimSlot> = HashMap::new();
    let mut anim_slot_cursor = 0usize;
    for anim in &norm_anims {
        let start_tile = compiled.tiles.len() as u16 + offset;
        let mut slot_palettes = Vec::with_capacity(anim.slot_palettes.len());
        let first_frame = anim.frames.first().ok_or_else(|| {
            CompileError::Internal(format!("animation '{}' has no frames", anim.name))
        })?;

        for slot in 0..anim.slot_palettes.len() {
            let slot_set = all_sets[anim_slot_cursor + slot];
            let palette_index = palette_sets
                .iter()
                .position(|p| slot_set.is_subset_of(p))
                .ok_or_else(|| {
                    CompileError::Internal(
                        "assignment solution does not cover an animation slot".to_string(),
                    )
                })?;
            let gba_tile =
                tile_assign::make_tile(&first_frame.tiles[slot], &compiled.palettes[palette_index])?;
            if compiled.tiles.len() >= ctx.config.max_tiles() {
                return Err(CompileError::User(format!(
                    "too many unique tiles in {} tileset: limit is {}",
                    ctx.config.mode,
                    ctx.config.max_tiles()
                )));
            }
            let tile_index = compiled.insert_anim_tile(gba_tile, palette_index as u8) + offset;

            let key_norm = &anim.key_norms[slot];
            key_slots.entry(key_norm.canonical_key()).or_insert(AnimSlot {
                tile_index,
                palette_index: palette_index as u8,
                key_h_flip: key_norm.h_flip,
                key_v_flip: key_norm.v_flip,
            });
            slot_palettes.push(palette_index as u8);
        }

        let mut frames = Vec::with_capacity(anim.frames.len());
        for frame in &anim.frames {
            let mut tiles = Vec::with_capacity(frame.tiles.len());
            for (slot, norm) in frame.tiles.iter().enumerate() {
                let palette_index = slot_palettes[slot] as usize;
                tiles.push(tile_assign::make_tile(norm, &compiled.palettes[palette_index])?);
            }
            frames.push(CompiledAnimFrame {
                name: frame.name.clone(),
                tiles,
                width_tiles: frame.width_tiles,
                height_tiles: frame.height_tiles,
            });
        }

        compiled.anims.push(CompiledAnimation {
            name: anim.name.clone(),
            start_tile,
            slot_palettes,
            frames,
        });
        anim_slot_cursor += anim.slot_palettes.len();
    }

    // The layer tiles' colour sets follow the animation slots in all_sets.
    let tiles_with_sets: Vec<_> = indexed_norm
        .into_iter()
        .zip(all_sets[anim_slot_cursor..].iter())
        .map(|((index, norm), &set)| (index, norm, set))
        .collect();

    let mut matched_keys = HashSet::new();
    tile_assign::assign_tiles(
        ctx,
        &mut compiled,
        &tiles_with_sets,
        &palette_sets,
        &key_slots,
        &mut matched_keys,
        companion,
    )?;

    for anim in &norm_anims {
        for (slot, key_norm) in anim.key_norms.iter().enumerate() {
            if !matched_keys.contains(&key_norm.canonical_key()) {
                ctx.diags.warn(
                    Warning::KeyFrameDidNotAppear,
                    &format!(
                        "animation '{}': key tile {} never appears in the layer sheets",
                        anim.name, slot
                    ),
                );
            }
        }
    }
    ctx.diags.check_phase("tile assignment")?;

    Ok(compiled)
}
