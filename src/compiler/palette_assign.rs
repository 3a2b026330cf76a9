//! # Palette Assignment
//!
//! Partitions the distinct colour sets into at most K hardware palettes of
//! 15 usable slots via depth-first backtracking. The branch ordering is a
//! first-fit-decreasing heuristic over set unions: the candidate palette
//! with the largest overlap against the set being placed is tried first,
//! smaller palettes breaking ties. In secondary mode the paired primary's
//! palettes are consulted first; a set already covered there costs nothing.

use crate::errors::CompileError;
use crate::tileset::colour::Bgr15;
use crate::tileset::colour_set::ColourSet;
use crate::tileset::palette::{GbaPalette, PAL_SIZE};

/// Usable slots per palette once transparency takes slot 0.
const COLOURS_PER_PALETTE: usize = PAL_SIZE - 1;

/// Search for a covering of `distinct` by `num_palettes` palettes, reusing
/// `primary_palettes` where possible. Returns the solution alongside the
/// number of recursive calls taken (1 means the search never backtracked).
pub fn assign_palettes(
    distinct: &[ColourSet],
    num_palettes: usize,
    primary_palettes: &[ColourSet],
    max_recurses: usize,
) -> Result<(Vec<ColourSet>, usize), CompileError> {
    let mut unassigned = distinct.to_vec();
    // Stable ascending sort: the heaviest sets are popped (and therefore
    // placed) first, while equal-weight sets keep first-appearance order so
    // the output does not depend on colour values.
    unassigned.sort_by_key(|cs| cs.count());

    let hardware = vec![ColourSet::new(); num_palettes];
    let mut recurses = 0usize;

    match assign(hardware, unassigned, primary_palettes, &mut recurses, max_recurses)? {
        Some(solution) => Ok((solution, recurses)),
        None => Err(CompileError::User(
            "failed to allocate palettes: tileset requires more hardware palettes than available"
                .to_string(),
        )),
    }
}

fn assign(
    hardware: Vec<ColourSet>,
    mut unassigned: Vec<ColourSet>,
    primary_palettes: &[ColourSet],
    recurses: &mut usize,
    max_recurses: usize,
) -> Result<Option<Vec<ColourSet>>, CompileError> {
    let to_assign = match unassigned.pop() {
        Some(set) => set,
        None => return Ok(Some(hardware)),
    };

    *recurses += 1;
    if *recurses > max_recurses {
        return Err(CompileError::User(format!(
            "too many assignment recurses (exceeded {})",
            max_recurses
        )));
    }

    // A set already covered by a primary palette consumes no local slots.
    for primary in primary_palettes {
        if to_assign.is_subset_of(primary) {
            if let Some(solution) = assign(
                hardware.clone(),
                unassigned.clone(),
                primary_palettes,
                recurses,
                max_recurses,
            )? {
                return Ok(Some(solution));
            }
        }
    }

    let mut ordered = hardware.clone();
    ordered.sort_by(|a, b| {
        let overlap_a = (*a & to_assign).count();
        let overlap_b = (*b & to_assign).count();
        overlap_b
            .cmp(&overlap_a)
            .then(a.count().cmp(&b.count()))
    });

    for i in 0..ordered.len() {
        if (ordered[i] | to_assign).count() > COLOURS_PER_PALETTE {
            continue;
        }
        let mut next = ordered.clone();
        next[i] |= to_assign;
        if let Some(solution) = assign(
            next,
            unassigned.clone(),
            primary_palettes,
            recurses,
            max_recurses,
        )? {
            return Ok(Some(solution));
        }
    }

    Ok(None)
}

/// Realise an assigned colour set as a hardware palette: transparency in
/// slot 0, then the set's colours in ascending global-index order, trailing
/// slots zeroed.
pub fn materialise_palette(
    set: &ColourSet,
    reverse: &[Bgr15],
    transparency: Bgr15,
) -> Result<GbaPalette, CompileError> {
    let mut palette = GbaPalette::default();
    palette.colours[0] = transparency;
    let mut slot = 1;
    for bit in set.ones() {
        if slot == PAL_SIZE {
            return Err(CompileError::Internal(
                "materialised palette exceeds 15 colours".to_string(),
            ));
        }
        palette.colours[slot] = *reverse.get(bit).ok_or_else(|| {
            CompileError::Internal(format!("colour bit {} has no entry in the reverse index", bit))
        })?;
        slot += 1;
    }
    palette.size = slot;
    Ok(palette)
}
