//! # Global Colour Index
//!
//! Assigns a stable integer to every distinct hardware colour a compile
//! touches, in first-appearance order across the normalised tiles. The
//! palette assigner's colour sets are bit vectors over this index, and its
//! tie-breaking leans on the ordering, so insertion order is load-bearing.
//! A secondary compile seeds the index with the paired primary's map so
//! shared colours keep their indices.

use std::collections::HashMap;

use crate::errors::CompileError;
use crate::tileset::colour::Bgr15;
use crate::tileset::colour_set::ColourSet;
use crate::tileset::palette::NormalizedPalette;

use super::CompileCtx;

/// Forward (colour to index) and reverse (index to colour) sides of the
/// global index. Always a bijection onto `0..len`.
#[derive(Clone, Debug, Default)]
pub struct ColourIndex {
    pub forward: HashMap<Bgr15, usize>,
    pub reverse: Vec<Bgr15>,
}

impl ColourIndex {
    /// Insert a colour, keeping its existing index on repeats.
    fn insert(&mut self, colour: Bgr15) {
        if !self.forward.contains_key(&colour) {
            self.forward.insert(colour, self.reverse.len());
            self.reverse.push(colour);
        }
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}

/// Build the index over every palette in `palettes` order, slot 0 (the
/// transparency colour) excluded. `seed` carries the paired primary's map
/// in secondary mode.
pub fn build_colour_index(
    ctx: &CompileCtx,
    palettes: &[&NormalizedPalette],
    seed: Option<&HashMap<Bgr15, usize>>,
) -> Result<ColourIndex, CompileError> {
    let mut index = ColourIndex::default();

    if let Some(seed) = seed {
        let mut seeded: Vec<(Bgr15, usize)> = seed.iter().map(|(&c, &i)| (c, i)).collect();
        seeded.sort_by_key(|&(_, i)| i);
        for (position, (colour, i)) in seeded.iter().enumerate() {
            if position != *i {
                return Err(CompileError::Internal(format!(
                    "primary colour index map is not a prefix bijection: index {} at position {}",
                    i, position
                )));
            }
            if index.forward.insert(*colour, *i).is_some() {
                return Err(CompileError::Internal(format!(
                    "duplicate colour {} in primary colour index map",
                    colour
                )));
            }
            index.reverse.push(*colour);
        }
    }

    for palette in palettes {
        for slot in 1..palette.size {
            index.insert(palette.colours[slot]);
        }
    }

    let budget = ctx.config.colour_budget();
    if index.len() > budget {
        return Err(CompileError::User(format!(
            "too many unique colors: {} exceeds the {}-colour budget",
            index.len(),
            budget
        )));
    }

    Ok(index)
}

/// Project a tile palette onto the global index as a bit set. Transparency
/// never appears in the set.
pub fn to_colour_set(
    index: &ColourIndex,
    palette: &NormalizedPalette,
) -> Result<ColourSet, CompileError> {
    let mut set = ColourSet::new();
    for slot in 1..palette.size {
        let colour = palette.colours[slot];
        let bit = index.forward.get(&colour).ok_or_else(|| {
            CompileError::Internal(format!("colour {} missing from the global index", colour))
        })?;
        set.set(*bit);
    }
    Ok(set)
}

/// Deduplicate colour sets preserving first appearance. The resulting order
/// seeds the palette assigner's work list.
pub fn distinct_colour_sets(sets: &[ColourSet]) -> Vec<ColourSet> {
    let mut seen = std::collections::HashSet::new();
    let mut distinct = Vec::new();
    for &set in sets {
        if seen.insert(set) {
            distinct.push(set);
        }
    }
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompilerConfig, CompilerMode};
    use crate::diagnostics::Diagnostics;
    use crate::tileset::attributes::TargetBaseGame;
    use crate::tileset::colour::*;

    fn palette_of(colours: &[Rgba32]) -> NormalizedPalette {
        let mut pal = NormalizedPalette::new(Bgr15::from_rgba(RGBA_MAGENTA));
        for &c in colours {
            pal.push(Bgr15::from_rgba(c)).unwrap();
        }
        pal
    }

    #[test]
    fn index_follows_first_appearance_and_skips_transparency() {
        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        let mut diags = Diagnostics::new();
        let ctx = CompileCtx::new(&config, &mut diags);

        let p1 = palette_of(&[RGBA_BLUE, RGBA_GREEN]);
        let p2 = palette_of(&[RGBA_GREEN, RGBA_RED]);
        let index = build_colour_index(&ctx, &[&p1, &p2], None).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.forward[&Bgr15::from_rgba(RGBA_BLUE)], 0);
        assert_eq!(index.forward[&Bgr15::from_rgba(RGBA_GREEN)], 1);
        assert_eq!(index.forward[&Bgr15::from_rgba(RGBA_RED)], 2);
        assert!(!index
            .forward
            .contains_key(&Bgr15::from_rgba(RGBA_MAGENTA)));

        // Bijection onto a prefix of the integers.
        for (i, colour) in index.reverse.iter().enumerate() {
            assert_eq!(index.forward[colour], i);
        }
    }

    #[test]
    fn seeded_colours_keep_their_indices() {
        let config = CompilerConfig::new(CompilerMode::Secondary, TargetBaseGame::Emerald);
        let mut diags = Diagnostics::new();
        let ctx = CompileCtx::new(&config, &mut diags);

        let mut seed = HashMap::new();
        seed.insert(Bgr15::from_rgba(RGBA_RED), 0);
        seed.insert(Bgr15::from_rgba(RGBA_WHITE), 1);

        let p = palette_of(&[RGBA_CYAN, RGBA_RED]);
        let index = build_colour_index(&ctx, &[&p], Some(&seed)).unwrap();

        assert_eq!(index.forward[&Bgr15::from_rgba(RGBA_RED)], 0);
        assert_eq!(index.forward[&Bgr15::from_rgba(RGBA_WHITE)], 1);
        assert_eq!(index.forward[&Bgr15::from_rgba(RGBA_CYAN)], 2);
    }

    #[test]
    fn budget_overflow_is_a_user_error() {
        let mut config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        config.fieldmap.num_palettes_in_primary = 1;
        let mut diags = Diagnostics::new();
        let ctx = CompileCtx::new(&config, &mut diags);

        // 16 distinct colours across two palettes exceed one palette's 15.
        let first: Vec<Rgba32> = (0..8).map(|i| Rgba32::opaque(i * 16, 0, 0)).collect();
        let second: Vec<Rgba32> = (0..8).map(|i| Rgba32::opaque(0, i * 16, 0)).collect();
        let p1 = palette_of(&first);
        let p2 = palette_of(&second);
        let err = build_colour_index(&ctx, &[&p1, &p2], None).unwrap_err();
        assert!(err.to_string().contains("too many unique colors"));
    }

    #[test]
    fn colour_sets_project_through_the_index() {
        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        let mut diags = Diagnostics::new();
        let ctx = CompileCtx::new(&config, &mut diags);

        let p1 = palette_of(&[RGBA_BLUE, RGBA_GREEN, RGBA_RED]);
        let p2 = palette_of(&[RGBA_RED]);
        let index = build_colour_index(&ctx, &[&p1, &p2], None).unwrap();

        let set = to_colour_set(&index, &p2).unwrap();
        assert_eq!(set.count(), 1);
        assert!(set.test(2));

        let set = to_colour_set(&index, &p1).unwrap();
        assert_eq!(set.count(), 3);
    }

    #[test]
    fn distinct_sets_preserve_first_appearance() {
        let mut a = ColourSet::new();
        a.set(0);
        let mut b = ColourSet::new();
        b.set(1);
        let distinct = distinct_colour_sets(&[a, b, a]);
        assert_eq!(distinct, vec![a, b]);
    }
}
